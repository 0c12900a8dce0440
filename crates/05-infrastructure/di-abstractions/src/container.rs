//! 容器配置与统计信息

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认最大解析深度
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

/// 默认解析等待超时（毫秒）
pub const DEFAULT_RESOLUTION_TIMEOUT_MS: u64 = 30_000;

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 是否在验证阶段检测静态依赖图中的循环依赖
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 等待其他线程完成同一服务解析的超时时间（毫秒），`None` 表示一直等待
    pub resolution_timeout_ms: Option<u64>,
    /// 是否以 info 级别记录每次注册
    pub log_registrations: bool,
}

impl ContainerConfig {
    /// 解析等待超时
    pub fn resolution_timeout(&self) -> Option<Duration> {
        self.resolution_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enable_circular_dependency_detection: true,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            resolution_timeout_ms: Some(DEFAULT_RESOLUTION_TIMEOUT_MS),
            log_registrations: true,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    /// 已注册服务数量
    pub registered_services: usize,
    /// 已实例化服务数量
    pub realized_services: usize,
    /// 工厂成功调用次数
    pub factory_invocations: u64,
    /// 解析错误数量
    pub resolution_errors: u64,
}
