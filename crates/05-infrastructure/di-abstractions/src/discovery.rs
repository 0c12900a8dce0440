//! 服务发现抽象接口
//!
//! 容器本身不做反射扫描，发现器负责产出描述符，
//! 启动阶段再逐个注册到注册表。

use crate::descriptor::ServiceDescriptor;
use infrastructure_common::DependencyResult;

/// 服务发现器 trait
pub trait ServiceDiscovery: Send + Sync {
    /// 获取发现器名称
    fn name(&self) -> &str;

    /// 发现服务描述符，返回顺序即注册顺序
    fn discover(&self) -> DependencyResult<Vec<ServiceDescriptor>>;
}

/// 静态发现器
///
/// 持有预先构造好的描述符列表，用于手工装配和测试。
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    name: String,
    descriptors: Vec<ServiceDescriptor>,
}

impl StaticDiscovery {
    /// 创建新的静态发现器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptors: Vec::new(),
        }
    }

    /// 添加描述符
    #[must_use]
    pub fn with(mut self, descriptor: ServiceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }
}

impl ServiceDiscovery for StaticDiscovery {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(&self) -> DependencyResult<Vec<ServiceDescriptor>> {
        Ok(self.descriptors.clone())
    }
}
