//! 解析上下文
//!
//! 记录单次解析过程中正在构造的服务链

use infrastructure_common::{DependencyError, DependencyResult, ServiceKey};

/// 解析上下文
///
/// 每次顶层解析请求创建一个，解析结束后丢弃，不在多次调用之间共享。
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    resolution_chain: Vec<ServiceKey>,
    /// 最大解析深度
    max_depth: usize,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(max_depth: usize) -> Self {
        Self {
            resolution_chain: Vec::new(),
            max_depth,
        }
    }

    /// 添加服务到解析链
    ///
    /// 服务已在链上时返回 [`DependencyError::CircularDependency`]，
    /// 环路从第一次出现的节点开始，并以重复的节点结束。
    pub fn push(&mut self, key: &ServiceKey) -> DependencyResult<()> {
        if let Some(start) = self.resolution_chain.iter().position(|k| k == key) {
            let path = self.resolution_chain[start..]
                .iter()
                .chain(std::iter::once(key));
            return Err(DependencyError::CircularDependency {
                cycle: ServiceKey::path_names(path),
            });
        }
        if self.resolution_chain.len() >= self.max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                type_name: key.type_info.name().to_string(),
                max_depth: self.max_depth,
            });
        }
        self.resolution_chain.push(key.clone());
        Ok(())
    }

    /// 从解析链中移除最近添加的服务
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 当前解析链
    pub fn chain(&self) -> &[ServiceKey] {
        &self.resolution_chain
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(crate::container::DEFAULT_MAX_RESOLUTION_DEPTH)
    }
}
