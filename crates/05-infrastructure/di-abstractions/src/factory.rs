//! 服务工厂抽象接口
//!
//! 提供服务实例创建的工厂模式支持

use crate::dependency::{Dependency, ResolvedDependencies};
use crate::instance::ServiceInstance;
use infrastructure_common::{DependencyResult, TypeInfo};
use std::fmt;

/// 服务工厂 trait
///
/// 用于创建服务实例。解析器保证每个描述符的工厂最多成功调用一次。
pub trait ServiceFactory: Send + Sync {
    /// 获取所需的依赖，顺序即传入 [`ServiceFactory::create`] 的顺序
    fn dependencies(&self) -> &[Dependency];

    /// 使用已解析的依赖创建服务实例
    fn create(&self, dependencies: ResolvedDependencies) -> DependencyResult<ServiceInstance>;

    /// 获取工厂产出的服务类型
    fn service_type(&self) -> TypeInfo;
}

/// 闭包工厂包装器
pub struct FnFactory<F> {
    service_type: TypeInfo,
    dependencies: Vec<Dependency>,
    create_fn: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&mut ResolvedDependencies) -> DependencyResult<ServiceInstance> + Send + Sync + 'static,
{
    /// 创建闭包工厂，`service_type` 必须与闭包返回实例的类型一致
    pub fn new(service_type: TypeInfo, dependencies: Vec<Dependency>, create_fn: F) -> Self {
        Self {
            service_type,
            dependencies,
            create_fn,
        }
    }
}

impl<F> ServiceFactory for FnFactory<F>
where
    F: Fn(&mut ResolvedDependencies) -> DependencyResult<ServiceInstance> + Send + Sync + 'static,
{
    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn create(&self, mut dependencies: ResolvedDependencies) -> DependencyResult<ServiceInstance> {
        (self.create_fn)(&mut dependencies)
    }

    fn service_type(&self) -> TypeInfo {
        self.service_type
    }
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory")
            .field("service_type", &self.service_type.name())
            .field("dependencies", &self.dependencies)
            .field("create_fn", &"<function>")
            .finish()
    }
}
