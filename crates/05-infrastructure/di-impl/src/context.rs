//! 服务上下文
//!
//! 应用代码使用的查询与注册入口

use crate::builder::ServiceContextBuilder;
use crate::registry::{ServiceEntry, ServiceRegistry};
use crate::validation;
use chrono::{DateTime, Utc};
use di_abstractions::{
    ContainerConfig, ContainerStats, Dependency, ResolvedDependencies, ServiceDescriptor,
    ServiceInstance,
};
use infrastructure_common::{DependencyError, DependencyResult, Qualifier, ServiceKey, TypeInfo};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// 服务上下文
///
/// 对注册表的轻量包装，克隆后共享同一个注册表。
/// 上下文由调用方显式创建并持有，不存在全局实例。
#[derive(Clone, Debug)]
pub struct ServiceContext {
    id: Uuid,
    registry: Arc<ServiceRegistry>,
}

impl ServiceContext {
    /// 使用默认配置创建空容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建空容器
    pub fn with_config(config: ContainerConfig) -> Self {
        let id = Uuid::new_v4();
        info!("创建服务容器: {}", id);
        Self {
            id,
            registry: Arc::new(ServiceRegistry::new(config)),
        }
    }

    /// 创建容器构建器
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// 容器标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        self.registry.config()
    }

    /// 底层注册表
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// 注册服务描述符
    pub fn register(&self, descriptor: ServiceDescriptor) -> DependencyResult<()> {
        self.registry.register(descriptor).map(|_| ())
    }

    /// 以闭包工厂注册具体类型 `T`
    pub fn register_factory<T, F>(&self, dependencies: Vec<Dependency>, create_fn: F) -> DependencyResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&mut ResolvedDependencies) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::factory::<T, F>(dependencies, create_fn))
    }

    /// 以接口类型 `I` 和可选限定符注册已共享的实例
    pub fn register_instance<I>(&self, qualifier: Option<&str>, instance: Arc<I>) -> DependencyResult<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.registry
            .register_instance(ServiceInstance::new(instance), qualifier.into())
            .map(|_| ())
    }

    /// 以具体类型、无限定符注册外部构造的实例
    ///
    /// 该槽位已被占用时返回 [`DependencyError::DuplicateRegistration`]。
    pub fn add_service<T>(&self, service: T) -> DependencyResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.register_instance::<T>(None, Arc::new(service))
    }

    /// 以具体类型和限定符注册外部构造的实例
    pub fn add_service_named<T>(&self, qualifier: &str, service: T) -> DependencyResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.register_instance::<T>(Some(qualifier), Arc::new(service))
    }

    /// 以接口类型注册外部构造的实例
    pub fn add_service_as<I>(&self, service: Arc<I>) -> DependencyResult<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.register_instance(None, service)
    }

    /// 查找唯一的服务实例
    ///
    /// 顶层查找没有候选时返回 `Ok(None)`；歧义、循环依赖、
    /// 嵌套依赖缺失以及工厂失败都作为错误返回。
    pub fn find_one<T>(&self, qualifier: Option<&str>) -> DependencyResult<Option<Arc<T>>>
    where
        T: ?Sized + 'static,
    {
        let entry = match self
            .registry
            .lookup_one(TypeInfo::of::<T>(), &qualifier.into())
        {
            Ok(entry) => entry,
            Err(error) if error.is_no_such_service() => {
                debug!("未找到服务: {}", error);
                return Ok(None);
            }
            Err(error) => return Err(error),
        };
        self.registry.materialize(&entry)?.downcast::<T>().map(Some)
    }

    /// 获取唯一的服务实例，不存在时返回 [`DependencyError::NoSuchService`]
    pub fn get<T>(&self, qualifier: Option<&str>) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + 'static,
    {
        let entry = self
            .registry
            .lookup_one(TypeInfo::of::<T>(), &qualifier.into())?;
        self.registry.materialize(&entry)?.downcast::<T>()
    }

    /// 查找所有匹配的服务实例，按注册顺序返回
    ///
    /// 没有匹配时返回空列表；候选实例化失败时返回错误。
    pub fn find_all<T>(&self, qualifier: Option<&str>) -> DependencyResult<Vec<Arc<T>>>
    where
        T: ?Sized + 'static,
    {
        self.registry
            .lookup_all(TypeInfo::of::<T>(), &qualifier.into())
            .iter()
            .map(|entry| self.registry.materialize(entry)?.downcast::<T>())
            .collect()
    }

    /// 是否存在匹配的注册
    pub fn is_registered<T>(&self, qualifier: Option<&str>) -> bool
    where
        T: ?Sized + 'static,
    {
        self.registry.contains(TypeInfo::of::<T>(), &qualifier.into())
    }

    /// 所有已注册服务的摘要，按注册顺序排列
    ///
    /// 不同类型的简短名称相同时，`key` 使用完整类型名称。
    pub fn registered_services(&self) -> Vec<ServiceSummary> {
        let entries = self.registry.entries();
        let keys = ServiceKey::path_names(entries.iter().map(|entry| entry.key()));
        entries
            .iter()
            .zip(keys)
            .map(|(entry, key)| ServiceSummary::from_entry(entry, key))
            .collect()
    }

    /// 统计信息
    pub fn stats(&self) -> ContainerStats {
        self.registry.stats()
    }

    /// 在不实例化任何服务的前提下检查依赖关系
    ///
    /// 返回所有无法满足的依赖以及静态依赖图中可达的循环。
    pub fn validate(&self) -> Result<(), Vec<DependencyError>> {
        validation::validate(&self.registry)
    }
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 服务摘要
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary {
    /// 注册键
    pub key: String,
    /// 完整类型名称
    pub type_name: String,
    /// 限定符
    pub qualifier: Qualifier,
    /// 是否由现有实例提供
    pub is_instance: bool,
    /// 是否已实例化
    pub realized: bool,
    /// 声明的依赖
    pub dependencies: Vec<String>,
    /// 描述符创建时间
    pub created_at: DateTime<Utc>,
}

impl ServiceSummary {
    fn from_entry(entry: &ServiceEntry, key: String) -> Self {
        let descriptor = entry.descriptor();
        Self {
            key,
            type_name: descriptor.type_info().name().to_string(),
            qualifier: descriptor.qualifier().clone(),
            is_instance: descriptor.is_instance(),
            realized: entry.is_realized(),
            dependencies: descriptor
                .dependencies()
                .iter()
                .map(ToString::to_string)
                .collect(),
            created_at: descriptor.created_at(),
        }
    }
}
