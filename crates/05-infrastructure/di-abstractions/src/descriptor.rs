//! 服务描述符

use crate::dependency::{Dependency, ResolvedDependencies};
use crate::factory::{FnFactory, ServiceFactory};
use crate::instance::ServiceInstance;
use chrono::{DateTime, Utc};
use infrastructure_common::{DependencyResult, Qualifier, ServiceKey, TypeInfo};
use std::fmt;
use std::sync::Arc;

/// 服务实例来源，工厂与现有实例二选一
#[derive(Clone)]
pub enum ServiceSource {
    /// 首次访问时调用的工厂
    Factory(Arc<dyn ServiceFactory>),
    /// 外部构造好的实例
    Instance(ServiceInstance),
}

/// 服务描述符
///
/// 描述一个可注册单元的不可变记录：声明类型、限定符以及获取实例的方式。
/// 声明类型可以是实现类型的接口（`dyn Trait`）。
#[derive(Clone)]
pub struct ServiceDescriptor {
    key: ServiceKey,
    source: ServiceSource,
    created_at: DateTime<Utc>,
}

impl ServiceDescriptor {
    /// 由工厂创建描述符
    pub fn from_factory(declared_type: TypeInfo, factory: Arc<dyn ServiceFactory>) -> Self {
        Self {
            key: ServiceKey::new(declared_type, Qualifier::Default),
            source: ServiceSource::Factory(factory),
            created_at: Utc::now(),
        }
    }

    /// 由现有实例创建描述符，声明类型即实例的类型
    pub fn from_instance(instance: ServiceInstance) -> Self {
        Self {
            key: ServiceKey::new(instance.type_info(), Qualifier::Default),
            source: ServiceSource::Instance(instance),
            created_at: Utc::now(),
        }
    }

    /// 以闭包工厂注册具体类型 `T`
    ///
    /// ```
    /// use di_abstractions::{Dependency, ServiceDescriptor};
    ///
    /// struct Config { url: String }
    /// struct Client { config: std::sync::Arc<Config> }
    ///
    /// let descriptor = ServiceDescriptor::factory::<Client, _>(
    ///     vec![Dependency::one::<Config>()],
    ///     |deps| Ok(Client { config: deps.take_one::<Config>()? }),
    /// );
    /// assert_eq!(descriptor.dependencies().len(), 1);
    /// ```
    pub fn factory<T, F>(dependencies: Vec<Dependency>, create_fn: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut ResolvedDependencies) -> DependencyResult<T> + Send + Sync + 'static,
    {
        let factory = FnFactory::new(
            TypeInfo::of::<T>(),
            dependencies,
            move |deps: &mut ResolvedDependencies| create_fn(deps).map(ServiceInstance::from_value),
        );
        Self::from_factory(TypeInfo::of::<T>(), Arc::new(factory))
    }

    /// 以闭包工厂注册接口类型 `I`，工厂返回 `Arc<I>`
    pub fn factory_as<I, F>(dependencies: Vec<Dependency>, create_fn: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&mut ResolvedDependencies) -> DependencyResult<Arc<I>> + Send + Sync + 'static,
    {
        let factory = FnFactory::new(
            TypeInfo::of::<I>(),
            dependencies,
            move |deps: &mut ResolvedDependencies| create_fn(deps).map(ServiceInstance::new),
        );
        Self::from_factory(TypeInfo::of::<I>(), Arc::new(factory))
    }

    /// 注册具体值
    pub fn instance<T>(value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::from_instance(ServiceInstance::from_value(value))
    }

    /// 以接口类型 `I` 注册已共享的实例
    pub fn instance_as<I>(instance: Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self::from_instance(ServiceInstance::new(instance))
    }

    /// 设置命名限定符
    #[must_use]
    pub fn named(self, qualifier: impl Into<String>) -> Self {
        self.with_qualifier(Qualifier::named(qualifier))
    }

    /// 设置限定符
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.key.qualifier = qualifier;
        self
    }

    /// 注册键
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// 声明类型
    pub fn type_info(&self) -> TypeInfo {
        self.key.type_info
    }

    /// 限定符
    pub fn qualifier(&self) -> &Qualifier {
        &self.key.qualifier
    }

    /// 实例来源
    pub fn source(&self) -> &ServiceSource {
        &self.source
    }

    /// 是否由现有实例提供
    pub fn is_instance(&self) -> bool {
        matches!(self.source, ServiceSource::Instance(_))
    }

    /// 声明的依赖，实例描述符没有依赖
    pub fn dependencies(&self) -> &[Dependency] {
        match &self.source {
            ServiceSource::Factory(factory) => factory.dependencies(),
            ServiceSource::Instance(_) => &[],
        }
    }

    /// 描述符创建时间
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies())
            .field("is_instance", &self.is_instance())
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Store: Send + Sync {
        fn name(&self) -> &str;
    }

    struct MemoryStore;

    impl Store for MemoryStore {
        fn name(&self) -> &str {
            "memory"
        }
    }

    #[test]
    fn test_instance_descriptor_uses_value_type() {
        let descriptor = ServiceDescriptor::instance(5_i64);
        assert_eq!(descriptor.type_info(), TypeInfo::of::<i64>());
        assert!(descriptor.qualifier().is_default());
        assert!(descriptor.is_instance());
        assert!(descriptor.dependencies().is_empty());
    }

    #[test]
    fn test_named_changes_only_qualifier() {
        let descriptor = ServiceDescriptor::instance(5_i64).named("primary");
        assert_eq!(descriptor.key(), &ServiceKey::of::<i64>("primary"));
    }

    #[test]
    fn test_factory_as_declares_interface_type() {
        let descriptor = ServiceDescriptor::factory_as::<dyn Store, _>(Vec::new(), |_| {
            Ok(Arc::new(MemoryStore) as Arc<dyn Store>)
        });
        assert_eq!(descriptor.type_info(), TypeInfo::of::<dyn Store>());

        let ServiceSource::Factory(factory) = descriptor.source() else {
            panic!("应为工厂描述符");
        };
        let deps = ResolvedDependencies::new(descriptor.type_info(), Vec::new());
        let store = factory.create(deps).unwrap().downcast::<dyn Store>().unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn test_factory_dependencies_are_exposed() {
        let descriptor = ServiceDescriptor::factory::<String, _>(
            vec![Dependency::one::<u32>(), Dependency::all::<u8>()],
            |deps| Ok(deps.take_one::<u32>()?.to_string()),
        );
        assert_eq!(descriptor.dependencies().len(), 2);
        assert!(!descriptor.is_instance());
    }
}
