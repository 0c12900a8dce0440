//! 服务上下文构建器

use crate::context::ServiceContext;
use di_abstractions::{ContainerConfig, ServiceDescriptor, ServiceDiscovery, ServiceInstance};
use infrastructure_common::DependencyResult;
use std::sync::Arc;
use tracing::{debug, info};

/// 服务上下文构建器
///
/// 收集描述符和服务发现源，在 [`build`](Self::build) 时按添加顺序一次性注册。
#[derive(Default)]
pub struct ServiceContextBuilder {
    config: ContainerConfig,
    descriptors: Vec<ServiceDescriptor>,
    discoveries: Vec<Box<dyn ServiceDiscovery>>,
}

impl ServiceContextBuilder {
    /// 创建空的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 添加服务描述符
    pub fn register(mut self, descriptor: ServiceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// 以接口类型和可选限定符添加已有实例
    pub fn add_instance<I>(self, qualifier: Option<&str>, instance: Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.register(
            ServiceDescriptor::from_instance(ServiceInstance::new(instance))
                .with_qualifier(qualifier.into()),
        )
    }

    /// 添加服务发现源
    pub fn add_discovery(mut self, discovery: impl ServiceDiscovery + 'static) -> Self {
        self.discoveries.push(Box::new(discovery));
        self
    }

    /// 构建服务上下文
    ///
    /// 先注册直接添加的描述符，再依次注册各发现源返回的描述符。
    /// 任何一次注册失败都会中止构建。
    pub fn build(self) -> DependencyResult<ServiceContext> {
        let context = ServiceContext::with_config(self.config);

        for descriptor in self.descriptors {
            context.register(descriptor)?;
        }

        for discovery in &self.discoveries {
            let descriptors = discovery.discover()?;
            debug!("服务发现源 {} 提供 {} 个服务", discovery.name(), descriptors.len());
            for descriptor in descriptors {
                context.register(descriptor)?;
            }
        }

        info!(
            "服务容器 {} 构建完成, 共 {} 个服务",
            context.id(),
            context.stats().registered_services
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{Dependency, StaticDiscovery};

    #[derive(Debug)]
    struct Settings {
        name: &'static str,
    }

    #[derive(Debug)]
    struct Service {
        settings: Arc<Settings>,
    }

    #[test]
    fn test_build_with_discovery() {
        let discovery = StaticDiscovery::new("static").with(ServiceDescriptor::factory::<Service, _>(
            vec![Dependency::one::<Settings>()],
            |deps| {
                Ok(Service {
                    settings: deps.take_one::<Settings>()?,
                })
            },
        ));

        let context = ServiceContextBuilder::new()
            .add_instance::<Settings>(None, Arc::new(Settings { name: "demo" }))
            .add_discovery(discovery)
            .build()
            .unwrap();

        let service = context.find_one::<Service>(None).unwrap().unwrap();
        assert_eq!(service.settings.name, "demo");
        assert_eq!(context.registered_services().len(), 2);
    }

    #[test]
    fn test_duplicate_from_discovery_fails_build() {
        let discovery = StaticDiscovery::new("dup").with(ServiceDescriptor::instance(Settings { name: "b" }));
        let result = ServiceContextBuilder::new()
            .register(ServiceDescriptor::instance(Settings { name: "a" }))
            .add_discovery(discovery)
            .build();
        assert!(result.unwrap_err().is_duplicate());
    }

    #[test]
    fn test_config_is_applied() {
        let context = ServiceContextBuilder::new()
            .with_config(ContainerConfig {
                max_resolution_depth: 3,
                ..ContainerConfig::default()
            })
            .build()
            .unwrap();
        assert_eq!(context.config().max_resolution_depth, 3);
    }
}
