//! 容器启动器

use crate::settings::ContainerSettings;
use di_abstractions::{ServiceDescriptor, ServiceDiscovery};
use di_impl::{ServiceContext, ServiceContextBuilder};
use infrastructure_common::{InfrastructureError, InfrastructureResult};
use std::path::Path;
use tracing::{error, info};

/// 容器启动器
///
/// 负责协调启动顺序：初始化日志、注册服务、检查依赖关系。
pub struct ContainerBootstrapper {
    /// 启动配置
    settings: ContainerSettings,
    /// 描述符与服务发现源
    builder: ServiceContextBuilder,
    /// 是否安装全局日志订阅器
    logging_enabled: bool,
    /// 是否在启动时检查依赖关系
    validation_enabled: bool,
}

impl ContainerBootstrapper {
    /// 使用默认配置创建启动器
    pub fn new() -> Self {
        Self::from_settings(ContainerSettings::default())
    }

    /// 使用指定配置创建启动器
    pub fn from_settings(settings: ContainerSettings) -> Self {
        Self {
            settings,
            builder: ServiceContextBuilder::new(),
            logging_enabled: false,
            validation_enabled: true,
        }
    }

    /// 从配置文件和环境变量加载配置
    pub fn from_config_file(path: impl AsRef<Path>) -> InfrastructureResult<Self> {
        Ok(Self::from_settings(ContainerSettings::load(path)?))
    }

    /// 当前配置
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// 设置是否初始化日志
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    /// 设置是否在启动时检查依赖关系
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validation_enabled = enabled;
        self
    }

    /// 添加服务描述符
    pub fn register(mut self, descriptor: ServiceDescriptor) -> Self {
        self.builder = self.builder.register(descriptor);
        self
    }

    /// 添加服务发现源
    pub fn add_discovery(mut self, discovery: impl ServiceDiscovery + 'static) -> Self {
        self.builder = self.builder.add_discovery(discovery);
        self
    }

    /// 启动容器
    pub fn bootstrap(self) -> InfrastructureResult<ServiceContext> {
        if self.logging_enabled {
            self.settings.logging.init()?;
        }
        info!("开始启动服务容器");

        let context = self
            .builder
            .with_config(self.settings.container.clone())
            .build()?;

        if self.validation_enabled {
            if let Err(errors) = context.validate() {
                for e in &errors {
                    error!("依赖检查失败: {}", e);
                }
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                return Err(InfrastructureError::BootstrapFailed {
                    message: format!("依赖检查失败: {}", messages.join("; ")),
                });
            }
            info!("依赖检查通过");
        }

        info!("服务容器 {} 启动完成", context.id());
        Ok(context)
    }
}

impl Default for ContainerBootstrapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{Dependency, StaticDiscovery};

    #[derive(Debug)]
    struct Repository;

    #[derive(Debug)]
    struct Handler {
        _repository: std::sync::Arc<Repository>,
    }

    fn handler_descriptor() -> ServiceDescriptor {
        ServiceDescriptor::factory::<Handler, _>(vec![Dependency::one::<Repository>()], |deps| {
            Ok(Handler {
                _repository: deps.take_one::<Repository>()?,
            })
        })
    }

    #[test]
    fn test_bootstrap_registers_and_validates() {
        let context = ContainerBootstrapper::new()
            .register(handler_descriptor())
            .add_discovery(StaticDiscovery::new("repositories").with(ServiceDescriptor::instance(Repository)))
            .bootstrap()
            .unwrap();

        assert!(context.find_one::<Handler>(None).unwrap().is_some());
    }

    #[test]
    fn test_validation_failure_aborts_bootstrap() {
        let result = ContainerBootstrapper::new()
            .register(handler_descriptor())
            .bootstrap();
        match result {
            Err(InfrastructureError::BootstrapFailed { message }) => {
                assert!(message.contains("Handler"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validation_can_be_skipped() {
        let context = ContainerBootstrapper::new()
            .with_validation(false)
            .register(handler_descriptor())
            .bootstrap()
            .unwrap();
        assert!(context.find_one::<Handler>(None).is_err());
    }

    #[test]
    fn test_settings_applied_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.toml");
        std::fs::write(&path, "[container]\nmax_resolution_depth = 7\n").unwrap();

        let context = ContainerBootstrapper::from_config_file(&path)
            .unwrap()
            .bootstrap()
            .unwrap();
        assert_eq!(context.config().max_resolution_depth, 7);
    }

    #[test]
    fn test_duplicate_registration_is_dependency_error() {
        let result = ContainerBootstrapper::new()
            .register(ServiceDescriptor::instance(Repository))
            .register(ServiceDescriptor::instance(Repository))
            .bootstrap();
        assert!(matches!(result, Err(InfrastructureError::DependencyError { .. })));
    }
}
