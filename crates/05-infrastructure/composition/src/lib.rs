//! # 基础设施组合层
//!
//! 负责把配置加载、日志初始化和服务注册组合成一个可用的 [`ServiceContext`](di_impl::ServiceContext)。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ContainerBootstrapper;
//! use di_abstractions::ServiceDescriptor;
//!
//! struct Clock;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = ContainerBootstrapper::from_config_file("config/container")?
//!         .with_logging(true)
//!         .register(ServiceDescriptor::instance(Clock))
//!         .bootstrap()?;
//!
//!     let _clock = context.get::<Clock>(None)?;
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod logging;
pub mod settings;

pub use bootstrapper::ContainerBootstrapper;
pub use logging::LoggingConfig;
pub use settings::{ContainerSettings, DEFAULT_CONFIG_FILE, ENV_PREFIX, ENV_SEPARATOR};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
