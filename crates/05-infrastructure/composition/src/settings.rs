//! 容器启动配置
//!
//! 加载顺序：配置文件（可选）→ 环境变量。后加载的来源覆盖先加载的。

use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use di_abstractions::ContainerConfig;
use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 默认配置文件（不含扩展名）
pub const DEFAULT_CONFIG_FILE: &str = "config/container";

/// 环境变量前缀，例如 `LORN_DI__CONTAINER__MAX_RESOLUTION_DEPTH=50`
pub const ENV_PREFIX: &str = "LORN_DI";

/// 环境变量层级分隔符
pub const ENV_SEPARATOR: &str = "__";

/// 容器启动配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// 容器配置
    pub container: ContainerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl ContainerSettings {
    /// 从默认配置文件和环境变量加载
    pub fn load_default() -> ConfigResult<Self> {
        Self::load(DEFAULT_CONFIG_FILE)
    }

    /// 从指定配置文件和环境变量加载，文件不存在时使用默认值
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR),
        )
    }

    /// 使用自定义环境变量来源加载
    pub fn load_with_env(path: impl AsRef<Path>, environment: Environment) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("加载容器配置: {}", path.display());

        let settings = Config::builder()
            .add_source(File::with_name(&path.to_string_lossy()).required(false))
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置取值
    pub fn validate(&self) -> ConfigResult<()> {
        if self.container.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "container.max_resolution_depth 必须大于 0".to_string(),
            });
        }
        if self.container.resolution_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "container.resolution_timeout_ms 必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}
