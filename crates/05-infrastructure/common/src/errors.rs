//! 错误类型定义

use crate::metadata::{Qualifier, ServiceKey};
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖注入错误类型
///
/// 注册表和解析器从不吞掉错误，只有门面的 `find_one` 会把顶层的
/// [`DependencyError::NoSuchService`] 转换为空结果。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("重复注册服务: {type_name} [{qualifier}]")]
    DuplicateRegistration {
        type_name: String,
        qualifier: Qualifier,
    },

    #[error("服务未注册: {type_name} [{qualifier}]")]
    NoSuchService {
        type_name: String,
        qualifier: Qualifier,
    },

    #[error("服务存在多个候选且没有默认实例: {type_name}, 候选限定符: {candidates:?}")]
    AmbiguousService {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("检测到循环依赖: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("解析深度超出限制: {type_name}, 最大深度 {max_depth}")]
    ResolutionDepthExceeded { type_name: String, max_depth: usize },

    #[error("等待服务解析超时: {type_name}, 超时 {timeout_ms}ms")]
    ResolutionTimeout { type_name: String, timeout_ms: u64 },

    #[error("服务类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("依赖值缺失: {type_name}, 位置 {index}")]
    MissingDependencyValue { type_name: String, index: usize },

    #[error("服务 {service} 的依赖 {dependency} 无法满足: {source}")]
    UnsatisfiedDependency {
        service: String,
        dependency: String,
        source: Box<DependencyError>,
    },
}

impl DependencyError {
    /// 创建重复注册错误
    pub fn duplicate(key: &ServiceKey) -> Self {
        Self::DuplicateRegistration {
            type_name: key.type_info.name().to_string(),
            qualifier: key.qualifier.clone(),
        }
    }

    /// 创建服务未注册错误
    pub fn no_such_service(key: &ServiceKey) -> Self {
        Self::NoSuchService {
            type_name: key.type_info.name().to_string(),
            qualifier: key.qualifier.clone(),
        }
    }

    /// 创建组件创建失败错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 是否为服务未注册错误
    pub fn is_no_such_service(&self) -> bool {
        matches!(self, Self::NoSuchService { .. })
    }

    /// 是否为重复注册错误
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateRegistration { .. })
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_cycle() {
        let error = DependencyError::CircularDependency {
            cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(error.to_string(), "检测到循环依赖: A -> B -> A");
    }

    #[test]
    fn test_creation_failed_keeps_source() {
        let error = DependencyError::creation_failed("Database", "连接被拒绝");
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("连接被拒绝"));
    }

    #[test]
    fn test_error_kind_predicates() {
        let key = ServiceKey::new(crate::TypeInfo::of::<u32>(), Qualifier::named("x"));
        assert!(DependencyError::no_such_service(&key).is_no_such_service());
        assert!(DependencyError::duplicate(&key).is_duplicate());
        assert!(!DependencyError::duplicate(&key).is_no_such_service());
    }

    #[test]
    fn test_infrastructure_error_from_dependency_error() {
        let key = ServiceKey::of::<String>(Qualifier::Default);
        let error: InfrastructureError = DependencyError::duplicate(&key).into();
        assert!(matches!(error, InfrastructureError::DependencyError { .. }));
    }
}
