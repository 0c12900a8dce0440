//! 类型擦除的服务实例

use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 共享的服务实例
///
/// 内部保存的是 `Arc<T>` 本身，因此 `T` 可以是 `dyn Trait`。
/// 克隆只增加引用计数，所有克隆指向同一个实例。
#[derive(Clone)]
pub struct ServiceInstance {
    type_info: TypeInfo,
    value: Arc<dyn Any + Send + Sync>,
}

impl ServiceInstance {
    /// 包装一个已共享的实例
    pub fn new<T>(instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<T>(),
            value: Arc::new(instance),
        }
    }

    /// 包装一个具体值
    pub fn from_value<T>(value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::new(Arc::new(value))
    }

    /// 实例的声明类型
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 还原为具体类型
    pub fn downcast<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + 'static,
    {
        self.value
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| DependencyError::TypeMismatch {
                expected: TypeInfo::of::<T>().name().to_string(),
                actual: self.type_info.name().to_string(),
            })
    }

    /// 判断两个句柄是否指向同一个实例
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("type", &self.type_info.name())
            .finish_non_exhaustive()
    }
}
