//! 依赖声明与已解析的依赖值

use crate::instance::ServiceInstance;
use infrastructure_common::{DependencyError, DependencyResult, Qualifier, ServiceKey, TypeInfo};
use std::fmt;
use std::sync::Arc;

/// 依赖类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// 恰好一个实例，缺失时解析失败
    One,
    /// 所有匹配的实例，允许为空
    All,
    /// 至多一个实例，缺失时为空
    Optional,
}

/// 工厂声明的一条依赖
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// 依赖的声明类型
    pub type_info: TypeInfo,
    /// 限定符，`Default` 表示未指定
    pub qualifier: Qualifier,
    /// 依赖类型
    pub kind: DependencyKind,
}

impl Dependency {
    /// 创建新的依赖声明
    pub fn new(type_info: TypeInfo, qualifier: Qualifier, kind: DependencyKind) -> Self {
        Self {
            type_info,
            qualifier,
            kind,
        }
    }

    /// 依赖一个 `T` 实例
    pub fn one<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>(), Qualifier::Default, DependencyKind::One)
    }

    /// 依赖一个带限定符的 `T` 实例
    pub fn one_named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self::new(
            TypeInfo::of::<T>(),
            Qualifier::named(qualifier),
            DependencyKind::One,
        )
    }

    /// 依赖所有 `T` 实例
    pub fn all<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>(), Qualifier::Default, DependencyKind::All)
    }

    /// 依赖所有带指定限定符的 `T` 实例
    pub fn all_named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self::new(
            TypeInfo::of::<T>(),
            Qualifier::named(qualifier),
            DependencyKind::All,
        )
    }

    /// 可选地依赖一个 `T` 实例
    pub fn optional<T: ?Sized + 'static>() -> Self {
        Self::new(
            TypeInfo::of::<T>(),
            Qualifier::Default,
            DependencyKind::Optional,
        )
    }

    /// 依赖对应的注册键
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(self.type_info, self.qualifier.clone())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DependencyKind::One => write!(f, "{}", self.key()),
            DependencyKind::All => write!(f, "[{}]", self.key()),
            DependencyKind::Optional => write!(f, "{}?", self.key()),
        }
    }
}

/// 一条已解析的依赖
#[derive(Debug, Clone)]
pub enum ResolvedDependency {
    /// 单个实例
    One(ServiceInstance),
    /// 按注册顺序排列的所有实例
    All(Vec<ServiceInstance>),
    /// 可能缺失的实例
    Optional(Option<ServiceInstance>),
}

/// 传给工厂的已解析依赖
///
/// 依赖值与 [`crate::ServiceFactory::dependencies`] 的声明顺序一致，
/// 工厂按顺序逐个取出。
#[derive(Debug)]
pub struct ResolvedDependencies {
    owner: TypeInfo,
    values: Vec<ResolvedDependency>,
    cursor: usize,
}

impl ResolvedDependencies {
    /// 创建新的依赖值列表
    pub fn new(owner: TypeInfo, values: Vec<ResolvedDependency>) -> Self {
        Self {
            owner,
            values,
            cursor: 0,
        }
    }

    /// 依赖值数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有依赖
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 取出下一个单实例依赖
    pub fn take_one<T: ?Sized + 'static>(&mut self) -> DependencyResult<Arc<T>> {
        match self.advance()? {
            ResolvedDependency::One(instance) => instance.downcast::<T>(),
            _ => Err(self.missing()),
        }
    }

    /// 取出下一个集合依赖
    pub fn take_all<T: ?Sized + 'static>(&mut self) -> DependencyResult<Vec<Arc<T>>> {
        match self.advance()? {
            ResolvedDependency::All(instances) => instances
                .iter()
                .map(ServiceInstance::downcast::<T>)
                .collect(),
            _ => Err(self.missing()),
        }
    }

    /// 取出下一个可选依赖
    pub fn take_optional<T: ?Sized + 'static>(&mut self) -> DependencyResult<Option<Arc<T>>> {
        match self.advance()? {
            ResolvedDependency::Optional(instance) => {
                instance.map(|instance| instance.downcast::<T>()).transpose()
            }
            _ => Err(self.missing()),
        }
    }

    fn advance(&mut self) -> DependencyResult<ResolvedDependency> {
        let value = self
            .values
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| self.missing_at(self.cursor))?;
        self.cursor += 1;
        Ok(value)
    }

    fn missing(&self) -> DependencyError {
        self.missing_at(self.cursor.saturating_sub(1))
    }

    fn missing_at(&self, index: usize) -> DependencyError {
        DependencyError::MissingDependencyValue {
            type_name: self.owner.name().to_string(),
            index,
        }
    }
}
