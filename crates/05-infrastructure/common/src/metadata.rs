//! 元数据定义
//!
//! 提供服务注册键所需的类型标识和限定符

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
///
/// 相等性和哈希只取决于 `TypeId`，名称仅用于诊断输出。
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 类型ID
    id: TypeId,
    /// 完整类型名称
    name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息，支持 `dyn Trait` 等非固定大小类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 类型ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称（包含模块路径）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称，去掉所有模块路径
    ///
    /// `alloc::sync::Arc<dyn app::Greeter>` 会得到 `Arc<dyn Greeter>`。
    pub fn short_name(&self) -> String {
        let mut short = String::with_capacity(self.name.len());
        let mut ident = String::new();
        for c in self.name.chars() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
            } else if c == ':' {
                ident.clear();
            } else {
                short.push_str(&ident);
                ident.clear();
                short.push(c);
            }
        }
        short.push_str(&ident);
        short
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// 服务限定符
///
/// `Default` 表示未提供限定符，它本身也是一个可匹配的独立槽位。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// 未限定（默认槽位）
    #[default]
    Default,
    /// 命名限定符
    Named(String),
}

impl Qualifier {
    /// 创建命名限定符
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// 是否为默认槽位
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// 限定符文本，默认槽位返回 `None`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Named(name) => Some(name.as_str()),
        }
    }
}

impl From<&str> for Qualifier {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for Qualifier {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Option<&str>> for Qualifier {
    fn from(name: Option<&str>) -> Self {
        name.map_or(Self::Default, |name| Self::Named(name.to_string()))
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("默认"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// 服务注册键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    /// 声明类型
    pub type_info: TypeInfo,
    /// 限定符
    pub qualifier: Qualifier,
}

impl ServiceKey {
    /// 创建新的注册键
    pub fn new(type_info: TypeInfo, qualifier: impl Into<Qualifier>) -> Self {
        Self {
            type_info,
            qualifier: qualifier.into(),
        }
    }

    /// 从类型创建注册键
    pub fn of<T: ?Sized + 'static>(qualifier: impl Into<Qualifier>) -> Self {
        Self::new(TypeInfo::of::<T>(), qualifier)
    }

    /// 使用完整类型名称的文本形式
    pub fn qualified_name(&self) -> String {
        match &self.qualifier {
            Qualifier::Default => self.type_info.name().to_string(),
            Qualifier::Named(name) => format!("{}@{}", self.type_info.name(), name),
        }
    }

    /// 把一组注册键转换为诊断用的名称
    ///
    /// 默认使用简短名称；两个不同类型的简短名称相同时，这些键改用完整类型名称。
    pub fn path_names<'a>(keys: impl IntoIterator<Item = &'a ServiceKey>) -> Vec<String> {
        let keys: Vec<&ServiceKey> = keys.into_iter().collect();
        let shorts: Vec<String> = keys.iter().map(|k| k.type_info.short_name()).collect();
        keys.iter()
            .zip(&shorts)
            .map(|(key, short)| {
                let collides = keys
                    .iter()
                    .zip(&shorts)
                    .any(|(other, s)| s == short && other.type_info != key.type_info);
                if collides {
                    key.qualified_name()
                } else {
                    key.to_string()
                }
            })
            .collect()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Qualifier::Default => write!(f, "{}", self.type_info),
            Qualifier::Named(name) => write!(f, "{}@{}", self.type_info, name),
        }
    }
}
