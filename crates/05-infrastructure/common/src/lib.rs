//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn DI 容器各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`DependencyError`] - 注册与解析过程中的错误分类
//! - [`TypeInfo`] - 基于 `TypeId` 的类型标识
//! - [`Qualifier`] - 区分同类型多个服务的限定符
//! - [`ServiceKey`] - (类型, 限定符) 组成的注册键
//!
//! ## 设计原则
//!
//! - 类型标识只在 API 边界由泛型提供，核心不依赖反射
//! - 限定符的有无用带标签的枚举表达，从不使用空值

pub mod errors;
pub mod metadata;

pub use errors::*;
pub use metadata::*;
