//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务注册和依赖解析的核心数据模型。
//!
//! ## 核心接口
//!
//! - [`ServiceDescriptor`] - 不可变的服务注册记录
//! - [`ServiceInstance`] - 类型擦除后的共享服务实例
//! - [`ServiceFactory`] - 服务工厂接口
//! - [`Dependency`] - 工厂声明的依赖
//! - [`ResolveContext`] - 单次解析的访问链，用于检测循环依赖
//! - [`ServiceDiscovery`] - 外部服务发现接口
//! - [`ContainerConfig`] - 容器配置

pub mod container;
pub mod dependency;
pub mod descriptor;
pub mod discovery;
pub mod factory;
pub mod instance;
pub mod resolver;

pub use container::*;
pub use dependency::*;
pub use descriptor::*;
pub use discovery::*;
pub use factory::*;
pub use instance::*;
pub use resolver::*;
