//! # 依赖注入具体实现
//!
//! 提供线程安全的服务注册表、解析器和面向应用的 [`ServiceContext`]。
//!
//! ```
//! use di_impl::ServiceContext;
//! use di_abstractions::Dependency;
//!
//! struct Config { url: &'static str }
//! struct Client { config: std::sync::Arc<Config> }
//!
//! let context = ServiceContext::new();
//! context.add_service(Config { url: "localhost" }).unwrap();
//! context
//!     .register_factory::<Client, _>(vec![Dependency::one::<Config>()], |deps| {
//!         Ok(Client { config: deps.take_one::<Config>()? })
//!     })
//!     .unwrap();
//!
//! let client = context.find_one::<Client>(None).unwrap().unwrap();
//! assert_eq!(client.config.url, "localhost");
//! ```

pub mod builder;
pub mod context;
pub mod registry;
pub mod resolver;
mod validation;

pub use builder::ServiceContextBuilder;
pub use context::{ServiceContext, ServiceSummary};
pub use registry::{ServiceEntry, ServiceRegistry};
pub use resolver::ServiceResolver;
