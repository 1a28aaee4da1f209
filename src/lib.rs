//! # Entity Proxy
//!
//! Lazy-loading proxy generation for persistence entity classes.
//!
//! Given a [`ClassDescriptor`](descriptor::ClassDescriptor) describing an
//! entity class (its properties, mapped fields, associations, identifier and
//! public methods), the [`ProxyGenerator`] renders a subclass that defers
//! loading until real data is needed. The generated class keeps the
//! original's public contract, invokes an initializer callback on first
//! access, and answers trivial identifier getters without loading.
//!
//! ## Features
//!
//! - **Descriptors**: class shapes read from TOML or JSON, or built in code
//! - **Customizable templates**: any placeholder can be overridden with a
//!   literal or a resolver over the descriptor
//! - **Atomic output**: proxy files are published via temp file and rename
//! - **In-process loading**: units registered once per proxy class name
//! - **Runtime model**: [`ProxyInstance`](runtime::ProxyInstance) follows the
//!   generated load protocol
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use entity_proxy::prelude::*;
//!
//! # fn main() -> ProxyResult<()> {
//! let set = parse_metadata_set("schemas/entities.toml")?;
//! let generator = ProxyGenerator::new("var/proxies", "App\\Proxies")?;
//!
//! for emission in generator.generate_proxy_classes(&set, None)? {
//!     println!("{emission:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod prelude;
pub mod runtime;

pub use codegen::{ProxyGenerator, RenderedUnit};
pub use config::ProxyConfig;
pub use emit::{Emission, UnitRegistry};
pub use error::{ProxyError, ProxyResult};
