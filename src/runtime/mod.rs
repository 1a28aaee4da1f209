//! Runtime contract of generated proxies.
//!
//! A [`ProxyUnit`] is produced alongside every rendered proxy and describes
//! the generated type; [`ProxyInstance`] is an object of that type with its
//! initialization flag and callback slots. Persistence layers drive the
//! load protocol through these types.

pub mod hooks;
pub mod instance;
pub mod unit;

pub use hooks::{NoHooks, ParentHooks};
pub use instance::{Callback, ProxyInstance};
pub use unit::{DeclaredProperty, HookFlags, MethodEntry, ProxyUnit};
