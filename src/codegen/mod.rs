//! Proxy code generation.
//!
//! This module provides:
//! - Shape extraction: lazy properties, hooks and intercepted methods
//! - Signature projection for generated overrides
//! - Proxy naming and default file names
//! - The proxy template and its placeholder fragments
//! - The [`ProxyGenerator`] driving rendering and emission

pub mod fragments;
pub mod generator;
pub mod naming;
pub mod shape;
pub mod signature;
pub mod template;

pub use generator::{ProxyGenerator, RenderedUnit};
pub use naming::{PROXY_MARKER, ProxyName, proxy_class_name, proxy_file_name};
pub use shape::{ClassShape, is_short_identifier_getter};
pub use signature::MethodSignature;
pub use template::{DEFAULT_PROXY_TEMPLATE, Placeholder};
