//! Prelude module for convenient imports.
//!
//! ```rust
//! use entity_proxy::prelude::*;
//! ```

pub use crate::codegen::{Placeholder, ProxyGenerator, ProxyName, RenderedUnit};
pub use crate::config::ProxyConfig;
pub use crate::descriptor::{
    ClassDescriptor, FieldMapping, MetadataSet, MethodDescriptor, ParameterDescriptor,
    PropertyDescriptor, TypeRef, TypeRegistry, TypeResolver, Value, Visibility,
    parse_class_descriptor, parse_metadata_set,
};
pub use crate::emit::{Emission, UnitRegistry};
pub use crate::error::{NotProxiableReason, ProxyError, ProxyResult, SignatureError};
pub use crate::runtime::{Callback, ParentHooks, ProxyInstance, ProxyUnit};
