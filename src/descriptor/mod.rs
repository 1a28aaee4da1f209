//! Class shape descriptors: the read-only input of proxy generation.
//!
//! This module provides the descriptor value model, literal values, type
//! references, descriptor parsing and validation, and type resolution.

pub mod class;
pub mod metadata;
pub mod parser;
pub mod type_ref;
pub mod validate;
pub mod value;

pub use class::*;
pub use metadata::*;
pub use parser::*;
pub use type_ref::*;
pub use validate::*;
pub use value::{ArrayKey, Value};
