//! Type declarations as they appear in member signatures.

use crate::error::ProxyError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

const BUILTIN_TYPES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "object", "static", "string", "true", "void",
];

/// A single (non-union) declared type, e.g. `?int` or `\App\Entity\Tag`.
///
/// Parsed from its source spelling; a leading `?` marks it nullable and a
/// leading namespace separator is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct TypeRef {
    name: String,
    nullable: bool,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim_start_matches('\\').to_string(),
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>) -> Self {
        Self {
            nullable: true,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the declaration carries an explicit nullable marker.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether `null` is an accepted value, explicitly or by nature of the
    /// type.
    pub fn allows_null(&self) -> bool {
        self.nullable || self.is_named("mixed") || self.is_named("null")
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_TYPES.iter().any(|b| self.is_named(b))
    }

    pub fn is_void(&self) -> bool {
        self.is_named("void")
    }

    pub fn is_self(&self) -> bool {
        self.is_named("self")
    }

    pub fn is_parent(&self) -> bool {
        self.is_named("parent")
    }

    fn is_named(&self, candidate: &str) -> bool {
        self.name.eq_ignore_ascii_case(candidate)
    }
}

impl FromStr for TypeRef {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (nullable, rest) = match trimmed.strip_prefix('?') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let name = rest.trim_start_matches('\\');

        if name.is_empty() {
            return Err(ProxyError::Configuration(format!(
                "Empty type declaration '{s}'"
            )));
        }
        if name.contains('|') || name.contains('&') {
            return Err(ProxyError::Configuration(format!(
                "Composite type declaration '{s}' is not supported"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            nullable,
        })
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ProxyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("?")?;
        }
        if !self.is_builtin() && !self.is_self() && !self.is_parent() {
            f.write_str("\\")?;
        }
        f.write_str(&self.name)
    }
}
