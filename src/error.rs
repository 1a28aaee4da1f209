//! Error types for proxy generation.
//!
//! Every public API in this crate returns [`ProxyResult<T>`], an alias for
//! `Result<T, ProxyError>`. Errors are raised synchronously and before any
//! output is published: a failed generation never leaves a proxy file under
//! its final name.
//!
//! # Example
//!
//! ```
//! use entity_proxy::error::{NotProxiableReason, ProxyError};
//!
//! let error = ProxyError::NotProxiable {
//!     class: "App\\Entity\\Invoice".to_string(),
//!     reason: NotProxiableReason::Final,
//! };
//! assert_eq!(
//!     error.to_string(),
//!     "Unable to create a proxy for a final class \"App\\Entity\\Invoice\""
//! );
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for proxy generation operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// The main error type for proxy generation.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Invalid generator configuration (missing directory or namespace,
    /// unreadable configuration file, unreadable template).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A custom placeholder was registered under a name the template syntax
    /// can never reference.
    #[error("Provided placeholder for \"{name}\" must be a literal or a resolver over the class descriptor")]
    InvalidPlaceholder { name: String },

    /// The template references a placeholder that has neither a registered
    /// value nor a built-in generator.
    #[error("No value or generator registered for placeholder <{name}>")]
    MissingPlaceholder { name: String },

    /// The class cannot be extended by a proxy.
    #[error("Unable to create a proxy for {reason} class \"{class}\"")]
    NotProxiable {
        class: String,
        reason: NotProxiableReason,
    },

    /// A parameter or return type names a class or interface that cannot be
    /// resolved.
    #[error(transparent)]
    InvalidSignature(#[from] SignatureError),

    /// The proxy directory could not be created or is not writable.
    #[error("Your proxy directory \"{}\" must be writable", directory.display())]
    OutputUnwritable {
        directory: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A method was called on a proxy instance that the proxy does not
    /// intercept.
    #[error("Call to undefined method {class}::{method}()")]
    UndefinedMethod { class: String, method: String },

    /// I/O error while writing a proxy unit.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed TOML descriptor or configuration.
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// Malformed JSON descriptor.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Why a class cannot be proxied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum NotProxiableReason {
    #[strum(serialize = "a final")]
    Final,
    #[strum(serialize = "an abstract")]
    Abstract,
}

/// An unresolvable type reference in a method signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error(
        "The type hint of parameter \"{parameter}\" in method \"{method}\" in class \"{class}\" is invalid."
    )]
    BadParameterType {
        class: String,
        method: String,
        parameter: String,
    },

    #[error("The return type of method \"{method}\" in class \"{class}\" is invalid.")]
    BadReturnType { class: String, method: String },
}

impl ProxyError {
    /// Shorthand for an [`ProxyError::OutputUnwritable`] without an
    /// underlying I/O cause.
    pub fn unwritable(directory: impl Into<PathBuf>) -> Self {
        Self::OutputUnwritable {
            directory: directory.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_proxiable_messages_distinguish_reason() {
        let abstract_err = ProxyError::NotProxiable {
            class: "Shop\\Item".to_string(),
            reason: NotProxiableReason::Abstract,
        };
        assert_eq!(
            abstract_err.to_string(),
            "Unable to create a proxy for an abstract class \"Shop\\Item\""
        );
    }

    #[test]
    fn test_signature_error_names_parameter() {
        let err: ProxyError = SignatureError::BadParameterType {
            class: "Shop\\Item".to_string(),
            method: "attach".to_string(),
            parameter: "tag".to_string(),
        }
        .into();

        let message = err.to_string();
        assert!(message.contains("\"tag\""));
        assert!(message.contains("\"attach\""));
        assert!(message.contains("\"Shop\\Item\""));
    }

    #[test]
    fn test_unwritable_displays_directory() {
        let err = ProxyError::unwritable("/var/proxies");
        assert_eq!(err.to_string(), "Your proxy directory \"/var/proxies\" must be writable");
    }
}
