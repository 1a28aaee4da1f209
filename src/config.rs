//! Generator configuration.
//!
//! [`ProxyConfig`] carries everything a [`ProxyGenerator`](crate::ProxyGenerator)
//! needs: where proxies are written, which namespace they live in, and the
//! optional template and placeholder overrides. It is built in code with
//! `typed-builder` or read from the `[proxy]` table of a TOML file.

use crate::error::{ProxyError, ProxyResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use typed_builder::TypedBuilder;

/// Configuration of the proxy generator.
///
/// # Examples
///
/// ```
/// use entity_proxy::config::ProxyConfig;
///
/// let config = ProxyConfig::builder()
///     .directory("var/proxies")
///     .namespace("App\\Proxies")
///     .skip_unchanged(true)
///     .build();
/// assert!(config.template.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct ProxyConfig {
    /// Directory proxy files are written to
    #[builder(setter(into))]
    pub directory: PathBuf,

    /// Namespace prefix of every proxy class
    #[builder(setter(into))]
    pub namespace: String,

    /// File holding a replacement proxy class template
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub template: Option<PathBuf>,

    /// Literal placeholder overrides, keyed by placeholder name
    #[serde(default)]
    #[builder(default)]
    pub placeholders: BTreeMap<String, String>,

    /// Leave proxy files whose content would not change untouched
    #[serde(default)]
    #[builder(default = false)]
    pub skip_unchanged: bool,

    /// Interface generated proxies implement
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub base_proxy_interface: Option<String>,
}

#[derive(Deserialize)]
struct ConfigFile {
    proxy: ProxyConfig,
}

impl ProxyConfig {
    /// Create a configuration with just a directory and namespace
    pub fn new<P: Into<PathBuf>, S: Into<String>>(directory: P, namespace: S) -> Self {
        Self::builder().directory(directory).namespace(namespace).build()
    }

    /// Parse the `[proxy]` table of a TOML document
    pub fn from_toml_str(content: &str) -> ProxyResult<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ProxyError::Configuration(format!("Invalid proxy configuration: {e}")))?;
        Ok(file.proxy)
    }

    /// Load the configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ProxyResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ProxyError::Configuration(format!(
                "Failed to read configuration file '{}': {e}",
                path.display()
            ))
        })?;
        let mut config = Self::from_toml_str(&content).map_err(|e| {
            ProxyError::Configuration(format!(
                "Failed to parse configuration file '{}': {e}",
                path.display()
            ))
        })?;

        // a relative template is looked up next to the configuration file
        if let (Some(template), Some(base)) = (&config.template, path.parent()) {
            if template.is_relative() {
                config.template = Some(base.join(template));
            }
        }
        Ok(config)
    }

    /// The replacement template's content, if one is configured
    pub fn load_template(&self) -> ProxyResult<Option<String>> {
        self.template
            .as_ref()
            .map(|path| {
                fs::read_to_string(path).map_err(|e| {
                    ProxyError::Configuration(format!(
                        "Failed to read proxy template '{}': {e}",
                        path.display()
                    ))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_proxy_config_builder() {
        let config = ProxyConfig::builder()
            .directory("/tmp/proxies")
            .namespace("Proxies")
            .template("custom.tpl")
            .base_proxy_interface("App\\LazyEntity")
            .build();

        assert_eq!(config.directory, PathBuf::from("/tmp/proxies"));
        assert_eq!(config.template, Some(PathBuf::from("custom.tpl")));
        assert_eq!(config.base_proxy_interface.as_deref(), Some("App\\LazyEntity"));
        assert!(!config.skip_unchanged);
        assert!(config.placeholders.is_empty());
    }

    #[test]
    fn test_from_toml_str() {
        let config = ProxyConfig::from_toml_str(
            r#"
            [proxy]
            directory = "var/cache/proxies"
            namespace = "App\\Proxies"
            skip_unchanged = true

            [proxy.placeholders]
            additionalProperties = "    public $audit = [];"
            "#,
        )
        .unwrap();

        assert_eq!(config.namespace, "App\\Proxies");
        assert!(config.skip_unchanged);
        assert_eq!(
            config.placeholders.get("additionalProperties").map(String::as_str),
            Some("    public $audit = [];")
        );
    }

    #[test]
    fn test_from_toml_str_requires_proxy_table() {
        assert_matches!(
            ProxyConfig::from_toml_str("directory = \"x\""),
            Err(ProxyError::Configuration(_))
        );
    }

    #[test]
    fn test_from_file_resolves_template_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("proxy.tpl"), "<?php // <className>").unwrap();
        let path = dir.path().join("proxy.toml");
        fs::write(
            &path,
            "[proxy]\ndirectory = \"out\"\nnamespace = \"P\"\ntemplate = \"proxy.tpl\"\n",
        )
        .unwrap();

        let config = ProxyConfig::from_file(&path).unwrap();
        assert_eq!(config.template, Some(dir.path().join("proxy.tpl")));
        assert_eq!(
            config.load_template().unwrap().as_deref(),
            Some("<?php // <className>")
        );
    }

    #[test]
    fn test_from_file_missing() {
        assert_matches!(
            ProxyConfig::from_file("/nonexistent/proxy.toml"),
            Err(ProxyError::Configuration(message)) if message.contains("/nonexistent/proxy.toml")
        );
    }
}
