//! Proxy naming.
//!
//! The proxy of `App\Entity\User` under proxy namespace `Proxies` is
//! `Proxies\__CG__\App\Entity\User`: deterministic, collision-free per
//! original class, and stable across repeated generation.

use std::path::{Path, PathBuf};

/// Marker segment separating the proxy namespace from the original class
/// name.
pub const PROXY_MARKER: &str = "__CG__";

/// Namespace and short name of a generated proxy type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyName {
    pub namespace: String,
    pub short_name: String,
}

impl ProxyName {
    pub fn for_class(class_name: &str, proxy_namespace: &str) -> Self {
        let fqcn = proxy_class_name(class_name, proxy_namespace);
        // The marker guarantees at least one separator.
        match fqcn.rsplit_once('\\') {
            Some((namespace, short_name)) => Self {
                namespace: namespace.to_string(),
                short_name: short_name.to_string(),
            },
            None => Self {
                namespace: String::new(),
                short_name: fqcn,
            },
        }
    }

    pub fn fully_qualified(&self) -> String {
        if self.namespace.is_empty() {
            self.short_name.clone()
        } else {
            format!("{}\\{}", self.namespace, self.short_name)
        }
    }
}

/// Fully-qualified proxy class name for `class_name`.
pub fn proxy_class_name(class_name: &str, proxy_namespace: &str) -> String {
    format!(
        "{}\\{PROXY_MARKER}\\{}",
        proxy_namespace.trim_matches('\\'),
        class_name.trim_start_matches('\\')
    )
}

/// Default file of the proxy for `class_name` inside `directory`.
pub fn proxy_file_name(directory: &Path, class_name: &str) -> PathBuf {
    let flattened: String = class_name.chars().filter(|c| *c != '\\').collect();
    directory.join(format!("{PROXY_MARKER}{flattened}.php"))
}
