//! Descriptor parser
//!
//! Loads class descriptors and metadata sets from TOML or JSON. The format is
//! chosen by file extension; JSON is the only one able to spell an explicit
//! `null` default.

use super::class::ClassDescriptor;
use super::metadata::MetadataSet;
use super::validate::validate_class_descriptor;
use crate::error::{ProxyError, ProxyResult};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Source format of a descriptor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Toml,
    Json,
}

impl DescriptorFormat {
    /// `.json` files are JSON, everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Parse a class descriptor from a file
pub fn parse_class_descriptor<P: AsRef<Path>>(path: P) -> ProxyResult<ClassDescriptor> {
    let path = path.as_ref();
    let content = read(path)?;
    let class = parse_with(&content, DescriptorFormat::from_path(path)).map_err(|e| {
        ProxyError::Configuration(format!(
            "Failed to parse class descriptor '{}': {e}",
            path.display()
        ))
    })?;
    checked(class)
}

/// Parse a class descriptor from a TOML string
pub fn parse_class_descriptor_from_str(content: &str) -> ProxyResult<ClassDescriptor> {
    checked(toml::from_str(content)?)
}

/// Parse a class descriptor from a JSON string
pub fn parse_class_descriptor_from_json(content: &str) -> ProxyResult<ClassDescriptor> {
    checked(serde_json::from_str(content)?)
}

/// Parse a metadata set from a file
pub fn parse_metadata_set<P: AsRef<Path>>(path: P) -> ProxyResult<MetadataSet> {
    let path = path.as_ref();
    let content = read(path)?;
    let set: MetadataSet = parse_with(&content, DescriptorFormat::from_path(path)).map_err(|e| {
        ProxyError::Configuration(format!(
            "Failed to parse metadata set '{}': {e}",
            path.display()
        ))
    })?;
    checked_set(set)
}

/// Parse a metadata set from a TOML string
pub fn parse_metadata_set_from_str(content: &str) -> ProxyResult<MetadataSet> {
    checked_set(toml::from_str(content)?)
}

fn read(path: &Path) -> ProxyResult<String> {
    fs::read_to_string(path).map_err(|e| {
        ProxyError::Configuration(format!(
            "Failed to read descriptor file '{}': {e}",
            path.display()
        ))
    })
}

fn parse_with<T: DeserializeOwned>(content: &str, format: DescriptorFormat) -> ProxyResult<T> {
    match format {
        DescriptorFormat::Toml => Ok(toml::from_str(content)?),
        DescriptorFormat::Json => Ok(serde_json::from_str(content)?),
    }
}

fn checked(class: ClassDescriptor) -> ProxyResult<ClassDescriptor> {
    let result = validate_class_descriptor(&class);
    for warning in &result.warnings {
        warn!("{warning}");
    }
    if !result.is_valid() {
        return Err(ProxyError::Configuration(format!(
            "Invalid descriptor for '{}': {}",
            class.class_name(),
            result.summary()
        )));
    }
    debug!(
        "Parsed descriptor for {} ({} properties, {} methods)",
        class.class_name(),
        class.properties.len(),
        class.methods.len()
    );
    Ok(class)
}

fn checked_set(set: MetadataSet) -> ProxyResult<MetadataSet> {
    let MetadataSet {
        classes,
        known_types,
    } = set;
    let classes = classes
        .into_iter()
        .map(checked)
        .collect::<ProxyResult<Vec<_>>>()?;
    Ok(MetadataSet {
        classes,
        known_types,
    })
}
