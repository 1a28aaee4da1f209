//! Metadata sets and type resolution.

use super::class::ClassDescriptor;
use serde::Deserialize;
use std::collections::HashSet;

/// Answers whether a named class or interface exists in the target program.
///
/// Signature projection consults the resolver for every non-builtin type it
/// renders; an unknown name aborts generation with an invalid-signature error.
pub trait TypeResolver: Send + Sync {
    fn type_exists(&self, name: &str) -> bool;
}

/// A set of known type names, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    names: HashSet<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(name.as_ref());
        }
        registry
    }

    pub fn register(&mut self, name: &str) {
        self.names.insert(normalize(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim_start_matches('\\').to_ascii_lowercase()
}

impl TypeResolver for TypeRegistry {
    fn type_exists(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// The classes to generate proxies for, plus any further type names the
/// describing side vouches for (interfaces, value objects, ...).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataSet {
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
    #[serde(default)]
    pub known_types: Vec<String>,
}

impl MetadataSet {
    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        let name = name.trim_start_matches('\\');
        self.classes
            .iter()
            .find(|c| c.class_name().eq_ignore_ascii_case(name))
    }

    /// Every class, ancestor and extra known type of the set.
    pub fn type_registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::with_types(&self.known_types);
        for class in &self.classes {
            registry.register(class.class_name());
            for parent in &class.parents {
                registry.register(parent);
            }
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ignores_case_and_leading_separator() {
        let registry = TypeRegistry::with_types(["App\\Entity\\Tag"]);
        assert!(registry.type_exists("\\app\\entity\\TAG"));
        assert!(!registry.type_exists("App\\Entity\\Tags"));
    }

    #[test]
    fn test_metadata_set_registry_includes_parents() {
        let set = MetadataSet {
            classes: vec![
                ClassDescriptor::builder()
                    .name("Shop\\Order")
                    .parents(vec!["Shop\\Document".into()])
                    .build(),
            ],
            known_types: vec!["DateTimeInterface".into()],
        };

        let registry = set.type_registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("shop\\document"));
        assert!(set.class("\\Shop\\Order").is_some());
    }
}
