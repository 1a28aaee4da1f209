//! Class shape descriptors.
//!
//! A [`ClassDescriptor`] is the read-only structural description of an entity
//! class: its declared properties, mapped fields, associations, identifier,
//! and full public method surface. It is produced ahead of time by whatever
//! reflection or schema facility describes the entity model and is never
//! mutated by the generator.

use super::type_ref::TypeRef;
use super::value::{Value, present_value};
use serde::Deserialize;
use typed_builder::TypedBuilder;

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// A declared property of the class (or one of its ancestors).
#[derive(Debug, Clone, PartialEq, Deserialize, TypedBuilder)]
pub struct PropertyDescriptor {
    #[builder(setter(into))]
    pub name: String,

    #[serde(default, rename = "type")]
    #[builder(default, setter(strip_option))]
    pub type_ref: Option<TypeRef>,

    #[serde(default)]
    #[builder(default)]
    pub visibility: Visibility,

    #[serde(default)]
    #[builder(default)]
    pub is_static: bool,

    /// Declared default; `None` when the declaration has no initializer.
    #[serde(default, deserialize_with = "present_value")]
    #[builder(default, setter(strip_option, into))]
    pub default: Option<Value>,

    /// Owning class when inherited; defaults to the described class.
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub declaring_class: Option<String>,
}

/// A persisted field of the mapping, with its mapping type (`integer`,
/// `string`, `datetime`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    #[serde(rename = "type", default = "default_mapping_type")]
    pub mapping_type: String,
}

fn default_mapping_type() -> String {
    "string".to_string()
}

impl FieldMapping {
    pub fn new(name: impl Into<String>, mapping_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping_type: mapping_type.into(),
        }
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Deserialize, TypedBuilder)]
pub struct ParameterDescriptor {
    #[builder(setter(into))]
    pub name: String,

    #[serde(default, rename = "type")]
    #[builder(default, setter(strip_option))]
    pub type_ref: Option<TypeRef>,

    #[serde(default)]
    #[builder(default)]
    pub by_reference: bool,

    #[serde(default)]
    #[builder(default)]
    pub variadic: bool,

    #[serde(default, deserialize_with = "present_value")]
    #[builder(default, setter(strip_option, into))]
    pub default: Option<Value>,
}

/// A method, with the flags and signature the proxy must reproduce.
#[derive(Debug, Clone, PartialEq, Deserialize, TypedBuilder)]
pub struct MethodDescriptor {
    #[builder(setter(into))]
    pub name: String,

    #[serde(default)]
    #[builder(default)]
    pub visibility: Visibility,

    #[serde(default)]
    #[builder(default)]
    pub is_final: bool,

    #[serde(default)]
    #[builder(default)]
    pub is_static: bool,

    #[serde(default)]
    #[builder(default)]
    pub returns_reference: bool,

    #[serde(default)]
    #[builder(default)]
    pub parameters: Vec<ParameterDescriptor>,

    /// `None` means no declared return type.
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub return_type: Option<TypeRef>,

    /// Owning class when inherited; defaults to the described class.
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub declaring_class: Option<String>,

    /// Source text of the whole method declaration, when available.
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub source: Option<String>,
}

impl MethodDescriptor {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_constructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__construct")
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Structural description of an entity class.
#[derive(Debug, Clone, PartialEq, Deserialize, TypedBuilder)]
pub struct ClassDescriptor {
    /// Fully-qualified class name.
    #[builder(setter(into))]
    pub name: String,

    /// Ancestors, nearest first.
    #[serde(default)]
    #[builder(default)]
    pub parents: Vec<String>,

    #[serde(default)]
    #[builder(default)]
    pub is_final: bool,

    #[serde(default)]
    #[builder(default)]
    pub is_abstract: bool,

    #[serde(default)]
    #[builder(default)]
    pub properties: Vec<PropertyDescriptor>,

    #[serde(default)]
    #[builder(default)]
    pub fields: Vec<FieldMapping>,

    #[serde(default)]
    #[builder(default)]
    pub associations: Vec<String>,

    #[serde(default)]
    #[builder(default)]
    pub identifier: Vec<String>,

    #[serde(default)]
    #[builder(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    /// The class name without a leading namespace separator.
    pub fn class_name(&self) -> &str {
        self.name.trim_start_matches('\\')
    }

    pub fn parent(&self) -> Option<&str> {
        self.parents.first().map(|p| p.trim_start_matches('\\'))
    }

    /// Parent of `class`, which must be this class or one of its ancestors.
    pub fn parent_of(&self, class: &str) -> Option<&str> {
        let class = class.trim_start_matches('\\');
        if class.eq_ignore_ascii_case(self.class_name()) {
            return self.parent();
        }
        let position = self
            .parents
            .iter()
            .position(|p| p.trim_start_matches('\\').eq_ignore_ascii_case(class))?;
        self.parents
            .get(position + 1)
            .map(|p| p.trim_start_matches('\\'))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn has_association(&self, name: &str) -> bool {
        self.associations.iter().any(|a| a == name)
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier.iter().any(|i| i == name)
    }

    pub fn type_of_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.mapping_type.as_str())
    }

    /// First declaration of `name`, compared case-insensitively.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.is_named(name))
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Declaring class of a method, falling back to the described class.
    pub fn declaring_class_of<'a>(&'a self, method: &'a MethodDescriptor) -> &'a str {
        method
            .declaring_class
            .as_deref()
            .map_or(self.class_name(), |c| c.trim_start_matches('\\'))
    }

    /// Declaring class of a property, falling back to the described class.
    pub fn owner_of<'a>(&'a self, property: &'a PropertyDescriptor) -> &'a str {
        property
            .declaring_class
            .as_deref()
            .map_or(self.class_name(), |c| c.trim_start_matches('\\'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> ClassDescriptor {
        ClassDescriptor::builder()
            .name("\\Library\\Book")
            .parents(vec!["Library\\Work".into(), "Library\\Item".into()])
            .fields(vec![FieldMapping::new("id", "integer")])
            .identifier(vec!["id".into()])
            .methods(vec![
                MethodDescriptor::builder().name("getId").build(),
                MethodDescriptor::builder().name("GETID").build(),
            ])
            .build()
    }

    #[test]
    fn test_parent_chain_lookup() {
        let class = book();
        assert_eq!(class.class_name(), "Library\\Book");
        assert_eq!(class.parent(), Some("Library\\Work"));
        assert_eq!(class.parent_of("Library\\Work"), Some("Library\\Item"));
        assert_eq!(class.parent_of("Library\\Item"), None);
    }

    #[test]
    fn test_method_lookup_is_case_insensitive_and_first_wins() {
        let class = book();
        assert_eq!(class.method("getid").map(|m| m.name.as_str()), Some("getId"));
        assert_eq!(class.type_of_field("id"), Some("integer"));
        assert!(class.is_identifier("id"));
    }
}
