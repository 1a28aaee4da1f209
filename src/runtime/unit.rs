//! Compiled metadata of a generated proxy type.

use crate::codegen::naming::ProxyName;
use crate::codegen::shape::{ClassShape, ShortGetter};
use crate::descriptor::{ClassDescriptor, Value, Visibility};
use typed_builder::TypedBuilder;

/// A declared, non-static property of the proxied class.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredProperty {
    pub name: String,
    /// Serialization key; private properties are qualified with their owner.
    pub key: String,
    pub visibility: Visibility,
    /// Value a fresh object starts with; `None` leaves the property unset.
    pub initial: Option<Value>,
}

impl DeclaredProperty {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// An intercepted method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub name: String,
    pub returns_value: bool,
    pub short_getter: Option<ShortGetter>,
}

/// Which magic hooks the original class defines itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookFlags {
    pub get: bool,
    pub get_is_void: bool,
    pub set: bool,
    pub isset: bool,
    pub sleep: bool,
    pub wakeup: bool,
    pub clone: bool,
}

/// Everything a proxy instance needs to know about its generated type: the
/// static lazy-property metadata plus the dispatch tables of the rendered
/// hooks and methods.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct ProxyUnit {
    #[builder(setter(into))]
    pub class_name: String,
    pub proxy_name: ProxyName,
    #[builder(default)]
    pub lazy_properties: Vec<String>,
    #[builder(default)]
    pub lazy_defaults: Vec<(String, Value)>,
    #[builder(default)]
    pub properties: Vec<DeclaredProperty>,
    #[builder(default)]
    pub identifier: Vec<String>,
    #[builder(default)]
    pub methods: Vec<MethodEntry>,
    #[builder(default)]
    pub hooks: HookFlags,
}

impl ProxyUnit {
    pub fn from_shape(class: &ClassDescriptor, shape: &ClassShape, proxy_name: ProxyName) -> Self {
        let properties = class
            .properties
            .iter()
            .filter(|p| !p.is_static)
            .zip(&shape.serialized_properties)
            .map(|(p, key)| DeclaredProperty {
                name: p.name.clone(),
                key: key.clone(),
                visibility: p.visibility,
                initial: match (&p.default, &p.type_ref) {
                    (Some(value), _) => Some(value.clone()),
                    (None, None) => Some(Value::Null),
                    (None, Some(_)) => None,
                },
            })
            .collect();

        let hooks = HookFlags {
            get: shape.hooks.get.is_some(),
            get_is_void: shape.hooks.get.as_ref().is_some_and(|h| h.is_void()),
            set: shape.hooks.set.is_some(),
            isset: shape.hooks.isset.is_some(),
            sleep: shape.hooks.sleep.is_some(),
            wakeup: shape.hooks.wakeup.is_some(),
            clone: shape.hooks.clone,
        };

        Self {
            class_name: class.class_name().to_string(),
            proxy_name,
            lazy_properties: shape.lazy_properties.clone(),
            lazy_defaults: shape.lazy_defaults.clone(),
            properties,
            identifier: class.identifier.clone(),
            methods: shape
                .methods
                .iter()
                .map(|m| MethodEntry {
                    name: m.signature.name.clone(),
                    returns_value: m.signature.returns_value,
                    short_getter: m.short_getter.clone(),
                })
                .collect(),
            hooks,
        }
    }

    pub fn is_lazy(&self, name: &str) -> bool {
        self.lazy_properties.iter().any(|p| p == name)
    }

    /// Whether the generated type overrides `__get`.
    pub fn intercepts_reads(&self) -> bool {
        !self.lazy_properties.is_empty() || self.hooks.get
    }

    pub fn intercepts_writes(&self) -> bool {
        !self.lazy_properties.is_empty() || self.hooks.set
    }

    pub fn intercepts_isset(&self) -> bool {
        !self.lazy_properties.is_empty() || self.hooks.isset
    }

    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn property(&self, name: &str) -> Option<&DeclaredProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_key(&self, key: &str) -> Option<&DeclaredProperty> {
        self.properties.iter().find(|p| p.key == key)
    }

    pub fn lazy_default(&self, name: &str) -> Option<&Value> {
        self.lazy_defaults
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}
