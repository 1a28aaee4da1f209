//! Proxy instances.
//!
//! [`ProxyInstance`] models an object of a generated proxy type and follows
//! the exact dispatch the rendered hooks perform: lazy properties start
//! unset, the first access to one of them runs the initializer with the
//! triggering member and its arguments, short identifier getters answer from
//! the unloaded object, and serialization omits lazy properties until the
//! object is initialized.

use super::hooks::{NoHooks, ParentHooks};
use super::unit::ProxyUnit;
use crate::codegen::shape::{INITIALIZED_FLAG, ShortGetter};
use crate::descriptor::Value;
use crate::error::{ProxyError, ProxyResult};
use log::trace;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Initializer and cloner callback: `(instance, member, arguments)`.
pub type Callback = Arc<dyn Fn(&mut ProxyInstance, &str, &[Value]) + Send + Sync>;

/// An object of a generated proxy type.
pub struct ProxyInstance {
    unit: Arc<ProxyUnit>,
    fields: HashMap<String, Value>,
    initialized: bool,
    initializer: Option<Callback>,
    cloner: Option<Callback>,
    hooks: Arc<dyn ParentHooks>,
    notices: Vec<String>,
}

impl ProxyInstance {
    /// Constructs a proxy: every lazy property is unset and both callback
    /// slots are stored.
    pub fn new(unit: Arc<ProxyUnit>, initializer: Option<Callback>, cloner: Option<Callback>) -> Self {
        let mut instance = Self::blank(unit);
        for name in &instance.unit.lazy_properties {
            instance.fields.remove(name);
        }
        instance.initializer = initializer;
        instance.cloner = cloner;
        instance
    }

    /// Revives a serialized proxy without running its constructor, then runs
    /// the wakeup hook. Keys are serialization keys as produced by
    /// [`ProxyInstance::serialize`].
    pub fn from_serialized<I>(unit: Arc<ProxyUnit>, hooks: Arc<dyn ParentHooks>, data: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut instance = Self::blank(unit).with_hooks(hooks);
        for (key, value) in data {
            if key == INITIALIZED_FLAG {
                instance.initialized = value.to_int() != 0;
                continue;
            }
            let name = instance
                .unit
                .property_by_key(&key)
                .map_or(key.clone(), |p| p.name.clone());
            instance.fields.insert(name, value);
        }
        instance.wakeup();
        instance
    }

    fn blank(unit: Arc<ProxyUnit>) -> Self {
        let fields = unit
            .properties
            .iter()
            .filter_map(|p| p.initial.clone().map(|v| (p.name.clone(), v)))
            .collect();
        Self {
            unit,
            fields,
            initialized: false,
            initializer: None,
            cloner: None,
            hooks: Arc::new(NoHooks),
            notices: Vec::new(),
        }
    }

    /// Attaches the original class's own behaviour.
    pub fn with_hooks(mut self, hooks: Arc<dyn ParentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn unit(&self) -> &Arc<ProxyUnit> {
        &self.unit
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    pub fn initializer(&self) -> Option<&Callback> {
        self.initializer.as_ref()
    }

    pub fn set_initializer(&mut self, initializer: Option<Callback>) {
        self.initializer = initializer;
    }

    pub fn cloner(&self) -> Option<&Callback> {
        self.cloner.as_ref()
    }

    pub fn set_cloner(&mut self, cloner: Option<Callback>) {
        self.cloner = cloner;
    }

    /// Static default values of the lazy properties.
    pub fn lazy_properties(&self) -> &[(String, Value)] {
        &self.unit.lazy_defaults
    }

    pub fn lazy_property_names(&self) -> &[String] {
        &self.unit.lazy_properties
    }

    /// Raw write, bypassing interception. Used by initializers.
    pub fn fill(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Raw read, bypassing interception.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Sets the identifier fields, in identifier order.
    pub fn identify<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let unit = Arc::clone(&self.unit);
        for (name, value) in unit.identifier.iter().zip(values) {
            self.fill(name, value);
        }
    }

    /// Recoverable diagnostics raised so far.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Forces initialization.
    pub fn load(&mut self) {
        self.trigger("__load", &[]);
    }

    /// Reads a property from outside the object.
    pub fn get(&mut self, name: &str) -> Option<Value> {
        if let Some(value) = self.accessible(name) {
            return Some(value.clone());
        }
        if !self.unit.intercepts_reads() {
            self.undefined_property(name);
            return None;
        }

        if self.unit.is_lazy(name) {
            self.trigger("__get", &[Value::from(name)]);
            if self.unit.hooks.get_is_void {
                return None;
            }
            return match self.fields.get(name) {
                Some(value) => Some(value.clone()),
                None => {
                    self.undefined_property(name);
                    None
                }
            };
        }

        if self.unit.hooks.get {
            self.trigger("__get", &[Value::from(name)]);
            let hooks = Arc::clone(&self.hooks);
            let value = hooks.get(self, name);
            return if self.unit.hooks.get_is_void { None } else { value };
        }

        self.undefined_property(name);
        None
    }

    /// Writes a property from outside the object.
    pub fn set(&mut self, name: &str, value: Value) {
        if self.accessible(name).is_none() && self.unit.intercepts_writes() {
            if self.unit.is_lazy(name) {
                self.trigger("__set", &[Value::from(name), value.clone()]);
            } else if self.unit.hooks.set {
                self.trigger("__set", &[Value::from(name), value.clone()]);
                let hooks = Arc::clone(&self.hooks);
                hooks.set(self, name, value);
                return;
            }
        }
        self.fill(name, value);
    }

    /// `isset` from outside the object: present and not null.
    pub fn isset(&mut self, name: &str) -> bool {
        if let Some(value) = self.accessible(name) {
            return !value.is_null();
        }
        if !self.unit.intercepts_isset() {
            return false;
        }

        if self.unit.is_lazy(name) {
            self.trigger("__isset", &[Value::from(name)]);
            return self.fields.get(name).is_some_and(|v| !v.is_null());
        }
        if self.unit.hooks.isset {
            self.trigger("__isset", &[Value::from(name)]);
            let hooks = Arc::clone(&self.hooks);
            return hooks.isset(self, name);
        }
        false
    }

    /// Calls an intercepted method. Yields `None` for `void` methods.
    pub fn call(&mut self, method: &str, args: &[Value]) -> ProxyResult<Option<Value>> {
        let Some(entry) = self.unit.method(method).cloned() else {
            return Err(ProxyError::UndefinedMethod {
                class: self.unit.proxy_name.fully_qualified(),
                method: method.to_string(),
            });
        };

        if let Some(getter) = entry.short_getter.as_ref().filter(|_| !self.initialized) {
            return Ok(entry.returns_value.then(|| self.identifier_value(getter)));
        }

        self.trigger(&entry.name, args);
        let hooks = Arc::clone(&self.hooks);
        let result = hooks.call(self, &entry.name, args);
        // a short getter's body is known to return its field
        let result = match (result, entry.short_getter.as_ref()) {
            (None, Some(getter)) => Some(self.identifier_value(getter)),
            (result, _) => result,
        };
        Ok(if entry.returns_value { result } else { None })
    }

    fn identifier_value(&self, getter: &ShortGetter) -> Value {
        let value = self.fields.get(&getter.field).cloned().unwrap_or_default();
        if getter.cast_to_int {
            Value::Int(value.to_int())
        } else {
            value
        }
    }

    /// Names to serialize, as serialization keys.
    pub fn sleep(&self) -> Vec<String> {
        let mut names = vec![INITIALIZED_FLAG.to_string()];
        if self.unit.hooks.sleep {
            names.extend(self.hooks.sleep(self));
        } else {
            names.extend(self.unit.properties.iter().map(|p| p.key.clone()));
        }
        if !self.initialized {
            names.retain(|name| !self.unit.is_lazy(name));
        }
        names
    }

    /// Serialized state: every name from [`ProxyInstance::sleep`] that holds
    /// a value.
    pub fn serialize(&self) -> Vec<(String, Value)> {
        self.sleep()
            .into_iter()
            .filter_map(|key| {
                if key == INITIALIZED_FLAG {
                    return Some((key, Value::Bool(self.initialized)));
                }
                let name = self.unit.property_by_key(&key).map_or(key.as_str(), |p| p.name.as_str());
                let value = self.fields.get(name)?.clone();
                Some((key, value))
            })
            .collect()
    }

    /// Runs after deserialization. An uninitialized object gets a default
    /// initializer that back-fills missing lazy properties from their
    /// defaults, and its lazy properties are unset again.
    pub fn wakeup(&mut self) {
        if !self.initialized {
            let initializer: Callback = Arc::new(|proxy: &mut ProxyInstance, _: &str, _: &[Value]| {
                proxy.set_initializer(None);
                proxy.set_cloner(None);
                let unit = Arc::clone(&proxy.unit);
                for (name, default) in &unit.lazy_defaults {
                    if !proxy.has_field(name) {
                        proxy.fill(name, default.clone());
                    }
                }
            });
            self.initializer = Some(initializer);

            let unit = Arc::clone(&self.unit);
            for name in &unit.lazy_properties {
                self.fields.remove(name);
            }
        }
        if self.unit.hooks.wakeup {
            let hooks = Arc::clone(&self.hooks);
            hooks.wakeup(self);
        }
    }

    /// Clones the object, then runs the cloner and the original clone hook on
    /// the copy.
    pub fn clone_proxy(&self) -> Self {
        let mut copy = Self {
            unit: Arc::clone(&self.unit),
            fields: self.fields.clone(),
            initialized: self.initialized,
            initializer: self.initializer.clone(),
            cloner: self.cloner.clone(),
            hooks: Arc::clone(&self.hooks),
            notices: Vec::new(),
        };
        if let Some(cloner) = copy.cloner.clone() {
            cloner(&mut copy, "__clone", &[]);
        }
        if self.unit.hooks.clone {
            let hooks = Arc::clone(&self.hooks);
            hooks.clone_hook(&mut copy);
        }
        copy
    }

    fn trigger(&mut self, member: &str, args: &[Value]) {
        if let Some(initializer) = self.initializer.clone() {
            trace!(
                "ProxyInstance: {member} triggers initializer of {}",
                self.unit.proxy_name.fully_qualified()
            );
            initializer(self, member, args);
        }
    }

    /// Present and visible from outside: public declared properties and
    /// dynamic ones.
    fn accessible(&self, name: &str) -> Option<&Value> {
        let visible = self.unit.property(name).is_none_or(|p| p.is_public());
        self.fields.get(name).filter(|_| visible)
    }

    fn undefined_property(&mut self, name: &str) {
        let notice = format!(
            "Undefined property: {}::${name}",
            self.unit.proxy_name.fully_qualified()
        );
        trace!("ProxyInstance: {notice}");
        self.notices.push(notice);
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("proxy", &self.unit.proxy_name.fully_qualified())
            .field("initialized", &self.initialized)
            .field("fields", &self.fields)
            .field("has_initializer", &self.initializer.is_some())
            .field("has_cloner", &self.cloner.is_some())
            .finish()
    }
}
