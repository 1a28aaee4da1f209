//! Proxy class template and placeholder substitution.

use crate::descriptor::ClassDescriptor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Interface every generated proxy implements unless overridden.
pub const DEFAULT_BASE_PROXY_INTERFACE: &str = "Doctrine\\Common\\Proxy\\Proxy";

/// Resolver signature for computed placeholders.
pub type PlaceholderFn = dyn Fn(&ClassDescriptor) -> String + Send + Sync;

/// Value registered for a template placeholder.
#[derive(Clone)]
pub enum Placeholder {
    Literal(String),
    Resolver(Arc<PlaceholderFn>),
}

impl Placeholder {
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&ClassDescriptor) -> String + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }

    pub fn resolve(&self, class: &ClassDescriptor) -> String {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Resolver(f) => f(class),
        }
    }
}

impl fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<&str> for Placeholder {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Placeholder {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// Placeholder names must be non-empty ASCII letters, the only form the
/// template scanner recognizes.
pub fn is_valid_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Distinct placeholder names in `template`, in order of first appearance.
pub fn placeholder_names(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (_, name) in tokens(template) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replaces every `<name>` token with its resolved value in a single pass.
/// Inserted text is never rescanned; tokens without a value are left as is.
pub fn substitute(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut copied = 0;
    for (start, name) in tokens(template) {
        let Some(value) = values.get(name) else {
            continue;
        };
        out.push_str(&template[copied..start]);
        out.push_str(value);
        copied = start + name.len() + 2;
    }
    out.push_str(&template[copied..]);
    out
}

/// `<name>` tokens as (byte offset of `<`, name), leftmost first and
/// non-overlapping.
fn tokens(template: &str) -> impl Iterator<Item = (usize, &str)> {
    let bytes = template.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < bytes.len() {
            let start = pos;
            pos += 1;
            if bytes[start] != b'<' {
                continue;
            }
            let len = bytes[pos..]
                .iter()
                .take_while(|b| b.is_ascii_alphabetic())
                .count();
            if len > 0 && bytes.get(pos + len) == Some(&b'>') {
                let name = &template[pos..pos + len];
                pos += len + 1;
                return Some((start, name));
            }
        }
        None
    })
}

/// Skeleton of every generated proxy unit.
pub const DEFAULT_PROXY_TEMPLATE: &str = r#"<?php

namespace <namespace>;

/**
 * DO NOT EDIT THIS FILE - IT WAS CREATED BY DOCTRINE'S PROXY GENERATOR
 */
class <proxyShortClassName> extends \<className> implements \<baseProxyInterface>
{
    /**
     * @var \Closure the callback responsible for loading properties in the proxy object. This callback is called with
     *      three parameters, being respectively the proxy object to be initialized, the method that triggered the
     *      initialization process and an array of ordered parameters that were passed to that method.
     *
     * @see \Doctrine\Common\Proxy\Proxy::__setInitializer
     */
    public $__initializer__;

    /**
     * @var \Closure the callback responsible of loading properties that need to be copied in the cloned object
     *
     * @see \Doctrine\Common\Proxy\Proxy::__setCloner
     */
    public $__cloner__;

    /**
     * @var boolean flag indicating if this object was already initialized
     *
     * @see \Doctrine\Persistence\Proxy::__isInitialized
     */
    public $__isInitialized__ = false;

    /**
     * @var array<string, null> properties to be lazy loaded, indexed by property name
     */
    public static $lazyPropertiesNames = <lazyPropertiesNames>;

    /**
     * @var array<string, mixed> default values of properties to be lazy loaded, with keys being the property names
     *
     * @see \Doctrine\Common\Proxy\Proxy::__getLazyProperties
     */
    public static $lazyPropertiesDefaults = <lazyPropertiesDefaults>;

<additionalProperties>

<constructorImpl>

<magicGet>

<magicSet>

<magicIsset>

<sleepImpl>

<wakeupImpl>

<cloneImpl>

    /**
     * Forces initialization of the proxy
     */
    public function __load()
    {
        $this->__initializer__ && $this->__initializer__->__invoke($this, '__load', []);
    }

    /**
     * {@inheritDoc}
     * @internal generated method: use only when explicitly handling proxy specific loading logic
     */
    public function __isInitialized()
    {
        return $this->__isInitialized__;
    }

    /**
     * {@inheritDoc}
     * @internal generated method: use only when explicitly handling proxy specific loading logic
     */
    public function __setInitialized($initialized)
    {
        $this->__isInitialized__ = $initialized;
    }

    /**
     * {@inheritDoc}
     * @internal generated method: use only when explicitly handling proxy specific loading logic
     */
    public function __setInitializer(\Closure $initializer = null)
    {
        $this->__initializer__ = $initializer;
    }

    /**
     * {@inheritDoc}
     * @internal generated method: use only when explicitly handling proxy specific loading logic
     */
    public function __getInitializer()
    {
        return $this->__initializer__;
    }

    /**
     * {@inheritDoc}
     * @internal generated method: use only when explicitly handling proxy specific loading logic
     */
    public function __setCloner(\Closure $cloner = null)
    {
        $this->__cloner__ = $cloner;
    }

    /**
     * {@inheritDoc}
     * @internal generated method: use only when explicitly handling proxy specific cloning logic
     */
    public function __getCloner()
    {
        return $this->__cloner__;
    }

    /**
     * {@inheritDoc}
     * @internal generated method: use only when explicitly handling proxy specific loading logic
     * @deprecated no longer in use - generated code now relies on internal components rather than generated public API
     * @static
     */
    public function __getLazyProperties()
    {
        return self::$lazyPropertiesDefaults;
    }

    <methods>
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_placeholders() {
        assert_eq!(
            placeholder_names(DEFAULT_PROXY_TEMPLATE),
            vec![
                "namespace",
                "proxyShortClassName",
                "className",
                "baseProxyInterface",
                "lazyPropertiesNames",
                "lazyPropertiesDefaults",
                "additionalProperties",
                "constructorImpl",
                "magicGet",
                "magicSet",
                "magicIsset",
                "sleepImpl",
                "wakeupImpl",
                "cloneImpl",
                "methods",
            ]
        );
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let values = HashMap::from([
            ("a".to_string(), "<b>".to_string()),
            ("b".to_string(), "bee".to_string()),
        ]);
        assert_eq!(substitute("<a>|<b>|<c>|<a1>", &values), "<b>|bee|<c>|<a1>");
    }

    #[test]
    fn test_placeholder_name_validity() {
        assert!(is_valid_placeholder_name("baseProxyInterface"));
        assert!(!is_valid_placeholder_name(""));
        assert!(!is_valid_placeholder_name("base_proxy"));
        assert!(!is_valid_placeholder_name("x1"));
    }

    #[test]
    fn test_placeholder_resolution() {
        let class = ClassDescriptor::builder().name("Shop\\Order").build();
        let literal = Placeholder::from("fixed");
        let computed = Placeholder::resolver(|c| c.class_name().to_uppercase());
        assert_eq!(literal.resolve(&class), "fixed");
        assert_eq!(computed.resolve(&class), "SHOP\\ORDER");
        assert_eq!(format!("{computed:?}"), "Resolver(..)");
    }
}
