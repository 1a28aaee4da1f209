//! Fragment generators.
//!
//! Each function renders the code of one built-in template placeholder from
//! the extracted [`ClassShape`]. Fragments that have nothing to intercept
//! render as the empty string.

use super::shape::{ClassShape, INITIALIZED_FLAG, InterceptedMethod};
use super::signature::MethodSignature;
use crate::descriptor::Value;

fn inherit_doc(overrides: bool) -> &'static str {
    if overrides { "{@inheritDoc}" } else { "" }
}

fn hint(hook: Option<&MethodSignature>) -> &str {
    hook.map_or("", |h| h.return_hint.as_str())
}

fn unset_list(shape: &ClassShape) -> String {
    shape
        .lazy_properties
        .iter()
        .map(|name| format!("$this->{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `array ('a' => NULL, ...)` keyed by lazy property name.
pub fn lazy_properties_names(shape: &ClassShape) -> String {
    Value::map(shape.lazy_properties.iter().map(|name| (name.as_str(), Value::Null))).export()
}

/// Default value of every lazy property that has one.
pub fn lazy_properties_defaults(shape: &ClassShape) -> String {
    Value::map(shape.lazy_defaults.iter().map(|(name, value)| (name.as_str(), value.clone())))
        .export()
}

pub fn constructor_impl(shape: &ClassShape) -> String {
    let mut code = String::from(
        "    public function __construct(?\\Closure $initializer = null, ?\\Closure $cloner = null)\n    {\n",
    );
    if !shape.lazy_properties.is_empty() {
        code.push_str(&format!("        unset({});\n", unset_list(shape)));
    }
    code.push_str(
        "\n        $this->__initializer__ = $initializer;\n        $this->__cloner__      = $cloner;\n    }",
    );
    code
}

pub fn magic_get(shape: &ClassShape) -> String {
    let parent = shape.hooks.get.as_ref();
    let has_lazy = !shape.lazy_properties.is_empty();
    if !has_lazy && parent.is_none() {
        return String::new();
    }

    let reference = if parent.is_some_and(|p| p.returns_reference) { "& " } else { "" };
    let parameters = parent.map_or("$name", |p| p.parameters.as_str());
    let is_void = parent.is_some_and(MethodSignature::is_void);

    let mut code = format!(
        "    /**\n     * {}\n     * @param string $name\n     */\n    public function {reference}__get({parameters}){}\n    {{\n",
        inherit_doc(parent.is_some()),
        hint(parent),
    );

    if has_lazy {
        code.push_str(
            "        if (\\array_key_exists($name, self::$lazyPropertiesNames)) {\n            $this->__initializer__ && $this->__initializer__->__invoke($this, '__get', [$name]);",
        );
        code.push_str(if is_void {
            "\n            return;"
        } else {
            "\n            return $this->$name;"
        });
        code.push_str("\n        }\n\n");
    }

    if parent.is_some() {
        code.push_str(
            "        $this->__initializer__ && $this->__initializer__->__invoke($this, '__get', [$name]);",
        );
        code.push_str(if is_void {
            "\n        parent::__get($name);\n        return;"
        } else {
            "\n        return parent::__get($name);"
        });
    } else {
        code.push_str(
            "        trigger_error(sprintf('Undefined property: %s::$%s', __CLASS__, $name), E_USER_NOTICE);\n",
        );
    }

    code.push_str("\n    }");
    code
}

pub fn magic_set(shape: &ClassShape) -> String {
    let parent = shape.hooks.set.as_ref();
    let has_lazy = !shape.lazy_properties.is_empty();
    if !has_lazy && parent.is_none() {
        return String::new();
    }

    let parameters = parent.map_or("$name, $value", |p| p.parameters.as_str());
    let mut code = format!(
        "    /**\n     * {}\n     * @param string $name\n     * @param mixed  $value\n     */\n    public function __set({parameters}){}\n    {{\n",
        inherit_doc(parent.is_some()),
        hint(parent),
    );

    if has_lazy {
        code.push_str(
            "        if (\\array_key_exists($name, self::$lazyPropertiesNames)) {\n            $this->__initializer__ && $this->__initializer__->__invoke($this, '__set', [$name, $value]);\n\n            $this->$name = $value;\n\n            return;\n        }\n\n",
        );
    }

    match parent {
        Some(p) => {
            code.push_str(
                "        $this->__initializer__ && $this->__initializer__->__invoke($this, '__set', [$name, $value]);\n\n",
            );
            // a void hook cannot return its parent's result
            code.push_str(if p.is_void() {
                "        parent::__set($name, $value);"
            } else {
                "        return parent::__set($name, $value);"
            });
        }
        None => code.push_str("        $this->$name = $value;"),
    }

    code.push_str("\n    }");
    code
}

pub fn magic_isset(shape: &ClassShape) -> String {
    let parent = shape.hooks.isset.as_ref();
    let has_lazy = !shape.lazy_properties.is_empty();
    if !has_lazy && parent.is_none() {
        return String::new();
    }

    let parameters = parent.map_or("$name", |p| p.parameters.as_str());
    let mut code = format!(
        "    /**\n     * {}\n     * @param  string $name\n     * @return boolean\n     */\n    public function __isset({parameters}){}\n    {{\n",
        inherit_doc(parent.is_some()),
        hint(parent),
    );

    if has_lazy {
        code.push_str(
            "        if (\\array_key_exists($name, self::$lazyPropertiesNames)) {\n            $this->__initializer__ && $this->__initializer__->__invoke($this, '__isset', [$name]);\n\n            return isset($this->$name);\n        }\n\n",
        );
    }

    if parent.is_some() {
        code.push_str(
            "        $this->__initializer__ && $this->__initializer__->__invoke($this, '__isset', [$name]);\n\n        return parent::__isset($name);",
        );
    } else {
        code.push_str("        return false;");
    }

    code.push_str("\n    }");
    code
}

pub fn sleep_impl(shape: &ClassShape) -> String {
    let parent = shape.hooks.sleep.as_ref();
    let mut code = format!(
        "    /**\n     * {}\n     * @return array\n     */\n    public function __sleep(){}\n    {{\n",
        inherit_doc(parent.is_some()),
        hint(parent),
    );

    if parent.is_some() {
        code.push_str(
            "        $properties = array_merge(['__isInitialized__'], parent::__sleep());\n\n        if (! $this->__isInitialized__) {\n            $properties = array_diff($properties, array_keys(self::$lazyPropertiesNames));\n        }\n\n        return $properties;\n    }",
        );
        return code;
    }

    let all: Vec<&str> = std::iter::once(INITIALIZED_FLAG)
        .chain(shape.serialized_properties.iter().map(String::as_str))
        .collect();
    let export = |names: &[&str]| {
        names
            .iter()
            .map(|name| Value::from(*name).export())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let retained: Vec<&str> = all.iter().copied().filter(|name| !shape.is_lazy(name)).collect();

    code.push_str(&format!(
        "        if ($this->__isInitialized__) {{\n            return [{}];\n        }}\n\n        return [{}];\n    }}",
        export(&all),
        export(&retained),
    ));
    code
}

pub fn wakeup_impl(shape: &ClassShape, proxy_short_name: &str) -> String {
    let parent = shape.hooks.wakeup.as_ref();
    let mut code = format!(
        "    /**\n     * {}\n     */\n    public function __wakeup(){}\n    {{\n        if ( ! $this->__isInitialized__) {{\n            $this->__initializer__ = function ({proxy_short_name} $proxy) {{\n                $proxy->__setInitializer(null);\n                $proxy->__setCloner(null);\n\n                $existingProperties = get_object_vars($proxy);\n\n                foreach ($proxy::$lazyPropertiesDefaults as $property => $defaultValue) {{\n                    if ( ! array_key_exists($property, $existingProperties)) {{\n                        $proxy->$property = $defaultValue;\n                    }}\n                }}\n            }};\n",
        inherit_doc(parent.is_some()),
        hint(parent),
    );

    if !shape.lazy_properties.is_empty() {
        code.push_str(&format!("\n            unset({});", unset_list(shape)));
    }
    code.push_str("\n        }");
    if parent.is_some() {
        code.push_str("\n        parent::__wakeup();");
    }
    code.push_str("\n    }");
    code
}

pub fn clone_impl(shape: &ClassShape) -> String {
    let call_parent = if shape.hooks.clone {
        "\n        parent::__clone();\n"
    } else {
        ""
    };
    format!(
        "    /**\n     * {}\n     */\n    public function __clone()\n    {{\n        $this->__cloner__ && $this->__cloner__->__invoke($this, '__clone', []);\n{call_parent}    }}",
        inherit_doc(shape.hooks.clone),
    )
}

/// Overrides of every intercepted public method.
pub fn methods(shape: &ClassShape) -> String {
    shape.methods.iter().map(method).collect()
}

fn method(intercepted: &InterceptedMethod) -> String {
    let signature = &intercepted.signature;
    let name = &signature.name;
    let returns = if signature.returns_value { "return " } else { "" };

    let mut code = format!(
        "\n    /**\n     * {{@inheritDoc}}\n     */\n    public function {}{name}({}){}\n    {{\n",
        if signature.returns_reference { "&" } else { "" },
        signature.parameters,
        signature.return_hint,
    );

    if let Some(getter) = &intercepted.short_getter {
        let cast = if getter.cast_to_int { "(int) " } else { "" };
        code.push_str(&format!(
            "        if ($this->__isInitialized__ === false) {{\n            {returns}{cast}parent::{name}();\n        }}\n\n"
        ));
    }

    code.push_str(&format!(
        "\n        $this->__initializer__ && $this->__initializer__->__invoke($this, {}, [{}]);\n\n        {returns}parent::{name}({});\n    }}\n",
        Value::from(name.as_str()).export(),
        signature.invoke_arguments,
        signature.forward_arguments,
    ));
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shape::{OriginalHooks, ShortGetter};

    fn signature(name: &str, parameters: &str, return_hint: &str) -> MethodSignature {
        MethodSignature {
            name: name.to_string(),
            returns_reference: false,
            parameters: parameters.to_string(),
            return_hint: return_hint.to_string(),
            returns_value: !return_hint.eq_ignore_ascii_case(": void"),
            invoke_arguments: String::new(),
            forward_arguments: String::new(),
        }
    }

    fn shape(lazy: &[&str]) -> ClassShape {
        ClassShape {
            lazy_properties: lazy.iter().map(|s| s.to_string()).collect(),
            lazy_defaults: lazy.iter().map(|s| (s.to_string(), Value::Null)).collect(),
            serialized_properties: vec!["id".into(), "name".into(), "\0Acme\\User\0hash".into()],
            hooks: OriginalHooks::default(),
            methods: Vec::new(),
        }
    }

    #[test]
    fn test_lazy_property_literals() {
        let shape = shape(&["name", "email"]);
        assert_eq!(
            lazy_properties_names(&shape),
            "array (\n  'name' => NULL,\n  'email' => NULL,\n)"
        );
        assert_eq!(lazy_properties_names(&self::shape(&[])), "array (\n)");
    }

    #[test]
    fn test_constructor_unsets_lazy_properties() {
        let code = constructor_impl(&shape(&["name", "email"]));
        assert!(code.contains("        unset($this->name, $this->email);\n"));
        assert!(code.ends_with("$this->__cloner__      = $cloner;\n    }"));
        assert!(!constructor_impl(&shape(&[])).contains("unset"));
    }

    #[test]
    fn test_magic_hooks_omitted_without_lazy_properties_or_parent() {
        let empty = shape(&[]);
        assert_eq!(magic_get(&empty), "");
        assert_eq!(magic_set(&empty), "");
        assert_eq!(magic_isset(&empty), "");
    }

    #[test]
    fn test_magic_get_without_parent_raises_notice() {
        let code = magic_get(&shape(&["name"]));
        assert!(code.contains("public function __get($name)\n"));
        assert!(code.contains("__invoke($this, '__get', [$name]);\n            return $this->$name;"));
        assert!(code.contains("E_USER_NOTICE"));
    }

    #[test]
    fn test_magic_get_with_void_parent() {
        let mut shape = shape(&[]);
        shape.hooks.get = Some(signature("__get", "$name", ": void"));
        let code = magic_get(&shape);
        assert!(code.contains("{@inheritDoc}"));
        assert!(code.contains("public function __get($name): void\n"));
        assert!(code.ends_with("parent::__get($name);\n        return;\n    }"));
        assert!(!code.contains("E_USER_NOTICE"));
    }

    #[test]
    fn test_magic_set_with_void_parent_does_not_return_value() {
        let mut shape = shape(&["name"]);
        shape.hooks.set = Some(signature("__set", "$name, $value", ": void"));
        let code = magic_set(&shape);
        assert!(code.contains("        parent::__set($name, $value);"));
        assert!(!code.contains("return parent::__set"));
    }

    #[test]
    fn test_magic_set_returns_parent_result() {
        let mut shape = shape(&["name"]);
        shape.hooks.set = Some(signature("__set", "$name, $value", ""));
        let code = magic_set(&shape);
        assert!(code.contains("{@inheritDoc}"));
        assert!(code.contains("public function __set($name, $value)\n"));
        assert!(code.contains("\n            $this->$name = $value;\n\n            return;\n        }\n\n"));
        assert!(code.ends_with(
            "__invoke($this, '__set', [$name, $value]);\n\n        return parent::__set($name, $value);\n    }"
        ));
    }

    #[test]
    fn test_magic_isset_delegates_to_parent() {
        let mut shape = shape(&["name"]);
        assert!(magic_isset(&shape).ends_with("        return false;\n    }"));

        shape.hooks.isset = Some(signature("__isset", "$name", ": bool"));
        let code = magic_isset(&shape);
        assert!(code.contains("public function __isset($name): bool\n"));
        assert!(code.contains("return isset($this->$name);"));
        assert!(code.ends_with(
            "__invoke($this, '__isset', [$name]);\n\n        return parent::__isset($name);\n    }"
        ));
        assert!(!code.contains("return false;"));
    }

    #[test]
    fn test_wakeup_calls_parent_after_unsetting() {
        let mut shape = shape(&["name"]);
        shape.hooks.wakeup = Some(signature("__wakeup", "", ": void"));
        let code = wakeup_impl(&shape, "User");
        assert!(code.contains("public function __wakeup(): void\n"));
        assert!(code.ends_with(
            "\n            unset($this->name);\n        }\n        parent::__wakeup();\n    }"
        ));
    }

    #[test]
    fn test_sleep_without_parent_lists_properties() {
        let code = sleep_impl(&shape(&["name"]));
        assert!(code.contains(
            "return ['__isInitialized__', 'id', 'name', '' . \"\\0\" . 'Acme\\\\User' . \"\\0\" . 'hash'];"
        ));
        assert!(code.contains(
            "return ['__isInitialized__', 'id', '' . \"\\0\" . 'Acme\\\\User' . \"\\0\" . 'hash'];"
        ));
    }

    #[test]
    fn test_sleep_with_parent_filters_when_uninitialized() {
        let mut shape = shape(&["name"]);
        shape.hooks.sleep = Some(signature("__sleep", "", ": array"));
        let code = sleep_impl(&shape);
        assert!(code.contains("public function __sleep(): array\n"));
        assert!(code.contains("if (! $this->__isInitialized__) {"));
    }

    #[test]
    fn test_wakeup_and_clone() {
        let mut shape = shape(&["name"]);
        let wakeup = wakeup_impl(&shape, "User");
        assert!(wakeup.contains("function (User $proxy)"));
        assert!(wakeup.contains("\n            unset($this->name);\n        }\n    }"));

        assert!(!clone_impl(&shape).contains("parent::__clone"));
        shape.hooks.clone = true;
        assert!(clone_impl(&shape).contains("\n        parent::__clone();\n    }"));
    }

    #[test]
    fn test_method_with_short_getter_fast_path() {
        let mut shape = shape(&[]);
        shape.methods.push(InterceptedMethod {
            signature: signature("getId", "", ": int"),
            short_getter: Some(ShortGetter {
                field: "id".into(),
                cast_to_int: true,
            }),
        });
        let code = methods(&shape);
        assert!(code.contains("public function getId(): int\n    {\n"));
        assert!(code.contains(
            "        if ($this->__isInitialized__ === false) {\n            return (int) parent::getId();\n        }\n\n"
        ));
        assert!(code.contains("__invoke($this, 'getId', []);\n\n        return parent::getId();"));
    }

    #[test]
    fn test_void_method_does_not_return() {
        let mut shape = shape(&[]);
        let mut touch = signature("touch", "string $at", ": void");
        touch.invoke_arguments = "$at".into();
        touch.forward_arguments = "$at".into();
        shape.methods.push(InterceptedMethod {
            signature: touch,
            short_getter: None,
        });
        let code = methods(&shape);
        assert!(code.contains("__invoke($this, 'touch', [$at]);\n\n        parent::touch($at);"));
    }
}
