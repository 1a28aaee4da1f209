//! Shape extraction.
//!
//! Classifies a class's members into what the proxy must intercept: lazy
//! public properties (with their defaults), the original's own magic hooks,
//! the public methods to override, and which of those are short identifier
//! getters that may answer without loading.

use super::signature::MethodSignature;
use crate::descriptor::{ClassDescriptor, MethodDescriptor, TypeResolver, Value, Visibility};
use crate::error::SignatureError;
use regex::Regex;

/// Method names handled by dedicated hook fragments rather than by generic
/// interception.
pub const HOOK_METHODS: &[&str] = &["__sleep", "__clone", "__wakeup", "__get", "__set", "__isset"];

/// Mapping types whose identifier values are cast to integers on the fast
/// path.
pub const INTEGER_MAPPING_TYPES: &[&str] = &["integer", "smallint"];

/// Name of the serialized initialization flag.
pub const INITIALIZED_FLAG: &str = "__isInitialized__";

// end line minus start line
const MAX_SHORT_GETTER_SPAN: usize = 4;

/// Fast path of a short identifier getter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortGetter {
    pub field: String,
    pub cast_to_int: bool,
}

/// A public method the proxy overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedMethod {
    pub signature: MethodSignature,
    pub short_getter: Option<ShortGetter>,
}

/// Magic hooks the original class already defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalHooks {
    pub get: Option<MethodSignature>,
    pub set: Option<MethodSignature>,
    pub isset: Option<MethodSignature>,
    pub sleep: Option<MethodSignature>,
    pub wakeup: Option<MethodSignature>,
    pub clone: bool,
}

/// Everything the fragment generators need to know about a class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassShape {
    pub lazy_properties: Vec<String>,
    pub lazy_defaults: Vec<(String, Value)>,
    /// Serialization keys of every non-static property, private ones
    /// qualified with their owning class.
    pub serialized_properties: Vec<String>,
    pub hooks: OriginalHooks,
    pub methods: Vec<InterceptedMethod>,
}

impl ClassShape {
    /// Extracts the shape of `class`, projecting every signature the proxy
    /// will render. Fails on the first unresolvable type.
    pub fn extract(
        class: &ClassDescriptor,
        resolver: &dyn TypeResolver,
    ) -> Result<Self, SignatureError> {
        let hook = |name: &str, rename: &[&str]| -> Result<Option<MethodSignature>, SignatureError> {
            class
                .method(name)
                .map(|m| MethodSignature::project(class, m, resolver, rename))
                .transpose()
        };

        let hooks = OriginalHooks {
            get: hook("__get", &["name"])?,
            set: hook("__set", &["name", "value"])?,
            isset: hook("__isset", &["name"])?,
            sleep: hook("__sleep", &[])?,
            wakeup: hook("__wakeup", &[])?,
            clone: class.has_method("__clone"),
        };

        let mut methods = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for method in &class.methods {
            if !is_interceptable(method) || !seen.insert(method.name.to_ascii_lowercase()) {
                continue;
            }
            methods.push(InterceptedMethod {
                signature: MethodSignature::project(class, method, resolver, &[])?,
                short_getter: short_getter(method, class),
            });
        }

        Ok(Self {
            lazy_properties: lazy_property_names(class),
            lazy_defaults: lazy_property_defaults(class),
            serialized_properties: serialized_property_keys(class),
            hooks,
            methods,
        })
    }

    pub fn is_lazy(&self, name: &str) -> bool {
        self.lazy_properties.iter().any(|p| p == name)
    }
}

fn is_interceptable(method: &MethodDescriptor) -> bool {
    method.is_public()
        && !method.is_constructor()
        && !method.is_final
        && !method.is_static
        && !HOOK_METHODS.iter().any(|h| method.is_named(h))
}

/// Public, non-static, non-identifier properties that are mapped fields or
/// associations, in declaration order.
pub fn lazy_property_names(class: &ClassDescriptor) -> Vec<String> {
    class
        .properties
        .iter()
        .filter(|p| p.visibility == Visibility::Public && !p.is_static)
        .filter(|p| {
            (class.has_field(&p.name) || class.has_association(&p.name))
                && !class.is_identifier(&p.name)
        })
        .map(|p| p.name.clone())
        .collect()
}

/// Defaults of the lazy properties: the declared default, else `NULL` for
/// untyped or nullable properties. Typed non-nullable properties without a
/// default have none.
pub fn lazy_property_defaults(class: &ClassDescriptor) -> Vec<(String, Value)> {
    lazy_property_names(class)
        .into_iter()
        .filter_map(|name| {
            let property = class.property(&name)?;
            let default = match (&property.default, &property.type_ref) {
                (Some(value), _) => value.clone(),
                (None, None) => Value::Null,
                (None, Some(ty)) if ty.allows_null() => Value::Null,
                (None, Some(_)) => return None,
            };
            Some((name, default))
        })
        .collect()
}

fn serialized_property_keys(class: &ClassDescriptor) -> Vec<String> {
    class
        .properties
        .iter()
        .filter(|p| !p.is_static)
        .map(|p| {
            if p.visibility == Visibility::Private {
                format!("\0{}\0{}", class.owner_of(p), p.name)
            } else {
                p.name.clone()
            }
        })
        .collect()
}

/// Whether `method` provably does nothing but return a raw identifier field.
pub fn is_short_identifier_getter(method: &MethodDescriptor, class: &ClassDescriptor) -> bool {
    short_getter(method, class).is_some()
}

/// The fast path for `method`, if it is a short identifier getter.
///
/// The cheap structural check comes first; the method's source text then has
/// to be a single `return $this-><field>;` body with at most a return type
/// annotation. Methods without source text never qualify.
pub fn short_getter(method: &MethodDescriptor, class: &ClassDescriptor) -> Option<ShortGetter> {
    let rest = method.name.strip_prefix("get")?;
    let field = lcfirst(rest);

    let cheap_check = method.parameters.is_empty()
        && class.is_identifier(&field)
        && class.has_field(&field);
    if !cheap_check {
        return None;
    }

    let source = method.source.as_deref()?;
    let lines: Vec<&str> = source.lines().collect();
    if lines.len().saturating_sub(1) > MAX_SHORT_GETTER_SPAN {
        return None;
    }

    let code = lines.join(" ");
    let pattern = identifier_getter_pattern(&method.name, &field)?;
    if !pattern.is_match(code.trim()) {
        return None;
    }

    let cast_to_int = class
        .type_of_field(&field)
        .is_some_and(|t| INTEGER_MAPPING_TYPES.contains(&t));

    Some(ShortGetter { field, cast_to_int })
}

fn identifier_getter_pattern(method: &str, field: &str) -> Option<Regex> {
    const TYPE_NAME: &str = r"[a-z_\x{7f}-\x{ff}][\w\x{7f}-\x{ff}]*";
    let pattern = format!(
        r"(?i)(public\s+)?(function\s+{method}\s*\(\)\s*)\s*(?::\s*\??\s*\\?{TYPE_NAME}(?:\\{TYPE_NAME})*\s*)?\{{\s*return\s*\$this->{field};\s*\}}",
        method = regex::escape(method),
        field = regex::escape(field),
    );
    Regex::new(&pattern).ok()
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        FieldMapping, ParameterDescriptor, PropertyDescriptor, TypeRef, TypeRegistry,
    };

    fn getter(source: &str) -> MethodDescriptor {
        MethodDescriptor::builder()
            .name("getId")
            .return_type(TypeRef::new("int"))
            .source(source)
            .build()
    }

    fn article(methods: Vec<MethodDescriptor>) -> ClassDescriptor {
        ClassDescriptor::builder()
            .name("News\\Article")
            .properties(vec![
                PropertyDescriptor::builder().name("id").type_ref(TypeRef::new("int")).build(),
                PropertyDescriptor::builder().name("title").type_ref(TypeRef::new("string")).build(),
                PropertyDescriptor::builder()
                    .name("body")
                    .type_ref(TypeRef::nullable("string"))
                    .build(),
                PropertyDescriptor::builder().name("author").build(),
                PropertyDescriptor::builder().name("views").default(0).build(),
                PropertyDescriptor::builder()
                    .name("secret")
                    .visibility(Visibility::Private)
                    .build(),
                PropertyDescriptor::builder().name("transient").build(),
                PropertyDescriptor::builder().name("count").is_static(true).build(),
            ])
            .fields(vec![
                FieldMapping::new("id", "integer"),
                FieldMapping::new("title", "string"),
                FieldMapping::new("body", "text"),
                FieldMapping::new("views", "integer"),
                FieldMapping::new("secret", "string"),
            ])
            .associations(vec!["author".into()])
            .identifier(vec!["id".into()])
            .methods(methods)
            .build()
    }

    #[test]
    fn test_lazy_properties_exclude_identifier_private_and_unmapped() {
        let class = article(vec![]);
        assert_eq!(lazy_property_names(&class), vec!["title", "body", "author", "views"]);
    }

    #[test]
    fn test_lazy_defaults() {
        let class = article(vec![]);
        assert_eq!(
            lazy_property_defaults(&class),
            vec![
                ("body".to_string(), Value::Null),
                ("author".to_string(), Value::Null),
                ("views".to_string(), Value::Int(0)),
            ]
        );
    }

    #[test]
    fn test_short_getter_recognized() {
        let class = article(vec![]);
        let method = getter("public function getId(): int\n{\n    return $this->id;\n}");
        assert_eq!(
            short_getter(&method, &class),
            Some(ShortGetter {
                field: "id".into(),
                cast_to_int: true
            })
        );
        assert!(is_short_identifier_getter(
            &getter("function getId() { return $this->id; }"),
            &class
        ));
    }

    #[test]
    fn test_short_getter_rejects_side_effects_and_long_bodies() {
        let class = article(vec![]);
        assert!(!is_short_identifier_getter(
            &getter("public function getId(): int { $this->touch(); return $this->id; }"),
            &class
        ));
        assert!(!is_short_identifier_getter(
            &getter("public function getId(): int\n{\n\n\n\n    return $this->id;\n}"),
            &class
        ));
        assert!(!is_short_identifier_getter(
            &getter("public function getId(): int { return $this->title; }"),
            &class
        ));
        assert!(!is_short_identifier_getter(
            &MethodDescriptor::builder().name("getId").build(),
            &class
        ));
    }

    #[test]
    fn test_short_getter_requires_identifier_field_and_no_parameters() {
        let class = article(vec![]);
        let title = MethodDescriptor::builder()
            .name("getTitle")
            .source("public function getTitle() { return $this->title; }")
            .build();
        assert!(!is_short_identifier_getter(&title, &class));

        let with_param = MethodDescriptor::builder()
            .name("getId")
            .parameters(vec![ParameterDescriptor::builder().name("x").build()])
            .source("public function getId($x) { return $this->id; }")
            .build();
        assert!(!is_short_identifier_getter(&with_param, &class));
    }

    #[test]
    fn test_extract_filters_methods_and_hooks() {
        let class = article(vec![
            MethodDescriptor::builder().name("__construct").build(),
            MethodDescriptor::builder().name("__GET").parameters(vec![
                ParameterDescriptor::builder().name("prop").build(),
            ]).build(),
            MethodDescriptor::builder().name("getTitle").build(),
            MethodDescriptor::builder().name("gettitle").build(),
            MethodDescriptor::builder().name("lock").is_final(true).build(),
            MethodDescriptor::builder().name("create").is_static(true).build(),
            MethodDescriptor::builder()
                .name("internal")
                .visibility(Visibility::Protected)
                .build(),
            getter("public function getId(): int { return $this->id; }"),
        ]);

        let shape = ClassShape::extract(&class, &TypeRegistry::new()).unwrap();
        let names: Vec<_> = shape.methods.iter().map(|m| m.signature.name.as_str()).collect();
        assert_eq!(names, vec!["getTitle", "getId"]);
        assert!(shape.methods[1].short_getter.is_some());
        assert_eq!(shape.hooks.get.as_ref().map(|h| h.parameters.as_str()), Some("$name"));
        assert!(shape.hooks.set.is_none());
        assert!(!shape.hooks.clone);
        assert_eq!(
            shape.serialized_properties,
            vec!["id", "title", "body", "author", "views", "\0News\\Article\0secret", "transient"]
        );
    }
}
