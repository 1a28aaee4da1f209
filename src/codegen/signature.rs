//! Signature projection.
//!
//! Reproduces a method's declared signature so that the generated override is
//! assignment-compatible with the original: parameter types, nullability,
//! by-reference and variadic markers, defaults, and the return type.

use crate::descriptor::{
    ClassDescriptor, MethodDescriptor, ParameterDescriptor, TypeRef, TypeResolver, Value,
};
use crate::error::SignatureError;

/// A method signature rendered into source fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub returns_reference: bool,
    /// Parameter list without the surrounding parentheses.
    pub parameters: String,
    /// `: Type` or empty when no return type is declared.
    pub return_hint: String,
    /// False only for `void` methods.
    pub returns_value: bool,
    /// Arguments handed to the initializer: `$a, $b`.
    pub invoke_arguments: String,
    /// Arguments forwarded to the parent call: `$a, ...$rest`.
    pub forward_arguments: String,
}

impl MethodSignature {
    /// Projects `method` as declared on `class`. When `rename` is non-empty,
    /// parameters are emitted under those names positionally.
    pub fn project(
        class: &ClassDescriptor,
        method: &MethodDescriptor,
        resolver: &dyn TypeResolver,
        rename: &[&str],
    ) -> Result<Self, SignatureError> {
        let projector = Projector {
            class,
            method,
            resolver,
        };

        let mut parameters = Vec::with_capacity(method.parameters.len());
        for (i, parameter) in method.parameters.iter().enumerate() {
            let name = rename.get(i).copied().unwrap_or(&parameter.name);
            parameters.push(projector.parameter(parameter, name)?);
        }

        let (return_hint, returns_value) = match &method.return_type {
            Some(ty) => {
                let formatted = projector.format(ty, None)?;
                let returns = !formatted.eq_ignore_ascii_case("void");
                (format!(": {formatted}"), returns)
            }
            None => (String::new(), true),
        };

        Ok(Self {
            name: method.name.clone(),
            returns_reference: method.returns_reference,
            parameters: parameters.join(", "),
            return_hint,
            returns_value,
            invoke_arguments: method
                .parameters
                .iter()
                .map(|p| format!("${}", p.name))
                .collect::<Vec<_>>()
                .join(", "),
            forward_arguments: method
                .parameters
                .iter()
                .map(|p| {
                    if p.variadic {
                        format!("...${}", p.name)
                    } else {
                        format!("${}", p.name)
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    pub fn is_void(&self) -> bool {
        !self.returns_value
    }
}

struct Projector<'a> {
    class: &'a ClassDescriptor,
    method: &'a MethodDescriptor,
    resolver: &'a dyn TypeResolver,
}

impl Projector<'_> {
    fn parameter(&self, parameter: &ParameterDescriptor, name: &str) -> Result<String, SignatureError> {
        let mut definition = String::new();

        if let Some(ty) = &parameter.type_ref {
            definition.push_str(&self.format(ty, Some(parameter))?);
            definition.push(' ');
        }
        if parameter.by_reference {
            definition.push('&');
        }
        if parameter.variadic {
            definition.push_str("...");
        }
        definition.push('$');
        definition.push_str(name);
        if let Some(default) = &parameter.default {
            definition.push_str(" = ");
            definition.push_str(&default.export());
        }

        Ok(definition)
    }

    fn format(
        &self,
        ty: &TypeRef,
        parameter: Option<&ParameterDescriptor>,
    ) -> Result<String, SignatureError> {
        let declaring = self.class.declaring_class_of(self.method);

        let name = if ty.is_self() {
            Some(declaring.to_string())
        } else if ty.is_parent() {
            self.class.parent_of(declaring).map(str::to_string)
        } else {
            Some(ty.name().to_string())
        };

        let resolved = match name {
            Some(name) if ty.is_builtin() || self.resolves(&name) => name,
            _ => return Err(self.invalid(parameter)),
        };

        let mut formatted = String::new();
        let implied_by_default = parameter
            .and_then(|p| p.default.as_ref())
            .is_some_and(Value::is_null);
        // `mixed` and `null` already include null and reject the marker.
        let null_like =
            ty.name().eq_ignore_ascii_case("mixed") || ty.name().eq_ignore_ascii_case("null");
        if ty.is_nullable() && !null_like && !implied_by_default {
            formatted.push('?');
        }
        if !ty.is_builtin() {
            formatted.push('\\');
        }
        formatted.push_str(&resolved);

        Ok(formatted)
    }

    fn resolves(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.class.class_name())
            || self
                .class
                .parents
                .iter()
                .any(|p| p.trim_start_matches('\\').eq_ignore_ascii_case(name))
            || self.resolver.type_exists(name)
    }

    fn invalid(&self, parameter: Option<&ParameterDescriptor>) -> SignatureError {
        let class = self.class.declaring_class_of(self.method).to_string();
        let method = self.method.name.clone();
        match parameter {
            Some(p) => SignatureError::BadParameterType {
                class,
                method,
                parameter: p.name.clone(),
            },
            None => SignatureError::BadReturnType { class, method },
        }
    }
}
