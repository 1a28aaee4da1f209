//! Descriptor validator
//!
//! Structural sanity checks for descriptors loaded from files. Descriptors
//! built in code are trusted as-is; file input goes through
//! [`validate_class_descriptor`] before it reaches the generator.

use super::class::ClassDescriptor;
use std::collections::HashSet;

/// Validation result
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub member: Option<String>,
    pub error_type: ValidationErrorType,
}

/// Validation error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorType {
    EmptyName,
    DuplicateMember,
    MisplacedVariadic,
    UnknownIdentifier,
    ConflictingModifiers,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(
        &mut self,
        message: String,
        member: Option<String>,
        error_type: ValidationErrorType,
    ) {
        self.errors.push(ValidationError {
            message,
            member,
            error_type,
        });
    }

    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// All error messages on one line.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate a class descriptor
pub fn validate_class_descriptor(class: &ClassDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();

    if class.class_name().is_empty() {
        result.add_error(
            "Class name cannot be empty".to_string(),
            None,
            ValidationErrorType::EmptyName,
        );
    }

    if class.is_final && class.is_abstract {
        result.add_error(
            format!("Class '{}' cannot be both final and abstract", class.class_name()),
            None,
            ValidationErrorType::ConflictingModifiers,
        );
    }

    validate_properties(class, &mut result);
    validate_methods(class, &mut result);
    validate_mapping(class, &mut result);

    result
}

fn validate_properties(class: &ClassDescriptor, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for property in &class.properties {
        if property.name.is_empty() {
            result.add_error(
                format!("Class '{}' declares a property without a name", class.class_name()),
                None,
                ValidationErrorType::EmptyName,
            );
        } else if !seen.insert((class.owner_of(property), property.name.as_str())) {
            result.add_error(
                format!("Duplicate property: {}", property.name),
                Some(property.name.clone()),
                ValidationErrorType::DuplicateMember,
            );
        }
    }
}

fn validate_methods(class: &ClassDescriptor, result: &mut ValidationResult) {
    for method in &class.methods {
        if method.name.is_empty() {
            result.add_error(
                format!("Class '{}' declares a method without a name", class.class_name()),
                None,
                ValidationErrorType::EmptyName,
            );
            continue;
        }

        let mut parameter_names = HashSet::new();
        let last = method.parameters.len().saturating_sub(1);
        for (i, parameter) in method.parameters.iter().enumerate() {
            if !parameter_names.insert(parameter.name.as_str()) {
                result.add_error(
                    format!(
                        "Duplicate parameter '{}' in method {}",
                        parameter.name, method.name
                    ),
                    Some(format!("{}.{}", method.name, parameter.name)),
                    ValidationErrorType::DuplicateMember,
                );
            }
            if parameter.variadic && i != last {
                result.add_error(
                    format!(
                        "Variadic parameter '{}' must be the last parameter of {}",
                        parameter.name, method.name
                    ),
                    Some(format!("{}.{}", method.name, parameter.name)),
                    ValidationErrorType::MisplacedVariadic,
                );
            }
        }
    }
}

fn validate_mapping(class: &ClassDescriptor, result: &mut ValidationResult) {
    for id in &class.identifier {
        if !class.has_field(id) && !class.has_association(id) {
            result.add_error(
                format!("Identifier '{id}' is neither a mapped field nor an association"),
                Some(id.clone()),
                ValidationErrorType::UnknownIdentifier,
            );
        }
    }

    let mapped = class
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .chain(class.associations.iter().map(String::as_str));
    for name in mapped {
        if class.property(name).is_none() {
            result.add_warning(format!(
                "Mapped member '{name}' has no declared property on '{}'",
                class.class_name()
            ));
        }
    }
}
