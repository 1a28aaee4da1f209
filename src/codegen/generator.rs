//! The proxy generator.
//!
//! Renders a proxy unit for a class descriptor from the template and its
//! placeholders, then publishes it as a file or loads it in-process.

use super::fragments;
use super::naming::{self, ProxyName};
use super::shape::ClassShape;
use super::template::{self, DEFAULT_BASE_PROXY_INTERFACE, DEFAULT_PROXY_TEMPLATE, Placeholder};
use crate::config::ProxyConfig;
use crate::descriptor::{ClassDescriptor, MetadataSet, TypeRegistry, TypeResolver};
use crate::emit::{self, Emission, UnitRegistry};
use crate::error::{NotProxiableReason, ProxyError, ProxyResult};
use crate::runtime::ProxyUnit;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A rendered proxy, not yet emitted.
#[derive(Debug, Clone)]
pub struct RenderedUnit {
    pub name: ProxyName,
    pub code: String,
    pub unit: ProxyUnit,
}

/// Generates proxy classes for entity class descriptors.
///
/// Configuration is fixed once generation starts; rendering takes `&self`
/// and may run from several threads at once.
///
/// # Examples
///
/// ```
/// use entity_proxy::ProxyGenerator;
/// use entity_proxy::descriptor::ClassDescriptor;
///
/// let generator = ProxyGenerator::new("/tmp/proxies", "Proxies").unwrap();
/// let class = ClassDescriptor::builder().name("App\\Entity\\Tag").build();
///
/// let rendered = generator.render(&class).unwrap();
/// assert_eq!(rendered.name.fully_qualified(), "Proxies\\__CG__\\App\\Entity\\Tag");
/// assert!(rendered.code.contains("class Tag extends \\App\\Entity\\Tag"));
/// ```
pub struct ProxyGenerator {
    directory: PathBuf,
    namespace: String,
    template: String,
    placeholders: HashMap<String, Placeholder>,
    resolver: Arc<dyn TypeResolver>,
    registry: Arc<UnitRegistry>,
    skip_unchanged: bool,
}

impl ProxyGenerator {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(directory: P, namespace: S) -> ProxyResult<Self> {
        let directory = directory.into();
        let namespace = namespace.into();
        if directory.as_os_str().is_empty() {
            return Err(ProxyError::Configuration(
                "You must configure a proxy directory".to_string(),
            ));
        }
        if namespace.trim_matches('\\').is_empty() {
            return Err(ProxyError::Configuration(
                "You must configure a proxy namespace".to_string(),
            ));
        }

        let placeholders = HashMap::from([
            (
                "baseProxyInterface".to_string(),
                Placeholder::from(DEFAULT_BASE_PROXY_INTERFACE),
            ),
            ("additionalProperties".to_string(), Placeholder::from("")),
        ]);

        Ok(Self {
            directory,
            namespace,
            template: DEFAULT_PROXY_TEMPLATE.to_string(),
            placeholders,
            resolver: Arc::new(TypeRegistry::new()),
            registry: Arc::new(UnitRegistry::new()),
            skip_unchanged: false,
        })
    }

    pub fn from_config(config: &ProxyConfig) -> ProxyResult<Self> {
        let mut generator = Self::new(config.directory.clone(), config.namespace.clone())?;
        if let Some(template) = config.load_template()? {
            generator.set_proxy_class_template(template);
        }
        if let Some(interface) = &config.base_proxy_interface {
            generator.set_placeholder("baseProxyInterface", interface.as_str())?;
        }
        for (name, value) in &config.placeholders {
            generator.set_placeholder(name, value.as_str())?;
        }
        generator.set_skip_unchanged(config.skip_unchanged);
        Ok(generator)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registers a value for `<name>`, taking precedence over the built-in
    /// fragment of the same name.
    pub fn set_placeholder(&mut self, name: &str, placeholder: impl Into<Placeholder>) -> ProxyResult<()> {
        if !template::is_valid_placeholder_name(name) {
            return Err(ProxyError::InvalidPlaceholder {
                name: name.to_string(),
            });
        }
        self.placeholders.insert(name.to_string(), placeholder.into());
        Ok(())
    }

    pub fn set_proxy_class_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
    }

    /// Resolver consulted for every class or interface named in a signature.
    pub fn set_type_resolver(&mut self, resolver: Arc<dyn TypeResolver>) {
        self.resolver = resolver;
    }

    /// Registry receiving in-process loads.
    pub fn set_unit_registry(&mut self, registry: Arc<UnitRegistry>) {
        self.registry = registry;
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    pub fn set_skip_unchanged(&mut self, skip_unchanged: bool) {
        self.skip_unchanged = skip_unchanged;
    }

    /// Default proxy file of `class_name`, under `base_directory` or the
    /// configured directory.
    pub fn proxy_file_name(&self, class_name: &str, base_directory: Option<&Path>) -> PathBuf {
        naming::proxy_file_name(base_directory.unwrap_or(&self.directory), class_name)
    }

    pub fn verify_class_can_be_proxied(&self, class: &ClassDescriptor) -> ProxyResult<()> {
        let reason = if class.is_final {
            NotProxiableReason::Final
        } else if class.is_abstract {
            NotProxiableReason::Abstract
        } else {
            return Ok(());
        };
        Err(ProxyError::NotProxiable {
            class: class.class_name().to_string(),
            reason,
        })
    }

    /// Renders the proxy of `class` without emitting it.
    pub fn render(&self, class: &ClassDescriptor) -> ProxyResult<RenderedUnit> {
        self.render_with(class, self.resolver.as_ref())
    }

    fn render_with(&self, class: &ClassDescriptor, resolver: &dyn TypeResolver) -> ProxyResult<RenderedUnit> {
        let start = Instant::now();
        self.verify_class_can_be_proxied(class)?;

        let shape = ClassShape::extract(class, resolver)?;
        let name = ProxyName::for_class(class.class_name(), &self.namespace);

        let mut values = HashMap::new();
        for placeholder in template::placeholder_names(&self.template) {
            let value = match self.placeholders.get(&placeholder) {
                Some(registered) => registered.resolve(class),
                None => builtin(&placeholder, class, &shape, &name).ok_or_else(|| {
                    ProxyError::MissingPlaceholder {
                        name: placeholder.clone(),
                    }
                })?,
            };
            values.insert(placeholder, value);
        }
        let code = template::substitute(&self.template, &values);

        debug!(
            "ProxyGenerator: Rendered {} for {} in {:?}",
            name.fully_qualified(),
            class.class_name(),
            start.elapsed()
        );
        Ok(RenderedUnit {
            unit: ProxyUnit::from_shape(class, &shape, name.clone()),
            name,
            code,
        })
    }

    /// Generates the proxy of `class`.
    ///
    /// With a file name the unit is published there atomically; without one
    /// it is loaded into the unit registry unless already present.
    pub fn generate_proxy_class(
        &self,
        class: &ClassDescriptor,
        file_name: Option<&Path>,
    ) -> ProxyResult<Emission> {
        let rendered = self.render(class)?;
        self.emit(rendered, file_name)
    }

    fn emit(&self, rendered: RenderedUnit, file_name: Option<&Path>) -> ProxyResult<Emission> {
        match file_name {
            Some(path) => emit::write_atomically(path, &rendered.code, &self.directory, self.skip_unchanged),
            None => Ok(self.registry.load(rendered.unit, rendered.code)),
        }
    }

    /// Writes the proxy of every class in `set` to its default file, stopping
    /// at the first failure. Types named by the set count as resolvable.
    pub fn generate_proxy_classes(
        &self,
        set: &MetadataSet,
        base_directory: Option<&Path>,
    ) -> ProxyResult<Vec<Emission>> {
        self.generate_all(set, |class| Some(self.proxy_file_name(class.class_name(), base_directory)))
    }

    /// Loads the proxy of every class in `set` in-process.
    pub fn load_proxy_classes(&self, set: &MetadataSet) -> ProxyResult<Vec<Emission>> {
        self.generate_all(set, |_| None)
    }

    fn generate_all<F>(&self, set: &MetadataSet, target: F) -> ProxyResult<Vec<Emission>>
    where
        F: Fn(&ClassDescriptor) -> Option<PathBuf>,
    {
        let start = Instant::now();
        let known = set.type_registry();
        let resolver = Either {
            first: self.resolver.as_ref(),
            second: &known,
        };

        let mut emissions = Vec::with_capacity(set.classes.len());
        for class in &set.classes {
            let rendered = self.render_with(class, &resolver)?;
            emissions.push(self.emit(rendered, target(class).as_deref())?);
        }
        debug!(
            "ProxyGenerator: Generated {} proxies in {:?}",
            emissions.len(),
            start.elapsed()
        );
        Ok(emissions)
    }
}

impl std::fmt::Debug for ProxyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyGenerator")
            .field("directory", &self.directory)
            .field("namespace", &self.namespace)
            .field("placeholders", &self.placeholders)
            .field("skip_unchanged", &self.skip_unchanged)
            .finish_non_exhaustive()
    }
}

struct Either<'a> {
    first: &'a dyn TypeResolver,
    second: &'a dyn TypeResolver,
}

impl TypeResolver for Either<'_> {
    fn type_exists(&self, name: &str) -> bool {
        self.first.type_exists(name) || self.second.type_exists(name)
    }
}

fn builtin(name: &str, class: &ClassDescriptor, shape: &ClassShape, proxy: &ProxyName) -> Option<String> {
    let code = match name {
        "namespace" => proxy.namespace.clone(),
        "proxyShortClassName" => proxy.short_name.clone(),
        "className" => class.class_name().to_string(),
        "lazyPropertiesNames" => fragments::lazy_properties_names(shape),
        "lazyPropertiesDefaults" => fragments::lazy_properties_defaults(shape),
        "constructorImpl" => fragments::constructor_impl(shape),
        "magicGet" => fragments::magic_get(shape),
        "magicSet" => fragments::magic_set(shape),
        "magicIsset" => fragments::magic_isset(shape),
        "sleepImpl" => fragments::sleep_impl(shape),
        "wakeupImpl" => fragments::wakeup_impl(shape, &proxy.short_name),
        "cloneImpl" => fragments::clone_impl(shape),
        "methods" => fragments::methods(shape),
        _ => return None,
    };
    Some(code)
}
