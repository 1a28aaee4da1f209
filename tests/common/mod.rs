// Common test utilities and fixtures

#![allow(dead_code)]

use entity_proxy::descriptor::{ClassDescriptor, MetadataSet, parse_metadata_set};
use entity_proxy::{ProxyGenerator, ProxyResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Path of a fixture file under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The shop metadata set
pub fn shop() -> MetadataSet {
    parse_metadata_set(fixture("shop.toml")).expect("shop fixture parses")
}

/// One class of the shop metadata set
pub fn shop_class(name: &str) -> ClassDescriptor {
    shop()
        .class(name)
        .cloned()
        .unwrap_or_else(|| panic!("no class {name} in shop fixture"))
}

/// Generator writing into `directory` that resolves every type the shop
/// fixture names
pub fn shop_generator(directory: &Path) -> ProxyResult<ProxyGenerator> {
    let mut generator = ProxyGenerator::new(directory, "Shop\\Proxies")?;
    generator.set_type_resolver(Arc::new(shop().type_registry()));
    Ok(generator)
}
