//! Output emission.
//!
//! A rendered proxy unit is either published as a file or loaded into the
//! in-process [`UnitRegistry`]. File publication writes the complete unit to
//! a temporary sibling and renames it over the final name, so readers never
//! observe a partially written proxy.

use crate::error::{ProxyError, ProxyResult};
use crate::runtime::ProxyUnit;
use log::{debug, trace};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Outcome of emitting one proxy unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// The unit was published at this path.
    Written(PathBuf),
    /// The file at this path already held identical content.
    Unchanged(PathBuf),
    /// The unit was registered in-process under this proxy class name.
    Loaded(String),
    /// A unit with this proxy class name was already registered.
    AlreadyLoaded(String),
}

impl Emission {
    /// Whether this emission produced new output.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Written(_) | Self::Loaded(_))
    }
}

/// blake3 digest of a rendered unit, hex encoded.
pub fn content_hash(code: &str) -> String {
    blake3::hash(code.as_bytes()).to_hex().to_string()
}

/// Creates `parent` if needed and checks that it accepts new files.
/// Failures are reported against `reported`, the configured proxy directory.
fn ensure_directory(parent: &Path, reported: &Path) -> ProxyResult<()> {
    if !parent.is_dir() {
        create_dir_all(parent).map_err(|e| ProxyError::OutputUnwritable {
            directory: reported.to_path_buf(),
            source: Some(e),
        })?;
        debug!("Emit: Created proxy directory {}", parent.display());
    }

    let metadata = fs::metadata(parent).map_err(|e| ProxyError::OutputUnwritable {
        directory: reported.to_path_buf(),
        source: Some(e),
    })?;
    if metadata.permissions().readonly() {
        return Err(ProxyError::unwritable(reported));
    }
    Ok(())
}

#[cfg(unix)]
fn create_dir_all(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o775).create(path)
}

#[cfg(not(unix))]
fn create_dir_all(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

/// Publishes `code` at `path` atomically.
///
/// With `skip_unchanged`, an existing file whose content hash equals the
/// rendered unit's is left untouched.
pub fn write_atomically(
    path: &Path,
    code: &str,
    reported_directory: &Path,
    skip_unchanged: bool,
) -> ProxyResult<Emission> {
    let start = Instant::now();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_directory(parent, reported_directory)?;

    if skip_unchanged {
        if let Ok(existing) = fs::read(path) {
            if blake3::hash(&existing) == blake3::hash(code.as_bytes()) {
                debug!("Emit: {} is up to date", path.display());
                return Ok(Emission::Unchanged(path.to_path_buf()));
            }
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let unwritable = |e: std::io::Error| ProxyError::OutputUnwritable {
        directory: reported_directory.to_path_buf(),
        source: Some(e),
    };
    let mut temporary = tempfile::Builder::new()
        .prefix(&format!("{file_name}."))
        .tempfile_in(parent)
        .map_err(unwritable)?;
    trace!("Emit: Writing {}", temporary.path().display());

    temporary.write_all(code.as_bytes()).map_err(unwritable)?;
    temporary.flush().map_err(unwritable)?;
    set_file_mode(temporary.path());

    // a failed persist drops the temporary file with the error
    temporary.persist(path).map_err(|e| unwritable(e.error))?;
    debug!("Emit: Published {} in {:?}", path.display(), start.elapsed());
    Ok(Emission::Written(path.to_path_buf()))
}

#[cfg(unix)]
fn set_file_mode(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o664)) {
        trace!("Emit: Could not set mode of {}: {e}", path.display());
    }
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path) {}

/// A proxy unit loaded in-process.
#[derive(Debug, Clone)]
pub struct LoadedUnit {
    pub unit: Arc<ProxyUnit>,
    pub code: Arc<str>,
    pub content_hash: String,
}

/// Units loaded in-process, keyed by fully-qualified proxy class name.
///
/// A name is loaded at most once; later loads of the same name are no-ops.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: RwLock<HashMap<String, LoadedUnit>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `unit` unless its proxy class is already loaded.
    pub fn load(&self, unit: ProxyUnit, code: String) -> Emission {
        let name = unit.proxy_name.fully_qualified().trim_start_matches('\\').to_string();
        let mut units = self.units.write().unwrap_or_else(PoisonError::into_inner);
        if units.contains_key(&name) {
            debug!("UnitRegistry: {name} already loaded");
            return Emission::AlreadyLoaded(name);
        }

        let loaded = LoadedUnit {
            content_hash: content_hash(&code),
            unit: Arc::new(unit),
            code: Arc::from(code),
        };
        debug!("UnitRegistry: Loaded {name} ({})", loaded.content_hash);
        units.insert(name.clone(), loaded);
        Emission::Loaded(name)
    }

    pub fn is_loaded(&self, proxy_class: &str) -> bool {
        self.read().contains_key(proxy_class.trim_start_matches('\\'))
    }

    pub fn get(&self, proxy_class: &str) -> Option<LoadedUnit> {
        self.read().get(proxy_class.trim_start_matches('\\')).cloned()
    }

    /// The loaded unit of `proxy_class`, ready to back proxy instances.
    pub fn unit(&self, proxy_class: &str) -> Option<Arc<ProxyUnit>> {
        self.get(proxy_class).map(|loaded| loaded.unit)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Loaded proxy class names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, LoadedUnit>> {
        self.units.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::naming::ProxyName;
    use assert_matches::assert_matches;

    fn unit(class: &str) -> ProxyUnit {
        ProxyUnit::builder()
            .class_name(class)
            .proxy_name(ProxyName::for_class(class, "Proxies"))
            .build()
    }

    #[test_log::test]
    fn test_write_creates_directory_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/__CG__Foo.php");

        let emission = write_atomically(&target, "<?php // foo", dir.path(), false).unwrap();
        assert_eq!(emission, Emission::Written(target.clone()));
        assert_eq!(fs::read_to_string(&target).unwrap(), "<?php // foo");

        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != "__CG__Foo.php")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("__CG__Foo.php");
        write_atomically(&target, "x", dir.path(), false).unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o664);
    }

    #[test]
    fn test_skip_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("__CG__Foo.php");

        write_atomically(&target, "a", dir.path(), true).unwrap();
        assert_matches!(
            write_atomically(&target, "a", dir.path(), true),
            Ok(Emission::Unchanged(_))
        );
        assert_matches!(
            write_atomically(&target, "b", dir.path(), true),
            Ok(Emission::Written(_))
        );
        assert_matches!(
            write_atomically(&target, "b", dir.path(), false),
            Ok(Emission::Written(_))
        );
    }

    #[test]
    fn test_unwritable_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        assert_matches!(
            write_atomically(&blocker.join("__CG__Foo.php"), "x", &blocker, false),
            Err(ProxyError::OutputUnwritable { directory, .. }) if directory == blocker
        );
    }

    #[test]
    fn test_failed_publish_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("__CG__Foo.php");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupied"), "").unwrap();

        assert_matches!(
            write_atomically(&target, "<?php // foo", dir.path(), false),
            Err(ProxyError::OutputUnwritable { directory, source: Some(_) }) if directory == dir.path()
        );
        assert!(target.is_dir());
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("__CG__Foo.php")]);
    }

    #[test]
    fn test_registry_loads_once() {
        let registry = UnitRegistry::new();
        assert!(registry.is_empty());

        let first = registry.load(unit("Shop\\Order"), "<?php a".into());
        assert_eq!(first, Emission::Loaded("Proxies\\__CG__\\Shop\\Order".into()));
        let second = registry.load(unit("Shop\\Order"), "<?php b".into());
        assert_eq!(second, Emission::AlreadyLoaded("Proxies\\__CG__\\Shop\\Order".into()));

        let loaded = registry.get("\\Proxies\\__CG__\\Shop\\Order").unwrap();
        assert_eq!(&*loaded.code, "<?php a");
        assert_eq!(loaded.content_hash, content_hash("<?php a"));
        assert_eq!(registry.len(), 1);
        assert!(first.is_fresh());
        assert!(!second.is_fresh());
    }
}
