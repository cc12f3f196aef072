// crates/lyt-runtime/src/package.rs
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::Result;

/// Variant requested when the caller does not name one.
pub const DEFAULT_VARIANT: u32 = 0x30000;

/// Where layout archives come from.
///
/// Ids are assigned by the source and are stable for its lifetime.
pub trait PackageSource {
    fn layout_id(&self, name: &str) -> Option<u32>;

    fn layout_name(&self, id: u32) -> Option<&str>;

    /// Archive bytes for a layout, or `None` if it is unknown or its package is not loaded.
    fn layout_archive(&self, id: u32, variant: u32) -> Option<Cow<'_, [u8]>>;

    fn package_id(&self, _name: &str) -> Option<u32> {
        None
    }

    fn load_package(&mut self, _id: u32) -> bool {
        false
    }

    fn unload_package(&mut self, _id: u32) -> bool {
        false
    }

    fn is_loading(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct LayoutEntry {
    name: String,
    package: Option<u32>,
    variants: BTreeMap<u32, Vec<u8>>,
}

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    loaded: bool,
}

/// In-memory archives grouped into optional packages.
///
/// Layouts added without a package are always available. Loading is
/// synchronous, so `is_loading` never reports true.
#[derive(Debug, Clone, Default)]
pub struct MemoryPackage {
    layouts: Vec<LayoutEntry>,
    packages: Vec<PackageEntry>,
}

impl MemoryPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layout(&mut self, name: impl Into<String>, archive: Vec<u8>) -> u32 {
        self.push_layout(name.into(), None, archive)
    }

    pub fn add_package(&mut self, name: impl Into<String>) -> u32 {
        self.packages.push(PackageEntry {
            name: name.into(),
            loaded: false,
        });
        self.packages.len() as u32 - 1
    }

    /// Add a layout that only resolves while `package` is loaded.
    pub fn add_package_layout(&mut self, package: u32, name: impl Into<String>, archive: Vec<u8>) -> Option<u32> {
        self.packages.get(package as usize)?;
        Some(self.push_layout(name.into(), Some(package), archive))
    }

    /// Register an alternative archive for an existing layout.
    pub fn add_variant(&mut self, id: u32, variant: u32, archive: Vec<u8>) -> bool {
        match self.layouts.get_mut(id as usize) {
            Some(entry) => {
                entry.variants.insert(variant, archive);
                true
            }
            None => false,
        }
    }

    pub fn is_package_loaded(&self, id: u32) -> bool {
        self.packages.get(id as usize).is_some_and(|p| p.loaded)
    }

    fn push_layout(&mut self, name: String, package: Option<u32>, archive: Vec<u8>) -> u32 {
        let mut variants = BTreeMap::new();
        variants.insert(DEFAULT_VARIANT, archive);
        self.layouts.push(LayoutEntry { name, package, variants });
        self.layouts.len() as u32 - 1
    }

    fn set_loaded(&mut self, id: u32, loaded: bool) -> bool {
        match self.packages.get_mut(id as usize) {
            Some(package) => {
                debug!("Package '{}' loaded: {}", package.name, loaded);
                package.loaded = loaded;
                true
            }
            None => false,
        }
    }
}

impl PackageSource for MemoryPackage {
    fn layout_id(&self, name: &str) -> Option<u32> {
        self.layouts.iter().position(|l| l.name == name).map(|i| i as u32)
    }

    fn layout_name(&self, id: u32) -> Option<&str> {
        self.layouts.get(id as usize).map(|l| l.name.as_str())
    }

    /// Falls back to the default variant when `variant` has no archive of its own.
    fn layout_archive(&self, id: u32, variant: u32) -> Option<Cow<'_, [u8]>> {
        let entry = self.layouts.get(id as usize)?;
        if let Some(package) = entry.package {
            if !self.is_package_loaded(package) {
                debug!("Layout '{}' requested while its package is unloaded", entry.name);
                return None;
            }
        }
        entry
            .variants
            .get(&variant)
            .or_else(|| entry.variants.get(&DEFAULT_VARIANT))
            .map(|bytes| Cow::Borrowed(bytes.as_slice()))
    }

    fn package_id(&self, name: &str) -> Option<u32> {
        self.packages.iter().position(|p| p.name == name).map(|i| i as u32)
    }

    fn load_package(&mut self, id: u32) -> bool {
        self.set_loaded(id, true)
    }

    fn unload_package(&mut self, id: u32) -> bool {
        self.set_loaded(id, false)
    }
}

/// A directory holding one `*.lyt` archive per layout.
///
/// Ids follow sorted file-name order and names are file stems. Files are
/// read on every request; variants are not distinguished.
#[derive(Debug, Clone)]
pub struct DirPackage {
    root: PathBuf,
    entries: Vec<(String, PathBuf)>,
}

impl DirPackage {
    pub const EXTENSION: &'static str = "lyt";

    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        let mut paths = Vec::new();
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == Self::EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let entries = paths
            .into_iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_string();
                Some((stem, path))
            })
            .collect::<Vec<_>>();
        debug!("Found {} layouts in {}", entries.len(), root.display());
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PackageSource for DirPackage {
    fn layout_id(&self, name: &str) -> Option<u32> {
        self.entries.iter().position(|(n, _)| n == name).map(|i| i as u32)
    }

    fn layout_name(&self, id: u32) -> Option<&str> {
        self.entries.get(id as usize).map(|(n, _)| n.as_str())
    }

    fn layout_archive(&self, id: u32, _variant: u32) -> Option<Cow<'_, [u8]>> {
        let (_, path) = self.entries.get(id as usize)?;
        match fs::read(path) {
            Ok(bytes) => Some(Cow::Owned(bytes)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }
}
