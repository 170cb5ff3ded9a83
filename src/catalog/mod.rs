//! Layer catalog: discovers reference layer files in a storage root.
//!
//! The catalog is rebuilt on every call so layers can be dropped into or
//! removed from the directory without a restart.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Default storage root for layer files
pub const DEFAULT_LAYERS_DIR: &str = "couche";

/// Default layer file extension
pub const DEFAULT_EXTENSION: &str = "geojson";

/// One catalogued layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Normalized layer name -> storage location, in enumeration order
#[derive(Debug, Clone, Default)]
pub struct LayerCatalog {
    entries: Vec<LayerEntry>,
    positions: HashMap<String, usize>,
}

/// Derive the layer identifier from a file path: strip the extension,
/// replace spaces with underscores.
pub fn normalize_layer_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    Some(stem.replace(' ', "_"))
}

impl LayerCatalog {
    /// Scan the top level of `root` for files ending in `.{extension}`.
    ///
    /// A missing root yields an empty catalog. File contents are not
    /// inspected here.
    pub fn scan<P: AsRef<Path>>(root: P, extension: &str) -> Self {
        let root = root.as_ref();
        let mut catalog = Self::default();

        if !root.is_dir() {
            warn!("Layer directory not found: {}", root.display());
            return catalog;
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                    continue;
                }
            };
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e == extension);
            if !matches {
                continue;
            }

            match normalize_layer_name(path) {
                Some(name) => catalog.insert(name, path.to_path_buf()),
                None => warn!("Skipping layer file with non UTF-8 name: {}", path.display()),
            }
        }

        debug!(
            "Catalogued {} layers from {}",
            catalog.len(),
            root.display()
        );
        catalog
    }

    /// Insert a layer. A name already present keeps its position but takes
    /// the new location.
    pub fn insert(&mut self, name: String, path: PathBuf) {
        if let Some(&idx) = self.positions.get(&name) {
            let previous = &mut self.entries[idx];
            warn!(
                "Layer name collision for '{}': {} replaces {}",
                name,
                path.display(),
                previous.path.display()
            );
            previous.path = path;
            return;
        }
        self.positions.insert(name.clone(), self.entries.len());
        self.entries.push(LayerEntry { name, path });
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.positions
            .get(name)
            .map(|&idx| self.entries[idx].path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
