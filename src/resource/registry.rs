//! Name → resource lookup, built once from a directory tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::http::headers::CiString;
use crate::resource::file::{Resource, ResourceError, ResourceLease, ResourceStats};

/// Registry of servable resources plus the alias table consulted before it.
///
/// Built during single-threaded startup. After the server starts it is only
/// read; each resource's cache carries its own lock.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: HashMap<CiString, Arc<Resource>>,
    proxies: HashMap<CiString, CiString>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every regular file below `root`.
    ///
    /// Fails when `root` itself cannot be listed; unreadable sub-directories
    /// are logged and skipped.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut files = Vec::new();

        let entries = fs::read_dir(root)
            .with_context(|| format!("failed to read resource directory {}", root.display()))?;
        collect_files(entries, "", &mut files);

        let mut registry = Self::new();
        for (name, location) in files {
            registry.register(name, location);
        }

        tracing::info!(root = %root.display(), count = registry.len(), "Registered resources");
        Ok(registry)
    }

    /// Registers `location` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, location: impl Into<PathBuf>) {
        let resource = Resource::new(name, location);
        tracing::debug!(
            resource = resource.name(),
            location = %resource.location().display(),
            content_type = resource.content_type(),
            "Registered resource"
        );
        self.resources
            .insert(CiString::new(resource.name()), Arc::new(resource));
    }

    /// Serves `to` whenever `from` is requested.
    pub fn add_proxy(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let (from, to) = (CiString::new(from), CiString::new(to));
        tracing::info!(from = %from, to = %to, "Created resource proxy");
        self.proxies.insert(from, to);
    }

    /// Resolves aliases, then looks the name up.
    pub fn find(&self, path: &str) -> Option<Arc<Resource>> {
        let key = CiString::from(path);
        let actual = self.proxies.get(&key).unwrap_or(&key);
        self.resources.get(actual).cloned()
    }

    /// Finds `path` and takes a lease on it.
    pub async fn acquire(&self, path: &str) -> Result<ResourceLease, ResourceError> {
        let resource = self
            .find(path)
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))?;
        resource.acquire().await
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Cache statistics for every resource, sorted by name.
    pub async fn stats(&self) -> Vec<ResourceStats> {
        let mut stats = Vec::with_capacity(self.resources.len());
        for resource in self.resources.values() {
            stats.push(resource.stats().await);
        }
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}

fn collect_files(entries: fs::ReadDir, prefix: &str, out: &mut Vec<(String, PathBuf)>) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(prefix, error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
        let path = entry.path();

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping entry with unknown type");
                continue;
            }
        };

        if file_type.is_dir() {
            match fs::read_dir(&path) {
                Ok(children) => collect_files(children, &name, out),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable directory");
                }
            }
        } else if file_type.is_file() {
            out.push((name, path));
        }
    }
}
