//! A single file-backed resource and its reference-counted cache.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::http::mime;

#[derive(Debug)]
pub enum ResourceError {
    /// No resource is registered under the requested name.
    NotFound(String),
    /// The backing file could not be read at acquisition time.
    Unavailable { name: String, source: std::io::Error },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound(name) => write!(f, "resource {} not found", name),
            ResourceError::Unavailable { name, source } => {
                write!(f, "resource {} unavailable: {}", name, source)
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::NotFound(_) => None,
            ResourceError::Unavailable { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    data: Option<Bytes>,
    refs: usize,
}

/// Point-in-time view of a resource's cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStats {
    pub name: String,
    pub refs: usize,
    pub cached_bytes: usize,
}

/// A static payload served under a logical name.
///
/// The file is read on the first acquisition and kept while at least one
/// lease is outstanding; the last release drops the cached bytes. All cache
/// transitions happen under this resource's own lock, so acquiring one
/// resource never waits on another.
#[derive(Debug)]
pub struct Resource {
    name: String,
    location: PathBuf,
    content_type: &'static str,
    state: Mutex<CacheState>,
}

impl Resource {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            content_type: mime::content_type_for(&name),
            name,
            location: location.into(),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Takes a reference, loading the file if nothing is cached.
    ///
    /// On a load failure the reference count is left untouched.
    pub async fn acquire(self: &Arc<Self>) -> Result<ResourceLease, ResourceError> {
        let mut state = self.state.lock().await;

        let data = match state.data.clone() {
            Some(data) => data,
            None => {
                let data = tokio::fs::read(&self.location)
                    .await
                    .map(Bytes::from)
                    .map_err(|source| ResourceError::Unavailable {
                        name: self.name.clone(),
                        source,
                    })?;
                tracing::debug!(resource = %self.name, bytes = data.len(), "Resource loaded");
                state.data = Some(data.clone());
                data
            }
        };
        state.refs += 1;

        Ok(ResourceLease {
            resource: Arc::clone(self),
            data,
            released: false,
        })
    }

    async fn release_one(&self) {
        let mut state = self.state.lock().await;
        self.release_locked(&mut state);
    }

    fn release_locked(&self, state: &mut CacheState) {
        state.refs = state.refs.saturating_sub(1);
        if state.refs == 0 && state.data.take().is_some() {
            tracing::debug!(resource = %self.name, "Resource cache released");
        }
    }

    pub async fn ref_count(&self) -> usize {
        self.state.lock().await.refs
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.data.is_some()
    }

    pub async fn stats(&self) -> ResourceStats {
        let state = self.state.lock().await;
        ResourceStats {
            name: self.name.clone(),
            refs: state.refs,
            cached_bytes: state.data.as_ref().map_or(0, |d| d.len()),
        }
    }
}

/// One outstanding acquisition of a [`Resource`].
///
/// The bytes stay valid for the lease's whole lifetime. Call
/// [`ResourceLease::release`]; a lease dropped without it is released in
/// place, or on the runtime when the lock is contended.
#[derive(Debug)]
pub struct ResourceLease {
    resource: Arc<Resource>,
    data: Bytes,
    released: bool,
}

impl ResourceLease {
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> &'static str {
        self.resource.content_type()
    }

    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }

    pub async fn release(mut self) {
        self.released = true;
        self.resource.release_one().await;
    }
}

impl Drop for ResourceLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Ok(mut state) = self.resource.state.try_lock() {
            self.resource.release_locked(&mut state);
            return;
        }
        let resource = Arc::clone(&self.resource);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { resource.release_one().await });
            }
            Err(_) => {
                tracing::warn!(resource = %resource.name(), "Lease dropped outside a runtime; reference leaked");
            }
        }
    }
}
