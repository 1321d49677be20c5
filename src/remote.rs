//! Remote collaborator seams
//!
//! The core talks to the vendor through two narrow traits so the upload
//! lifecycle, registry, and session can be driven by a simulated store in
//! tests. The state vocabulary is the explicit `AssetState` enum; nothing
//! here depends on vendor field names.

use std::path::Path;

use crate::error::StorycheckResult;
use crate::models::{GenerationSettings, RemoteFile};

/// Abstract remote asset store
///
/// The store is shared global state: entries may be added or removed by
/// other processes at any time, so `list` must always be a fresh read.
pub trait RemoteStore {
    /// Hand a local blob to the store; returns the store's record for it
    fn upload(&self, path: &Path, display_name: &str) -> StorycheckResult<RemoteFile>;

    /// Fresh state report for a stored entry
    fn poll(&self, id: &str) -> StorycheckResult<RemoteFile>;

    /// Fresh listing of every entry currently in the store
    fn list(&self) -> StorycheckResult<Vec<RemoteFile>>;

    /// Remove one entry from the store
    fn delete(&self, id: &str) -> StorycheckResult<()>;
}

/// Abstract text generation service
pub trait Generator {
    /// Generate review text for a fully composed prompt
    fn generate(&self, prompt: &str, settings: &GenerationSettings) -> StorycheckResult<String>;
}
