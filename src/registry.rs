//! Session asset registry
//!
//! Tracks every archive uploaded in a session, drives uploads through the
//! lifecycle in caller order (order defines the 1-based placeholder
//! indices), and performs bulk listing and deletion against the remote
//! store. The store is shared global state, so listings are always fresh
//! reads and bulk deletion affects entries from any session - an
//! intentional, destructive capability surfaced as the `purge` command.

use std::path::PathBuf;

use crate::error::StorycheckResult;
use crate::models::{AssetHandle, AssetState, CleanupReport, RemoteFile};
use crate::remote::RemoteStore;
use crate::upload::{RetryPolicy, UploadEvent, UploadLifecycle};

/// Owns the session's asset handles and the upload lifecycle
pub struct AssetRegistry<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    retry: RetryPolicy,
    handles: Vec<AssetHandle>,
}

impl<'a, S: RemoteStore + ?Sized> AssetRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_retry(store, RetryPolicy::default())
    }

    pub fn with_retry(store: &'a S, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            handles: Vec::new(),
        }
    }

    /// Handles registered so far, in upload order
    pub fn handles(&self) -> &[AssetHandle] {
        &self.handles
    }

    /// Upload archives one at a time, in the given order
    ///
    /// Short-circuits on the first failure. Nothing is rolled back: any
    /// handle that already received a remote id stays tracked so the
    /// cleanup pass can delete it, including the one whose poll failed.
    pub fn register_many(
        &mut self,
        paths: &[PathBuf],
        limit_bytes: u64,
        on_event: &dyn Fn(&UploadEvent),
    ) -> StorycheckResult<()> {
        let lifecycle = UploadLifecycle::with_retry(self.store, self.retry);
        for path in paths {
            let handle = lifecycle.start(path, limit_bytes, on_event)?;
            self.handles.push(handle);
            let index = self.handles.len() - 1;
            lifecycle.await_active(&mut self.handles[index], on_event)?;
        }
        Ok(())
    }

    /// Fresh listing of every entry currently in the store
    pub fn list_all(&self) -> StorycheckResult<Vec<RemoteFile>> {
        self.store.list()
    }

    /// Delete every entry currently in the store, whoever uploaded it
    ///
    /// One failing deletion never stops the rest; the report carries the
    /// per-entry outcomes.
    pub fn delete_all(&self) -> StorycheckResult<CleanupReport> {
        let mut report = CleanupReport::default();
        for entry in self.store.list()? {
            let label = entry.display_name.clone().unwrap_or_else(|| entry.id.clone());
            match self.store.delete(&entry.id) {
                Ok(()) => report.deleted.push(label),
                Err(e) => report.failed.push((label, e.to_string())),
            }
        }
        Ok(report)
    }

    /// Delete only the handles this session registered
    ///
    /// Per-handle failures are recorded, never raised, so one stuck entry
    /// cannot block the others. The caller follows up with `list_all` to
    /// audit what is actually left in the store.
    pub fn cleanup_session(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for handle in &mut self.handles {
            let Some(id) = handle.remote_id().map(str::to_string) else {
                continue;
            };
            if handle.state() == AssetState::Deleted {
                continue;
            }
            match self.store.delete(&id) {
                Ok(()) => {
                    handle.mark_deleted();
                    report.deleted.push(handle.display_name.clone());
                }
                Err(e) => {
                    report
                        .failed
                        .push((handle.display_name.clone(), e.to_string()));
                }
            }
        }
        report
    }
}
