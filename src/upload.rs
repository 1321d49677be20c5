//! Remote-asset upload lifecycle
//!
//! Drives a single archive from submission to a terminal state: hand the
//! blob to the store, then poll until the store reports it usable
//! (`Active`), permanently failed (`Failed`), or the poll bound runs out
//! (`UploadTimeout`, distinct from `Failed` so callers can tell "the store
//! rejected it" from "the store never finished in time").
//!
//! Transitions are surfaced through an event callback for console output,
//! but the lifecycle reaches its terminal state purely from store responses
//! and the retry bound - nothing depends on anyone observing it.

use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::{StorycheckError, StorycheckResult};
use crate::fs;
use crate::models::{AssetHandle, AssetState};
use crate::remote::RemoteStore;

/// Maximum number of poll attempts before declaring a timeout
pub const MAX_UPLOAD_RETRIES: usize = 60;

/// Fixed delay between poll attempts
pub const UPLOAD_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll bound and spacing for an upload lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_UPLOAD_RETRIES,
            delay: UPLOAD_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Zero-delay policy for tests and simulations
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Observable lifecycle transitions
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Blob handed to the store; an identifier was assigned
    Submitted { name: String, id: String },
    /// One poll completed with the given reported state
    Polled {
        name: String,
        state: AssetState,
        attempt: usize,
    },
    /// Entry became usable; a locator is available
    Activated { name: String, uri: String },
    /// Local digest disagrees with the store-reported digest
    ChecksumMismatch {
        name: String,
        local: String,
        remote: String,
    },
    /// Store reported the upload as permanently failed
    Failed { name: String },
    /// Poll bound exhausted without a terminal report
    TimedOut { name: String, attempts: usize },
}

/// Drives one archive through the upload state machine
pub struct UploadLifecycle<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    retry: RetryPolicy,
}

impl<'a, S: RemoteStore + ?Sized> UploadLifecycle<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(store: &'a S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Upload one archive and drive it to a terminal state
    ///
    /// Convenience over `start` + `await_active` for callers that do not
    /// need to keep a failed handle around. The registry uses the split
    /// form so a handle that timed out stays tracked for cleanup.
    pub fn submit(
        &self,
        path: &Path,
        limit_bytes: u64,
        on_event: &dyn Fn(&UploadEvent),
    ) -> StorycheckResult<AssetHandle> {
        let mut handle = self.start(path, limit_bytes, on_event)?;
        self.await_active(&mut handle, on_event)?;
        Ok(handle)
    }

    /// Validate the archive and hand it to the store
    ///
    /// Returns a `Submitted` handle carrying the store-assigned id. An
    /// error here means nothing was stored remotely.
    pub fn start(
        &self,
        path: &Path,
        limit_bytes: u64,
        on_event: &dyn Fn(&UploadEvent),
    ) -> StorycheckResult<AssetHandle> {
        fs::validate_archive(path, limit_bytes)?;
        let mut handle = AssetHandle::new(path);
        let remote = self.store.upload(path, &handle.display_name)?;
        handle.assign_remote(remote.id.clone());
        on_event(&UploadEvent::Submitted {
            name: handle.display_name.clone(),
            id: remote.id,
        });
        Ok(handle)
    }

    /// Poll until the handle reaches a terminal state or the bound runs out
    ///
    /// On `UploadFailed` and `UploadTimeout` the handle keeps its remote id
    /// so the entry stays reachable for cleanup.
    pub fn await_active(
        &self,
        handle: &mut AssetHandle,
        on_event: &dyn Fn(&UploadEvent),
    ) -> StorycheckResult<()> {
        let id = handle
            .remote_id()
            .ok_or_else(|| StorycheckError::UploadFailed {
                name: handle.display_name.clone(),
                reason: "no remote identifier was assigned".to_string(),
            })?
            .to_string();

        for attempt in 1..=self.retry.max_attempts {
            let remote = self.store.poll(&id)?;
            on_event(&UploadEvent::Polled {
                name: handle.display_name.clone(),
                state: remote.state,
                attempt,
            });

            match remote.state {
                AssetState::Active => {
                    let uri = remote.uri.ok_or_else(|| StorycheckError::UploadFailed {
                        name: handle.display_name.clone(),
                        reason: "store reported ACTIVE without a URI".to_string(),
                    })?;
                    handle.mark_active(uri.clone());
                    on_event(&UploadEvent::Activated {
                        name: handle.display_name.clone(),
                        uri,
                    });
                    self.verify_checksum(handle, remote.sha256.as_deref(), on_event);
                    return Ok(());
                }
                AssetState::Failed => {
                    handle.mark_failed();
                    on_event(&UploadEvent::Failed {
                        name: handle.display_name.clone(),
                    });
                    return Err(StorycheckError::UploadFailed {
                        name: handle.display_name.clone(),
                        reason: "remote store reported state FAILED".to_string(),
                    });
                }
                _ => {
                    handle.mark_processing();
                    if attempt < self.retry.max_attempts {
                        thread::sleep(self.retry.delay);
                    }
                }
            }
        }

        on_event(&UploadEvent::TimedOut {
            name: handle.display_name.clone(),
            attempts: self.retry.max_attempts,
        });
        Err(StorycheckError::UploadTimeout {
            name: handle.display_name.clone(),
            attempts: self.retry.max_attempts,
        })
    }

    /// Compare the local digest with the store-reported one, if both exist.
    /// Observational only: a mismatch is reported, never fatal.
    fn verify_checksum(
        &self,
        handle: &AssetHandle,
        remote_sha: Option<&str>,
        on_event: &dyn Fn(&UploadEvent),
    ) {
        let Some(remote_sha) = remote_sha else { return };
        let Ok(local_sha) = fs::sha256_base64(&handle.local_path) else {
            return;
        };
        if local_sha != remote_sha {
            on_event(&UploadEvent::ChecksumMismatch {
                name: handle.display_name.clone(),
                local: local_sha,
                remote: remote_sha.to_string(),
            });
        }
    }
}
