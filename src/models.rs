//! Core data models for storycheck
//!
//! Defines the fundamental data structures used throughout storycheck:
//! - `AssetHandle`: one uploaded archive and its remote lifecycle state
//! - `RemoteFile`: an entry in the remote store, as freshly reported
//! - `ReviewPayload`: the composed prompt handed to the generation call
//! - Supporting types: `AssetState`, `GenerationSettings`, `CleanupReport`

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a remote asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetState {
    /// Blob handed to the store, no state report seen yet
    #[default]
    Submitted,
    /// Store reported the upload as in progress
    Processing,
    /// Store reported the upload usable; a URI is available
    Active,
    /// Store reported the upload as permanently failed
    Failed,
    /// Removed from the store by an explicit delete
    Deleted,
}

impl AssetState {
    /// Map a store-reported state string onto the lifecycle vocabulary.
    ///
    /// Anything outside `{PROCESSING, ACTIVE, FAILED}` counts as still
    /// processing until the poll bound runs out.
    pub fn from_remote(raw: &str) -> Self {
        match raw {
            "ACTIVE" => AssetState::Active,
            "FAILED" => AssetState::Failed,
            _ => AssetState::Processing,
        }
    }

    /// Whether no further automatic transition can occur from this state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AssetState::Active | AssetState::Failed | AssetState::Deleted
        )
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetState::Submitted => "SUBMITTED",
            AssetState::Processing => "PROCESSING",
            AssetState::Active => "ACTIVE",
            AssetState::Failed => "FAILED",
            AssetState::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// One uploaded archive and its remote lifecycle state
///
/// Created by the upload lifecycle at submission time and owned by the
/// asset registry for the rest of the session. The remote URI is present
/// exactly while the state is `Active`; all transitions go through the
/// `mark_*` methods so the pair can never drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetHandle {
    /// Source file path (caller-owned, read-only here)
    pub local_path: PathBuf,

    /// Human-readable name shown in prompts and listings.
    /// Derived from the file name at creation time, immutable afterwards.
    pub display_name: String,

    remote_id: Option<String>,
    remote_uri: Option<String>,
    state: AssetState,
}

impl AssetHandle {
    /// Create a handle for a local file that has not been uploaded yet
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        let local_path = local_path.into();
        let display_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| local_path.display().to_string());
        Self {
            local_path,
            display_name,
            remote_id: None,
            remote_uri: None,
            state: AssetState::Submitted,
        }
    }

    /// Identifier assigned by the remote store, if submitted
    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    /// Locator usable by the generation call; present iff state is `Active`
    pub fn remote_uri(&self) -> Option<&str> {
        self.remote_uri.as_deref()
    }

    /// Current lifecycle state
    pub fn state(&self) -> AssetState {
        self.state
    }

    /// Record the identifier the store assigned at submission
    pub fn assign_remote(&mut self, id: impl Into<String>) {
        self.remote_id = Some(id.into());
        self.state = AssetState::Submitted;
    }

    /// Store reported the upload as still in progress
    pub fn mark_processing(&mut self) {
        self.remote_uri = None;
        self.state = AssetState::Processing;
    }

    /// Store reported readiness; the URI becomes available
    pub fn mark_active(&mut self, uri: impl Into<String>) {
        self.remote_uri = Some(uri.into());
        self.state = AssetState::Active;
    }

    /// Store reported a permanent failure
    pub fn mark_failed(&mut self) {
        self.remote_uri = None;
        self.state = AssetState::Failed;
    }

    /// Entry was removed from the store by an explicit delete
    pub fn mark_deleted(&mut self) {
        self.remote_uri = None;
        self.state = AssetState::Deleted;
    }
}

/// An entry in the remote store, as reported by a fresh list or poll
///
/// The store is shared global state, so these records are always a fresh
/// read and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    /// Opaque store identifier (resource name, e.g. `files/abc123`)
    pub id: String,

    /// Display name recorded at upload time, if any
    pub display_name: Option<String>,

    /// Locator usable by the generation call, once active
    pub uri: Option<String>,

    /// Lifecycle state as reported by the store
    pub state: AssetState,

    /// Stored size in bytes, if reported
    pub size_bytes: Option<u64>,

    /// Base64-encoded SHA-256 of the stored bytes, if reported
    pub sha256: Option<String>,

    /// When the store will expire the entry on its own, if reported
    pub expire_time: Option<DateTime<Utc>>,
}

/// Harm-blocking threshold forwarded with every generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyThreshold {
    /// Do not block on safety categories
    Off,
    /// Block low-probability harms and above
    LowAndAbove,
    /// Block medium-probability harms and above (moderate default)
    #[default]
    MediumAndAbove,
    /// Block only high-probability harms
    OnlyHigh,
}

/// Fixed, deterministic settings for the generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Model identifier to invoke
    pub model: String,

    /// Sampling temperature; kept low so reviews are reproducible
    pub temperature: f32,

    /// Harm-blocking threshold applied to every safety category
    pub safety: SafetyThreshold,
}

/// The composed prompt handed to the generation call
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPayload {
    /// Fixed descriptive instruction, not user-controlled
    pub system_instruction: String,

    /// Template-filled prompt body (or the synthesized default)
    pub body: String,
}

impl ReviewPayload {
    /// Full text sent to the generation service
    pub fn full_text(&self) -> String {
        format!("{}\n\n{}", self.system_instruction, self.body)
    }
}

/// Outcome of a session cleanup pass
///
/// Cleanup failures are reported here, never raised: one failing deletion
/// must not stop the others or the trailing store listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    /// Display names of handles whose remote entries were deleted
    pub deleted: Vec<String>,

    /// Display name and error message for each failed deletion
    pub failed: Vec<(String, String)>,

    /// True when the caller asked to retain uploads and nothing was deleted
    pub skipped: bool,
}

impl CleanupReport {
    /// Whether every attempted deletion succeeded
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_remote_known_values() {
        assert_eq!(AssetState::from_remote("ACTIVE"), AssetState::Active);
        assert_eq!(AssetState::from_remote("FAILED"), AssetState::Failed);
        assert_eq!(
            AssetState::from_remote("PROCESSING"),
            AssetState::Processing
        );
    }

    #[test]
    fn test_state_from_remote_unknown_counts_as_processing() {
        assert_eq!(
            AssetState::from_remote("STATE_UNSPECIFIED"),
            AssetState::Processing
        );
        assert_eq!(AssetState::from_remote(""), AssetState::Processing);
    }

    #[test]
    fn test_state_terminality() {
        assert!(!AssetState::Submitted.is_terminal());
        assert!(!AssetState::Processing.is_terminal());
        assert!(AssetState::Active.is_terminal());
        assert!(AssetState::Failed.is_terminal());
        assert!(AssetState::Deleted.is_terminal());
    }

    #[test]
    fn test_handle_display_name_from_base_name() {
        let handle = AssetHandle::new("/work/builds/project.zip");
        assert_eq!(handle.display_name, "project.zip");
        assert_eq!(handle.state(), AssetState::Submitted);
        assert!(handle.remote_id().is_none());
        assert!(handle.remote_uri().is_none());
    }

    #[test]
    fn test_uri_present_iff_active() {
        let mut handle = AssetHandle::new("a.zip");
        handle.assign_remote("files/abc");
        assert!(handle.remote_uri().is_none());

        handle.mark_processing();
        assert!(handle.remote_uri().is_none());

        handle.mark_active("https://store/files/abc");
        assert_eq!(handle.state(), AssetState::Active);
        assert_eq!(handle.remote_uri(), Some("https://store/files/abc"));

        handle.mark_deleted();
        assert_eq!(handle.state(), AssetState::Deleted);
        assert!(handle.remote_uri().is_none());
    }

    #[test]
    fn test_mark_failed_clears_uri() {
        let mut handle = AssetHandle::new("a.zip");
        handle.mark_active("https://store/files/abc");
        handle.mark_failed();
        assert_eq!(handle.state(), AssetState::Failed);
        assert!(handle.remote_uri().is_none());
    }

    #[test]
    fn test_payload_full_text_joins_instruction_and_body() {
        let payload = ReviewPayload {
            system_instruction: "You are a reviewer.".to_string(),
            body: "Review this.".to_string(),
        };
        assert_eq!(payload.full_text(), "You are a reviewer.\n\nReview this.");
    }

    #[test]
    fn test_cleanup_report_is_clean() {
        let mut report = CleanupReport::default();
        assert!(report.is_clean());
        report.failed.push(("a.zip".into(), "boom".into()));
        assert!(!report.is_clean());
    }
}
