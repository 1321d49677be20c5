//! Review session orchestration
//!
//! Sequences one review from validation through cleanup:
//! validate inputs (before any upload, so a bad path never wastes remote
//! storage) -> upload archives in order -> compose the prompt -> call the
//! generation service -> deliver the result -> cleanup. The cleanup phase
//! always runs, success or failure, and always ends with a fresh store
//! listing: visibility into leaked remote state is part of the contract.

use std::path::PathBuf;

use crate::compose::{PromptComposer, ReviewFocus};
use crate::config::Config;
use crate::error::StorycheckResult;
use crate::fs;
use crate::models::{CleanupReport, GenerationSettings, RemoteFile, SafetyThreshold};
use crate::registry::AssetRegistry;
use crate::remote::{Generator, RemoteStore};
use crate::upload::{RetryPolicy, UploadEvent};

/// Inputs and flags for one review session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Archives to upload, in placeholder-index order
    pub archives: Vec<PathBuf>,

    /// User-story document
    pub story: PathBuf,

    /// Acceptance-criteria document
    pub criteria: Option<PathBuf>,

    /// Custom prompt template
    pub template: Option<PathBuf>,

    /// Where to save the feedback report
    pub output: Option<PathBuf>,

    /// Where to save the composed prompt for inspection
    pub save_prompt: Option<PathBuf>,

    /// Emit the composed prompt before sending it
    pub show_prompt: bool,

    /// Emit the feedback text even when an output path is set
    pub show_feedback: bool,

    /// Leave this session's uploads in the remote store
    pub keep_uploads: bool,

    /// Default-template instructions to synthesize
    pub focus: ReviewFocus,
}

/// Observable session progress, rendered by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Upload lifecycle transition
    Upload(UploadEvent),
    /// Prompt composition finished
    PromptComposed { bytes: usize },
    /// Composed prompt, emitted when the caller asked to preview it
    PromptPreview { text: String },
    /// Composed prompt saved for inspection
    PromptSaved { path: PathBuf },
    /// Generation request sent
    Generating { model: String },
    /// Feedback report written to disk
    FeedbackSaved { path: PathBuf },
    /// Feedback text, emitted when the caller asked for console output
    Feedback { text: String },
    /// Session uploads retained on request
    CleanupSkipped,
    /// Session cleanup finished, with per-handle outcomes
    CleanupComplete { report: CleanupReport },
    /// Fresh listing of what the store still holds
    StoredFiles { files: Vec<RemoteFile> },
    /// The trailing listing itself failed
    ListingFailed { reason: String },
}

impl SessionEvent {
    /// NDJSON rendering for `--json` output
    pub fn to_json(&self) -> String {
        use serde_json::json;
        let value = match self {
            SessionEvent::Upload(upload) => match upload {
                UploadEvent::Submitted { name, id } => {
                    json!({"event": "submitted", "name": name, "id": id})
                }
                UploadEvent::Polled {
                    name,
                    state,
                    attempt,
                } => {
                    json!({"event": "polled", "name": name, "state": state.to_string(), "attempt": attempt})
                }
                UploadEvent::Activated { name, uri } => {
                    json!({"event": "active", "name": name, "uri": uri})
                }
                UploadEvent::ChecksumMismatch {
                    name,
                    local,
                    remote,
                } => {
                    json!({"event": "checksum_mismatch", "name": name, "local": local, "remote": remote})
                }
                UploadEvent::Failed { name } => json!({"event": "upload_failed", "name": name}),
                UploadEvent::TimedOut { name, attempts } => {
                    json!({"event": "upload_timeout", "name": name, "attempts": attempts})
                }
            },
            SessionEvent::PromptComposed { bytes } => {
                json!({"event": "prompt_composed", "bytes": bytes})
            }
            SessionEvent::PromptPreview { text } => {
                json!({"event": "prompt_preview", "text": text})
            }
            SessionEvent::PromptSaved { path } => {
                json!({"event": "prompt_saved", "path": path.display().to_string()})
            }
            SessionEvent::Generating { model } => json!({"event": "generating", "model": model}),
            SessionEvent::FeedbackSaved { path } => {
                json!({"event": "feedback_saved", "path": path.display().to_string()})
            }
            SessionEvent::Feedback { text } => json!({"event": "feedback", "text": text}),
            SessionEvent::CleanupSkipped => json!({"event": "cleanup_skipped"}),
            SessionEvent::CleanupComplete { report } => json!({
                "event": "cleanup_complete",
                "deleted": report.deleted,
                "failed": report.failed.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            }),
            SessionEvent::StoredFiles { files } => json!({
                "event": "stored_files",
                "files": files
                    .iter()
                    .map(|f| json!({"id": f.id, "state": f.state.to_string()}))
                    .collect::<Vec<_>>(),
            }),
            SessionEvent::ListingFailed { reason } => {
                json!({"event": "listing_failed", "reason": reason})
            }
        };
        value.to_string()
    }
}

/// Orchestrates one review against a store and a generator
pub struct ReviewSession<'a, S: RemoteStore + ?Sized, G: Generator + ?Sized> {
    store: &'a S,
    generator: &'a G,
    config: &'a Config,
    retry: RetryPolicy,
}

impl<'a, S: RemoteStore + ?Sized, G: Generator + ?Sized> ReviewSession<'a, S, G> {
    pub fn new(store: &'a S, generator: &'a G, config: &'a Config) -> Self {
        Self::with_retry(store, generator, config, RetryPolicy::default())
    }

    pub fn with_retry(
        store: &'a S,
        generator: &'a G,
        config: &'a Config,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            generator,
            config,
            retry,
        }
    }

    /// Run the session; returns the feedback text
    ///
    /// The cleanup phase and the trailing store listing run no matter how
    /// the session itself ends.
    pub fn run(
        &self,
        options: &SessionOptions,
        on_event: &dyn Fn(&SessionEvent),
    ) -> StorycheckResult<String> {
        let mut registry = AssetRegistry::with_retry(self.store, self.retry);
        let result = self.run_inner(&mut registry, options, on_event);

        if options.keep_uploads {
            on_event(&SessionEvent::CleanupSkipped);
        } else {
            let report = registry.cleanup_session();
            on_event(&SessionEvent::CleanupComplete { report });
        }
        match registry.list_all() {
            Ok(files) => on_event(&SessionEvent::StoredFiles { files }),
            Err(e) => on_event(&SessionEvent::ListingFailed {
                reason: e.to_string(),
            }),
        }

        result
    }

    fn run_inner(
        &self,
        registry: &mut AssetRegistry<'a, S>,
        options: &SessionOptions,
        on_event: &dyn Fn(&SessionEvent),
    ) -> StorycheckResult<String> {
        // Validate and read everything local before any remote traffic
        for archive in &options.archives {
            fs::validate_archive(archive, self.config.max_archive_bytes)?;
        }
        let doc_limit = self.config.max_document_bytes;
        let story = fs::read_document(&options.story, doc_limit)?;
        let criteria = options
            .criteria
            .as_ref()
            .map(|path| fs::read_document(path, doc_limit))
            .transpose()?;
        let template = options
            .template
            .as_ref()
            .map(|path| fs::read_document(path, doc_limit))
            .transpose()?;

        let forward = |event: &UploadEvent| on_event(&SessionEvent::Upload(event.clone()));
        registry.register_many(&options.archives, self.config.max_archive_bytes, &forward)?;

        let payload = PromptComposer::new(registry.handles())
            .with_focus(options.focus)
            .compose(template.as_deref(), &story, criteria.as_deref());
        on_event(&SessionEvent::PromptComposed {
            bytes: payload.body.len(),
        });
        if options.show_prompt {
            on_event(&SessionEvent::PromptPreview {
                text: payload.full_text(),
            });
        }
        if let Some(path) = &options.save_prompt {
            fs::atomic_write(path, &payload.full_text())?;
            on_event(&SessionEvent::PromptSaved { path: path.clone() });
        }

        let settings = GenerationSettings {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            safety: SafetyThreshold::default(),
        };
        on_event(&SessionEvent::Generating {
            model: settings.model.clone(),
        });
        let feedback = self.generator.generate(&payload.full_text(), &settings)?;

        if let Some(path) = &options.output {
            fs::atomic_write(path, &feedback)?;
            on_event(&SessionEvent::FeedbackSaved { path: path.clone() });
        }
        if options.show_feedback || options.output.is_none() {
            on_event(&SessionEvent::Feedback {
                text: feedback.clone(),
            });
        }
        Ok(feedback)
    }
}
