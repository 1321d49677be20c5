//! storycheck - archive review against user stories
//!
//! storycheck uploads packaged source trees to the Gemini Files API,
//! composes a review prompt from a user story (plus optional acceptance
//! criteria and a custom template), asks the model for a structured
//! review, and always cleans up and lists what is left in the remote
//! store afterwards.

pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod fs;
pub mod gemini;
pub mod models;
pub mod registry;
pub mod remote;
pub mod session;
pub mod upload;

// Re-exports for convenience
pub use compose::{PromptComposer, ReviewFocus, CRITERIA_FALLBACK, SYSTEM_INSTRUCTION};
pub use config::{Config, ConfigWarning};
pub use error::{StorycheckError, StorycheckResult};
pub use gemini::GeminiClient;
pub use models::{
    AssetHandle, AssetState, CleanupReport, GenerationSettings, RemoteFile, ReviewPayload,
    SafetyThreshold,
};
pub use registry::AssetRegistry;
pub use remote::{Generator, RemoteStore};
pub use session::{ReviewSession, SessionEvent, SessionOptions};
pub use upload::{RetryPolicy, UploadEvent, UploadLifecycle, MAX_UPLOAD_RETRIES, UPLOAD_RETRY_DELAY};
