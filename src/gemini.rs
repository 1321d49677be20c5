//! Gemini REST client
//!
//! Blocking `reqwest` implementation of the `RemoteStore` and `Generator`
//! seams against the Gemini Files API and `generateContent` endpoint.
//! Uploads use the resumable protocol: a start handshake that returns an
//! upload URL, then a single transfer-and-finalize request.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Body, Client, Response};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::{StorycheckError, StorycheckResult};
use crate::fs;
use crate::models::{AssetState, GenerationSettings, RemoteFile, SafetyThreshold};
use crate::remote::{Generator, RemoteStore};

/// Time allowed to establish a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed per request; generation can take minutes on large archives
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Page size for file listings
const LIST_PAGE_SIZE: usize = 100;

/// Safety categories configured on every generation call
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Client for the Gemini Files and generation APIs
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from configuration; fails when no API key is set
    pub fn new(config: &Config) -> StorycheckResult<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Map a non-success response to `Api`, passing the body as message
    fn check(resp: Response) -> StorycheckResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().unwrap_or_default().trim().to_string();
        Err(StorycheckError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// MIME type reported for an archive upload
fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("zip") => "application/zip",
        Some("gz") | Some("tgz") => "application/gzip",
        Some("tar") => "application/x-tar",
        _ => "application/octet-stream",
    }
}

/// Wire string for a safety threshold
fn threshold_wire(threshold: SafetyThreshold) -> &'static str {
    match threshold {
        SafetyThreshold::Off => "BLOCK_NONE",
        SafetyThreshold::LowAndAbove => "BLOCK_LOW_AND_ABOVE",
        SafetyThreshold::MediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
        SafetyThreshold::OnlyHigh => "BLOCK_ONLY_HIGH",
    }
}

// ---- Files API wire types -------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilePayload {
    name: String,
    display_name: Option<String>,
    uri: Option<String>,
    state: Option<String>,
    /// int64 fields travel as strings in proto-JSON
    size_bytes: Option<String>,
    sha256_hash: Option<String>,
    expiration_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl FilePayload {
    fn into_remote(self) -> RemoteFile {
        RemoteFile {
            id: self.name,
            display_name: self.display_name,
            uri: self.uri,
            state: AssetState::from_remote(self.state.as_deref().unwrap_or_default()),
            size_bytes: self.size_bytes.and_then(|s| s.parse().ok()),
            sha256: self.sha256_hash,
            expire_time: self.expiration_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: FilePayload,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FileListPayload {
    #[serde(default)]
    files: Vec<FilePayload>,
    next_page_token: Option<String>,
}

// ---- generateContent wire types -------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Pull the review text out of a generation response
fn extract_text(parsed: GenerateResponse) -> StorycheckResult<String> {
    let candidate = parsed.candidates.unwrap_or_default().into_iter().next();
    let finish_reason = candidate
        .as_ref()
        .and_then(|c| c.finish_reason.clone())
        .unwrap_or_default();
    let text: String = candidate
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if !text.is_empty() {
        return Ok(text);
    }
    let reason = match parsed.prompt_feedback.and_then(|f| f.block_reason) {
        Some(block) => format!("prompt was blocked ({block})"),
        None if !finish_reason.is_empty() => {
            format!("response contained no text (finish reason {finish_reason})")
        }
        None => "response contained no text".to_string(),
    };
    Err(StorycheckError::GenerationFailed { reason })
}

impl RemoteStore for GeminiClient {
    fn upload(&self, path: &Path, display_name: &str) -> StorycheckResult<RemoteFile> {
        let size = fs::file_size(path)?;
        let mime = mime_for(path);

        // Resumable handshake: ask for an upload URL
        let start = self
            .client
            .post(format!(
                "{}/upload/v1beta/files?key={}",
                self.api_base, self.api_key
            ))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()?;
        let start = Self::check(start)?;
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| StorycheckError::Api {
                status: 200,
                message: "resumable handshake returned no upload URL".to_string(),
            })?;

        // Transfer the bytes and finalize in one request
        let file = std::fs::File::open(path)?;
        let finalize = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(Body::sized(file, size))
            .send()?;
        let envelope: FileEnvelope = Self::check(finalize)?.json()?;
        Ok(envelope.file.into_remote())
    }

    fn poll(&self, id: &str) -> StorycheckResult<RemoteFile> {
        let resp = self
            .client
            .get(format!("{}/v1beta/{}?key={}", self.api_base, id, self.api_key))
            .send()?;
        let payload: FilePayload = Self::check(resp)?.json()?;
        Ok(payload.into_remote())
    }

    fn list(&self) -> StorycheckResult<Vec<RemoteFile>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = format!(
                "{}/v1beta/files?key={}&pageSize={}",
                self.api_base, self.api_key, LIST_PAGE_SIZE
            );
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(token);
            }
            let resp = self.client.get(url).send()?;
            let page: FileListPayload = Self::check(resp)?.json()?;
            entries.extend(page.files.into_iter().map(FilePayload::into_remote));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(entries),
            }
        }
    }

    fn delete(&self, id: &str) -> StorycheckResult<()> {
        let resp = self
            .client
            .delete(format!("{}/v1beta/{}?key={}", self.api_base, id, self.api_key))
            .send()?;
        Self::check(resp)?;
        Ok(())
    }
}

impl Generator for GeminiClient {
    fn generate(&self, prompt: &str, settings: &GenerationSettings) -> StorycheckResult<String> {
        let safety: Vec<_> = SAFETY_CATEGORIES
            .iter()
            .map(|category| {
                json!({
                    "category": category,
                    "threshold": threshold_wire(settings.safety),
                })
            })
            .collect();
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": settings.temperature },
            "safetySettings": safety,
        });

        let resp = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent?key={}",
                self.api_base, settings.model, self.api_key
            ))
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default().trim().to_string();
            return Err(StorycheckError::GenerationFailed {
                reason: format!("HTTP {}: {}", status.as_u16(), message),
            });
        }
        let parsed: GenerateResponse = resp.json()?;
        extract_text(parsed)
    }
}
