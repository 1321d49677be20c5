//! Common test utilities for storycheck integration tests.
//!
//! Provides a scriptable in-memory store and generator implementing the
//! public `RemoteStore`/`Generator` seams, plus fixture helpers for
//! archives and documents.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use storycheck::{
    AssetState, Generator, GenerationSettings, RemoteFile, RemoteStore, StorycheckError,
    StorycheckResult,
};

/// Scriptable in-memory remote store
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    files: BTreeMap<String, RemoteFile>,
    scripts: HashMap<String, VecDeque<AssetState>>,
    fail_delete: HashSet<String>,
    counter: usize,
}

fn uri_for(id: &str) -> String {
    format!("https://store.invalid/v1beta/{id}")
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the states reported on successive polls of `display_name`.
    /// Without a script, uploads become active immediately.
    pub fn script_polls(&self, display_name: &str, states: &[AssetState]) {
        self.inner
            .lock()
            .unwrap()
            .scripts
            .insert(display_name.to_string(), states.iter().copied().collect());
    }

    /// Make deletion of the entry named `display_name` fail.
    pub fn fail_delete_of(&self, display_name: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_delete
            .insert(display_name.to_string());
    }

    /// Ids currently present in the store.
    pub fn stored_ids(&self) -> Vec<String> {
        self.inner.lock().unwrap().files.keys().cloned().collect()
    }
}

impl RemoteStore for FakeStore {
    fn upload(&self, _path: &Path, display_name: &str) -> StorycheckResult<RemoteFile> {
        let mut inner = self.inner.lock().unwrap();
        inner.counter += 1;
        let id = format!("files/fake-{:03}", inner.counter);
        let scripted = inner.scripts.contains_key(display_name);
        let state = if scripted {
            AssetState::Processing
        } else {
            AssetState::Active
        };
        let file = RemoteFile {
            id: id.clone(),
            display_name: Some(display_name.to_string()),
            uri: (state == AssetState::Active).then(|| uri_for(&id)),
            state,
            size_bytes: None,
            sha256: None,
            expire_time: None,
        };
        inner.files.insert(id, file.clone());
        Ok(file)
    }

    fn poll(&self, id: &str) -> StorycheckResult<RemoteFile> {
        let mut inner = self.inner.lock().unwrap();
        let Some(mut file) = inner.files.get(id).cloned() else {
            return Err(StorycheckError::Api {
                status: 404,
                message: format!("no such entry: {id}"),
            });
        };
        let name = file.display_name.clone().unwrap_or_default();
        let next = inner
            .scripts
            .get_mut(&name)
            .and_then(|queue| queue.pop_front());
        if let Some(state) = next {
            file.state = state;
            file.uri = (state == AssetState::Active).then(|| uri_for(id));
            inner.files.insert(id.to_string(), file.clone());
        }
        Ok(file)
    }

    fn list(&self) -> StorycheckResult<Vec<RemoteFile>> {
        Ok(self.inner.lock().unwrap().files.values().cloned().collect())
    }

    fn delete(&self, id: &str) -> StorycheckResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let name = inner
            .files
            .get(id)
            .and_then(|f| f.display_name.clone())
            .unwrap_or_default();
        if inner.fail_delete.contains(&name) {
            return Err(StorycheckError::Api {
                status: 500,
                message: format!("simulated delete failure for {name}"),
            });
        }
        inner.files.remove(id);
        Ok(())
    }
}

/// Generator that records the prompt and replies with a fixed text
pub struct FakeGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: text.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// The last prompt handed to the generator
    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &str, _settings: &GenerationSettings) -> StorycheckResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Write a small fake archive under `dir` and return its path
pub fn write_archive(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"PK\x03\x04 not a real zip").unwrap();
    path
}

/// Write a text document under `dir` and return its path
pub fn write_document(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
