//! Test doubles shared by the orchestrator and route tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::openai::{ProviderError, TextProvider};

type Responder = Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

/// Records every prompt it receives and answers through a caller-supplied closure.
pub struct MockProvider {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(
        responder: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self { responder: Box::new(responder), prompts: Mutex::new(Vec::new()) }
    }

    /// Answers with a label naming the template the prompt came from.
    pub fn labelled() -> Self {
        Self::new(|prompt| Ok(label(prompt).to_string()))
    }

    /// Like [`MockProvider::labelled`] but fails every prompt whose label is `failing`.
    pub fn failing_on(failing: &'static str, message: &'static str) -> Self {
        Self::new(move |prompt| {
            let label = label(prompt);
            if label == failing {
                Err(ProviderError::Api { status: 429, message: message.to_string() })
            } else {
                Ok(label.to_string())
            }
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

pub fn label(prompt: &str) -> &'static str {
    if prompt.contains("Revision request") {
        "refined scenes"
    } else if prompt.contains("narration script") {
        "script text"
    } else if prompt.contains("storyboard artist") {
        "scene text"
    } else if prompt.contains("video-motion") {
        "video text"
    } else {
        "unknown"
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

/// Holds every call at a barrier, so no call completes until `parties` calls are in flight.
pub struct GatedProvider {
    barrier: Barrier,
}

impl GatedProvider {
    pub fn new(parties: usize) -> Self {
        Self { barrier: Barrier::new(parties) }
    }
}

#[async_trait]
impl TextProvider for GatedProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.barrier.wait().await;
        Ok(label(prompt).to_string())
    }
}
