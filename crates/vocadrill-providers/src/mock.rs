//! Mock translator for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use vocadrill_core::error::TranslateError;
use vocadrill_core::traits::{TranslateRequest, TranslateResponse, Translator};

/// A scriptable translator for exercising the engine without real backends.
///
/// Queued failures are returned first, one per call. After that, a response
/// is looked up by exact source text, falling back to the default.
pub struct MockTranslator {
    name: String,
    /// Source text → translation.
    responses: HashMap<String, String>,
    /// Translation when no response matches. `None` means `Unsupported`.
    default_response: Option<String>,
    failures: Mutex<VecDeque<TranslateError>>,
    call_count: AtomicU32,
    last_request: Mutex<Option<TranslateRequest>>,
}

impl MockTranslator {
    /// Create a mock with the given text → translation mappings.
    pub fn new(name: &str, responses: HashMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            responses,
            default_response: None,
            failures: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same translation.
    pub fn with_fixed_response(name: &str, response: &str) -> Self {
        let mut mock = Self::new(name, HashMap::new());
        mock.default_response = Some(response.to_string());
        mock
    }

    /// Queue errors to return before any success.
    pub fn failing_with(self, failures: Vec<TranslateError>) -> Self {
        if let Ok(mut queue) = self.failures.lock() {
            queue.extend(failures);
        }
        self
    }

    /// Number of calls made to this translator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request received.
    pub fn last_request(&self) -> Option<TranslateRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, request: &TranslateRequest) -> anyhow::Result<TranslateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let failure = self.failures.lock().ok().and_then(|mut q| q.pop_front());
        if let Some(e) = failure {
            return Err(e.into());
        }

        let text = self
            .responses
            .get(request.text.trim())
            .or(self.default_response.as_ref())
            .cloned()
            .ok_or_else(|| {
                TranslateError::Unsupported(format!("no mock response for {:?}", request.text))
            })?;

        Ok(TranslateResponse {
            text,
            translator: self.name.clone(),
            latency_ms: 1,
        })
    }
}
