//! Translation engine.
//!
//! Runs a request through an ordered chain of translators, retrying
//! transient failures with backoff and moving on to the next translator when
//! one gives up. Also fills in missing paragraph meanings for a whole deck.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::TranslateError;
use crate::model::Deck;
use crate::traits::{TranslateRequest, TranslateResponse, Translator};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Configuration for the translation engine.
#[derive(Debug, Clone)]
pub struct TranslationEngineConfig {
    /// Maximum concurrent translations.
    pub parallelism: usize,
    /// Retries per translator on transient errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time.
    pub retry_delay: Duration,
}

impl Default for TranslationEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_paragraph_start(&self, article: &str, index: usize);
    fn on_paragraph_done(&self, article: &str, index: usize, translator: &str);
    fn on_paragraph_error(&self, article: &str, index: usize, error: &str);
    fn on_complete(&self, filled: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_paragraph_start(&self, _: &str, _: usize) {}
    fn on_paragraph_done(&self, _: &str, _: usize, _: &str) {}
    fn on_paragraph_error(&self, _: &str, _: usize, _: &str) {}
    fn on_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Outcome of [`TranslationEngine::fill_missing_meanings`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillSummary {
    pub filled: usize,
    pub failed: usize,
}

/// Translates through an ordered list of translators.
pub struct TranslationEngine {
    translators: Vec<Arc<dyn Translator>>,
    config: TranslationEngineConfig,
}

impl TranslationEngine {
    pub fn new(translators: Vec<Arc<dyn Translator>>, config: TranslationEngineConfig) -> Self {
        Self {
            translators,
            config,
        }
    }

    pub fn translator_names(&self) -> Vec<&str> {
        self.translators.iter().map(|t| t.name()).collect()
    }

    /// Translate with the first translator that succeeds.
    pub async fn translate(&self, request: &TranslateRequest) -> Result<TranslateResponse> {
        if self.translators.is_empty() {
            bail!("no translators configured");
        }

        let mut failures = Vec::new();
        for translator in &self.translators {
            match self.try_translator(translator.as_ref(), request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        translator = translator.name(),
                        "translation failed, trying next: {e:#}"
                    );
                    failures.push(format!("{}: {e:#}", translator.name()));
                }
            }
        }
        bail!("all translators failed: {}", failures.join("; "))
    }

    async fn try_translator(
        &self,
        translator: &dyn Translator,
        request: &TranslateRequest,
    ) -> Result<TranslateResponse> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }

            let start = Instant::now();
            let e = match translator.translate(request).await {
                Ok(response) if response.text.trim().is_empty() => {
                    anyhow::Error::new(TranslateError::Empty)
                }
                Ok(mut response) => {
                    if response.latency_ms == 0 {
                        response.latency_ms = start.elapsed().as_millis() as u64;
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            match e.downcast_ref::<TranslateError>() {
                Some(te) if te.is_permanent() => return Err(e),
                Some(te) => {
                    if let Some(ms) = te.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                }
                None => {}
            }
            tracing::debug!(translator = translator.name(), retry, "transient error: {e:#}");
            last_error = Some(e);
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
    }

    /// Translate every paragraph that has no meaning yet.
    ///
    /// Paragraphs that fail to translate are left as they were.
    pub async fn fill_missing_meanings(
        &self,
        deck: &mut Deck,
        progress: &dyn ProgressReporter,
    ) -> Result<FillSummary> {
        let start = Instant::now();
        let semaphore = Semaphore::new(self.config.parallelism.max(1));

        let mut futures = FuturesUnordered::new();
        for (a, article) in deck.articles.iter().enumerate() {
            for (p, paragraph) in article.paragraphs.iter().enumerate() {
                if paragraph.has_meaning() || paragraph.text.trim().is_empty() {
                    continue;
                }
                let request =
                    TranslateRequest::new(&paragraph.text, &deck.language, &deck.native_language);
                let title = article.title.clone();
                let semaphore = &semaphore;
                futures.push(async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_paragraph_start(&title, p);
                    let result = self.translate(&request).await;
                    anyhow::Ok((a, p, title, result))
                });
            }
        }

        let mut translated = Vec::new();
        let mut summary = FillSummary::default();
        while let Some(next) = futures.next().await {
            let (a, p, title, result) = next?;
            match result {
                Ok(response) => {
                    progress.on_paragraph_done(&title, p, &response.translator);
                    translated.push((a, p, response.text));
                    summary.filled += 1;
                }
                Err(e) => {
                    tracing::error!("could not translate {title} #{}: {e:#}", p + 1);
                    progress.on_paragraph_error(&title, p, &format!("{e:#}"));
                    summary.failed += 1;
                }
            }
        }
        drop(futures);

        for (a, p, text) in translated {
            if let Some(paragraph) = deck.articles.get_mut(a).and_then(|x| x.paragraphs.get_mut(p)) {
                paragraph.meaning = Some(text);
            }
        }

        progress.on_complete(summary.filled, summary.failed, start.elapsed());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Article;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails with the queued errors, then echoes the text upper-cased.
    struct Scripted {
        name: &'static str,
        failures: Mutex<Vec<TranslateError>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(name: &'static str, failures: Vec<TranslateError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                failures: Mutex::new(failures),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl Translator for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn translate(&self, request: &TranslateRequest) -> anyhow::Result<TranslateResponse> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let next = {
                let mut failures = self.failures.lock().unwrap();
                if failures.is_empty() {
                    None
                } else {
                    Some(failures.remove(0))
                }
            };
            if let Some(e) = next {
                return Err(e.into());
            }
            Ok(TranslateResponse {
                text: request.text.to_uppercase(),
                translator: self.name.to_string(),
                latency_ms: 1,
            })
        }
    }

    fn engine(translators: Vec<Arc<dyn Translator>>) -> TranslationEngine {
        TranslationEngine::new(
            translators,
            TranslationEngineConfig {
                parallelism: 2,
                max_retries: 2,
                retry_delay: Duration::from_millis(10),
            },
        )
    }

    fn request() -> TranslateRequest {
        TranslateRequest::new("hello", "en", "de")
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let t = Scripted::new("a", vec![TranslateError::Timeout(5), TranslateError::Io("reset".into())]);
        let e = engine(vec![t.clone()]);
        let response = e.translate(&request()).await.unwrap();
        assert_eq!(response.text, "HELLO");
        assert_eq!(t.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_falls_through_to_next() {
        let first = Scripted::new("first", vec![TranslateError::Unsupported("de".into())]);
        let second = Scripted::new("second", vec![]);
        let e = engine(vec![first.clone(), second.clone()]);

        let response = e.translate(&request()).await.unwrap();
        assert_eq!(response.translator, "second");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_fall_through() {
        let first = Scripted::new(
            "first",
            vec![
                TranslateError::RateLimited { retry_after_ms: 100 },
                TranslateError::Timeout(1),
                TranslateError::Timeout(1),
            ],
        );
        let second = Scripted::new("second", vec![]);
        let e = engine(vec![first.clone(), second]);

        let response = e.translate(&request()).await.unwrap();
        assert_eq!(response.translator, "second");
        assert_eq!(first.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_are_listed() {
        let a = Scripted::new("a", vec![TranslateError::Empty]);
        let b = Scripted::new("b", vec![TranslateError::Unsupported("xx".into())]);
        let e = engine(vec![a, b]);

        let err = e.translate(&request()).await.unwrap_err().to_string();
        assert!(err.contains("a: translator returned an empty result"), "{err}");
        assert!(err.contains("b: unsupported: xx"), "{err}");
    }

    #[tokio::test]
    async fn no_translators_is_an_error() {
        let e = engine(vec![]);
        assert!(e.translate(&request()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn fills_only_missing_meanings() {
        let mut deck = Deck {
            id: "d".into(),
            name: "D".into(),
            description: String::new(),
            language: "en".into(),
            native_language: "de".into(),
            words: vec![],
            articles: vec![Article::from_text("d", "A", "one\n\ntwo\n\nthree", Some("eins"))],
        };
        let t = Scripted::new("a", vec![]);
        let e = engine(vec![t.clone()]);

        let summary = e.fill_missing_meanings(&mut deck, &NoopReporter).await.unwrap();
        assert_eq!(summary, FillSummary { filled: 2, failed: 0 });
        assert_eq!(t.calls(), 2);

        let meanings: Vec<Option<&str>> = deck.articles[0]
            .paragraphs
            .iter()
            .map(|p| p.meaning.as_deref())
            .collect();
        assert_eq!(meanings, vec![Some("eins"), Some("TWO"), Some("THREE")]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_paragraphs_stay_empty() {
        let mut deck = Deck {
            id: "d".into(),
            name: "D".into(),
            description: String::new(),
            language: "en".into(),
            native_language: "de".into(),
            words: vec![],
            articles: vec![Article::from_text("d", "A", "one", None)],
        };
        let t = Scripted::new("a", vec![TranslateError::Empty]);
        let e = engine(vec![t]);

        let summary = e.fill_missing_meanings(&mut deck, &NoopReporter).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(deck.articles[0].paragraphs[0].meaning.is_none());
    }
}
