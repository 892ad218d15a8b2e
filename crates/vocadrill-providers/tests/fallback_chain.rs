//! Translator chain behavior with real provider implementations.

use std::sync::Arc;
use std::time::Duration;

use vocadrill_core::engine::{NoopReporter, TranslationEngine, TranslationEngineConfig};
use vocadrill_core::model::{Article, Deck, Word};
use vocadrill_core::traits::{TranslateRequest, Translator};
use vocadrill_providers::glossary::GlossaryTranslator;
use vocadrill_providers::mock::MockTranslator;
use vocadrill_providers::TranslateError;

fn deck() -> Deck {
    Deck {
        id: "de-basics".into(),
        name: "German basics".into(),
        description: String::new(),
        language: "de".into(),
        native_language: "en".into(),
        words: vec![
            Word::new("de-basics", "der Hund", "the dog"),
            Word::new("de-basics", "schläft", "sleeps"),
            Word::new("de-basics", "die Katze", "the cat"),
            Word::new("de-basics", "spielt", "plays"),
        ],
        articles: vec![Article::from_text(
            "de-basics",
            "Zuhause",
            "Der Hund schläft.\n\nDie Katze spielt.\n\nEin Vogel singt im Garten.",
            None,
        )],
    }
}

fn config() -> TranslationEngineConfig {
    TranslationEngineConfig {
        parallelism: 2,
        max_retries: 1,
        retry_delay: Duration::from_millis(5),
    }
}

#[tokio::test(start_paused = true)]
async fn flaky_primary_then_glossary() {
    let deck = deck();
    let primary = Arc::new(
        MockTranslator::with_fixed_response("primary", "translated")
            .failing_with(vec![TranslateError::Timeout(1), TranslateError::Timeout(1)]),
    );
    let glossary = Arc::new(GlossaryTranslator::from_deck(&deck, 0.5));
    let translators: Vec<Arc<dyn Translator>> = vec![primary.clone(), glossary];
    let engine = TranslationEngine::new(translators, config());

    let response = engine
        .translate(&TranslateRequest::new("Der Hund schläft.", "de", "en"))
        .await
        .unwrap();
    assert_eq!(response.translator, "glossary");
    assert_eq!(response.text, "the dog sleeps");
    assert_eq!(primary.call_count(), 2);

    // The primary has recovered by now.
    let response = engine
        .translate(&TranslateRequest::new("Die Katze spielt.", "de", "en"))
        .await
        .unwrap();
    assert_eq!(response.translator, "primary");
}

#[tokio::test(start_paused = true)]
async fn fill_deck_with_glossary_only() {
    let mut deck = deck();
    let glossary: Arc<dyn Translator> = Arc::new(GlossaryTranslator::from_deck(&deck, 0.5));
    let engine = TranslationEngine::new(vec![glossary], config());

    let summary = engine
        .fill_missing_meanings(&mut deck, &NoopReporter)
        .await
        .unwrap();
    assert_eq!(summary.filled, 2);
    assert_eq!(summary.failed, 1);

    let paragraphs = &deck.articles[0].paragraphs;
    assert_eq!(paragraphs[0].meaning.as_deref(), Some("the dog sleeps"));
    assert_eq!(paragraphs[1].meaning.as_deref(), Some("the cat plays"));
    assert!(paragraphs[2].meaning.is_none());
}

#[tokio::test(start_paused = true)]
async fn mock_sees_deck_languages() {
    let mut deck = deck();
    deck.articles[0].paragraphs.truncate(1);
    let mock = Arc::new(MockTranslator::with_fixed_response("mock", "the dog sleeps"));
    let engine = TranslationEngine::new(vec![mock.clone() as Arc<dyn Translator>], config());

    engine
        .fill_missing_meanings(&mut deck, &NoopReporter)
        .await
        .unwrap();
    let request = mock.last_request().unwrap();
    assert_eq!(request.source_language, "de");
    assert_eq!(request.target_language, "en");
    assert_eq!(request.text, "Der Hund schläft.");
}
