use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::Memo;
use crate::model::is_description_available;

const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Request(String),
    #[error("translation response parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, TranslateError>;
}

/// Client for the public Google web translation endpoint.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: GOOGLE_ENDPOINT.to_string(),
        })
    }

    fn request_url(&self, text: &str, source: &str, target: &str) -> String {
        format!(
            "{}?client=gtx&dt=t&sl={}&tl={}&q={}",
            self.endpoint,
            urlencoding::encode(source),
            urlencoding::encode(target),
            urlencoding::encode(text)
        )
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let url = self.request_url(text, source, target);
        let value: Value = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        joined_segments(&value)
    }
}

/// The endpoint answers `[[["translated", "original", ...], ...], ...]`.
fn joined_segments(value: &Value) -> Result<String, TranslateError> {
    let segments = value
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| TranslateError::Parse("missing segments".to_string()))?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        return Err(TranslateError::Parse("empty translation".to_string()));
    }
    Ok(text)
}

/// Memoizes another translator's successes.
pub struct CachedTranslator<T> {
    inner: T,
    memo: Memo<(String, String, String), String>,
}

impl<T: Translator> CachedTranslator<T> {
    pub fn new(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            memo: Memo::new("translation", capacity),
        }
    }
}

#[async_trait]
impl<T: Translator> Translator for CachedTranslator<T> {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let key = (text.to_string(), source.to_string(), target.to_string());
        self.memo
            .get_or_try_fetch(key, || self.inner.translate(text, source, target))
            .await
    }
}

/// Best-effort translation: empty text and the unavailable sentinel are
/// returned as-is, and any failure keeps the original text.
pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    source: &str,
    target: &str,
) -> String {
    if !is_description_available(text) {
        return text.to_string();
    }
    match translator.translate(text, source, target).await {
        Ok(translated) => translated,
        Err(err) => {
            log::warn!("keeping untranslated text: {err}");
            text.to_string()
        }
    }
}
