//! Mock translation backend for testing
//!
//! This module provides a deterministic, network-free backend for testing
//! the orchestrator and controller without a running model server.
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe_mt::{MockBackend, MockMode, TranslationBackend};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockBackend::new(MockMode::Suffix);
//!     let result = mock.request_translation("Save", "en", "de").await.unwrap();
//!     assert_eq!(result, "Save_de");
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::TranslationBackend;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target code suffix: "Save" → "Save_de"
    Suffix,

    /// Use predefined mappings for realistic translations
    /// (text, target_code) → translation, falling back to suffix mode
    Mappings(HashMap<(String, String), String>),

    /// Return the same text for every request
    Fixed(String),

    /// No-op: return input unchanged
    Echo,

    /// Simulate backend errors
    Error(MtError),

    /// Replay scripted outcomes in order; once exhausted, fall back to echo
    Sequence(Vec<MtResult<String>>),
}

/// Mock backend that simulates various model behaviours
#[derive(Debug)]
pub struct MockBackend {
    mode: MockMode,
    script: Mutex<VecDeque<MtResult<String>>>,
    calls: AtomicUsize,
    source_codes: Mutex<Vec<String>>,
    /// Optional simulated latency (in milliseconds)
    delay_ms: u64,
}

impl MockBackend {
    /// Create a new MockBackend with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Create a MockBackend with simulated latency
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockBackend::with_delay(MockMode::Suffix, 50);
    /// // Each request will take ~50ms
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        let script = match &mode {
            MockMode::Sequence(outcomes) => outcomes.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            mode,
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            source_codes: Mutex::new(Vec::new()),
            delay_ms,
        }
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Source codes of every request so far, in order
    pub fn source_codes(&self) -> Vec<String> {
        match self.source_codes.lock() {
            Ok(codes) => codes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn next_scripted(&self, text: &str) -> MtResult<String> {
        let next = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.unwrap_or_else(|| Ok(text.to_string()))
    }

    fn apply_translation(&self, text: &str, target_code: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target_code)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target_code.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target_code)))
            }
            MockMode::Fixed(output) => Ok(output.clone()),
            MockMode::Echo => Ok(text.to_string()),
            MockMode::Error(error) => Err(error.clone()),
            MockMode::Sequence(_) => self.next_scripted(text),
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn request_translation(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> MtResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.source_codes.lock() {
            Ok(mut codes) => codes.push(source_code.to_string()),
            Err(poisoned) => poisoned.into_inner().push(source_code.to_string()),
        }
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.apply_translation(text, target_code)
    }

    fn provider_name(&self) -> &str {
        "Mock Backend"
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Suffix Mode Tests ==========

    #[tokio::test]
    async fn test_suffix_translation() {
        let mock = MockBackend::new(MockMode::Suffix);
        let result = mock.request_translation("Save", "en", "de").await.unwrap();
        assert_eq!(result, "Save_de");
        assert_eq!(mock.call_count(), 1);
    }

    // ========== Mapping Mode Tests ==========

    #[tokio::test]
    async fn test_mapping_with_fallback() {
        let mut map = HashMap::new();
        map.insert(("Save".to_string(), "de".to_string()), "Speichern".to_string());
        let mock = MockBackend::new(MockMode::Mappings(map));

        assert_eq!(mock.request_translation("Save", "en", "de").await.unwrap(), "Speichern");
        assert_eq!(mock.request_translation("Open", "en", "de").await.unwrap(), "Open_de");
    }

    // ========== Error Mode Tests ==========

    #[tokio::test]
    async fn test_error_mode() {
        let mock = MockBackend::new(MockMode::Error(MtError::Unreachable("down".to_string())));
        let result = mock.request_translation("Save", "en", "de").await;
        assert_eq!(result, Err(MtError::Unreachable("down".to_string())));
    }

    // ========== Sequence Mode Tests ==========

    #[tokio::test]
    async fn test_sequence_replays_then_echoes() {
        let mock = MockBackend::new(MockMode::Sequence(vec![
            Err(MtError::Provider("busy".to_string())),
            Ok("Speichern".to_string()),
        ]));

        assert!(mock.request_translation("Save", "en", "de").await.is_err());
        assert_eq!(mock.request_translation("Save", "en", "de").await.unwrap(), "Speichern");
        assert_eq!(mock.request_translation("Save", "en", "de").await.unwrap(), "Save");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fixed_and_echo() {
        let fixed = MockBackend::new(MockMode::Fixed("Hallo".to_string()));
        assert_eq!(fixed.request_translation("Hi", "en", "de").await.unwrap(), "Hallo");

        let echo = MockBackend::new(MockMode::Echo);
        assert_eq!(echo.request_translation("Hi", "en", "de").await.unwrap(), "Hi");
    }
}
