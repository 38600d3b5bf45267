//! texkg Oracle Provider Layer
//!
//! Implementations of the `ExtractionOracle` trait from `texkg-domain`.
//!
//! # Providers
//!
//! - `MockOracle`: scripted oracle for testing (fixed responses, injected
//!   failures, artificial latency)
//! - `OllamaOracle`: local Ollama API integration
//! - `OpenAiOracle`: OpenAI-compatible chat completions endpoint
//!
//! # Examples
//!
//! ```
//! use texkg_llm::MockOracle;
//! use texkg_domain::{ExtractionOracle, SamplingParams};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let oracle = MockOracle::new("{\"nodes\":[],\"edges\":[]}");
//! let out = rt.block_on(oracle.invoke("any prompt", &SamplingParams::default())).unwrap();
//! assert_eq!(out, "{\"nodes\":[],\"edges\":[]}");
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use texkg_domain::{ExtractionOracle, OracleError, SamplingParams};

pub use ollama::OllamaOracle;
pub use openai::OpenAiOracle;

/// Truncate to at most `max` characters (on a char boundary)
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Whether a response body is an HTML page rather than model output
pub fn looks_like_html(s: &str) -> bool {
    let head = truncate_chars(s.trim(), 200).to_lowercase();
    head.starts_with("<!doctype")
        || head.starts_with("<html")
        || head.contains("<head")
        || head.contains("<body")
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    reply: Reply,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<Rule>,
    prompts: Vec<String>,
}

/// Scripted oracle for deterministic testing
///
/// Responses are matched by *substring*: the first registered pattern that
/// occurs in the prompt wins, otherwise the default response is returned.
/// Clones share their script and call log.
///
/// # Examples
///
/// ```
/// use texkg_llm::MockOracle;
/// use std::time::Duration;
///
/// let mut oracle = MockOracle::default();
/// oracle.add_response("chunk:a.tex:0", "{\"nodes\":[]}");
/// oracle.add_delayed_response("chunk:a.tex:1", "{\"nodes\":[]}", Duration::from_millis(50));
/// oracle.add_error("chunk:a.tex:2");
/// ```
#[derive(Debug, Clone)]
pub struct MockOracle {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockOracle {
    /// Create a mock returning `response` for every prompt
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push_rule(&mut self, pattern: impl Into<String>, reply: Reply, delay: Option<Duration>) {
        self.state().rules.push(Rule {
            pattern: pattern.into(),
            reply,
            delay,
        });
    }

    /// Respond with `response` to prompts containing `pattern`
    pub fn add_response(&mut self, pattern: impl Into<String>, response: impl Into<String>) {
        self.push_rule(pattern, Reply::Text(response.into()), None);
    }

    /// Like [`add_response`](Self::add_response), after sleeping for `delay`
    pub fn add_delayed_response(
        &mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
        delay: Duration,
    ) {
        self.push_rule(pattern, Reply::Text(response.into()), Some(delay));
    }

    /// Fail prompts containing `pattern`
    pub fn add_error(&mut self, pattern: impl Into<String>) {
        self.push_rule(pattern, Reply::Error, None);
    }

    /// Number of invocations so far
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Every prompt received, in arrival order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Forget recorded prompts
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new(r#"{"nodes":[],"edges":[]}"#)
    }
}

#[async_trait]
impl ExtractionOracle for MockOracle {
    async fn invoke(&self, prompt: &str, _params: &SamplingParams) -> Result<String, OracleError> {
        // Resolve the rule and release the lock before any await
        let rule = {
            let mut state = self.state();
            state.prompts.push(prompt.to_string());
            state
                .rules
                .iter()
                .find(|r| prompt.contains(&r.pattern))
                .cloned()
        };

        let Some(rule) = rule else {
            return Ok(self.default_response.clone());
        };

        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }

        match rule.reply {
            Reply::Text(text) => Ok(text),
            Reply::Error => Err(OracleError::Communication("Mock error".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
