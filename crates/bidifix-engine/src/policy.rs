//! Compiled engine policy.
//!
//! Configuration arrives as strings; the engine wants parsed selectors it
//! can match against on every pass. Compiling once up front also moves
//! selector syntax errors to engine construction, the only place they can
//! be reported.

use bidifix_config::{BidifixConfig, RetryConfig};
use bidifix_dom::{Selector, SelectorError};

/// A selector in the configuration failed to parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid `{name}` selector `{text}`: {source}")]
pub struct PolicyError {
    name: &'static str,
    text: String,
    #[source]
    source: SelectorError,
}

/// Retry counts and delays, copied out of the configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub insert_attempts: u32,
    pub text_attempts: u32,
    pub initial_attempts: u32,
    pub delay_ms: u64,
    pub initial_delay_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(retry: &RetryConfig) -> Self {
        Self {
            insert_attempts: retry.insert_attempts,
            text_attempts: retry.text_attempts,
            initial_attempts: retry.initial_attempts,
            delay_ms: retry.delay_ms,
            initial_delay_ms: retry.initial_delay_ms,
        }
    }
}

/// Marker names and compiled selectors driving every engine pass.
#[derive(Debug, Clone)]
pub struct Policy {
    pub rtl_class: String,
    pub math_class: String,
    pub wrapper: Selector,
    pub math: Selector,
    pub code: Selector,
    pub retry: RetryPolicy,
}

impl Policy {
    pub fn from_config(config: &BidifixConfig) -> Result<Self, PolicyError> {
        Ok(Self {
            rtl_class: config.markers.rtl_class.clone(),
            math_class: config.markers.math_class.clone(),
            wrapper: compile("wrapper", &config.selectors.wrapper)?,
            math: compile("math", &config.selectors.math)?,
            code: compile("code", &config.selectors.code)?,
            retry: RetryPolicy::from(&config.retry),
        })
    }
}

fn compile(name: &'static str, text: &str) -> Result<Selector, PolicyError> {
    Selector::parse(text).map_err(|source| PolicyError {
        name,
        text: text.to_string(),
        source,
    })
}
