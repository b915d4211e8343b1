//! Codec configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to a single encode or decode invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Deepest array-of-array nesting accepted before `NestingTooDeep`
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Most elements a single decode may produce. `None` caps it at the
    /// number of input words.
    #[serde(default)]
    pub max_elements: Option<usize>,
}

fn default_max_depth() -> usize { 32 }

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_elements: None,
        }
    }
}

impl CodecConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = Some(max_elements);
        self
    }

    /// Element budget for decoding `words` input words.
    pub fn element_budget(&self, words: usize) -> usize {
        self.max_elements.map_or(words, |limit| limit.min(words))
    }
}
