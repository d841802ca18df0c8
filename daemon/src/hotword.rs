use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Activation word(s) that must lead a hypothesis before it is matched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "HotwordSetting", into = "HotwordSetting")]
pub enum HotwordConfig {
    #[default]
    Disabled,
    Word(String),
    Words(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotwordOutcome {
    /// The text left for matching, with the hotword removed when one is set.
    Accepted(String),
    Rejected,
}

impl HotwordConfig {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, HotwordConfig::Disabled)
    }

    pub fn words(&self) -> Vec<String> {
        match self {
            HotwordConfig::Disabled => Vec::new(),
            HotwordConfig::Word(word) => vec![word.clone()],
            HotwordConfig::Words(words) => words.clone(),
        }
    }

    fn accepts(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        match self {
            HotwordConfig::Disabled => true,
            HotwordConfig::Word(word) => word.to_lowercase() == token,
            HotwordConfig::Words(words) => words.iter().any(|w| w.to_lowercase() == token),
        }
    }

    /// Check the leading token of `hypothesis` and strip it. Only the first
    /// token is ever looked at or removed.
    pub fn apply(&self, hypothesis: &str) -> HotwordOutcome {
        let text = hypothesis.trim();
        if !self.is_enabled() {
            return HotwordOutcome::Accepted(text.to_string());
        }
        if text.is_empty() {
            return HotwordOutcome::Rejected;
        }

        let (first, rest) = match text.find(char::is_whitespace) {
            Some(index) => text.split_at(index),
            None => (text, ""),
        };

        if self.accepts(first) {
            HotwordOutcome::Accepted(rest.trim_start().to_string())
        } else {
            HotwordOutcome::Rejected
        }
    }
}

impl From<&str> for HotwordConfig {
    fn from(word: &str) -> Self {
        HotwordConfig::Word(word.to_string())
    }
}

impl From<Vec<String>> for HotwordConfig {
    /// An empty list turns the hotword off; a single entry is a single word.
    fn from(mut words: Vec<String>) -> Self {
        match words.len() {
            0 => HotwordConfig::Disabled,
            1 => HotwordConfig::Word(words.remove(0)),
            _ => HotwordConfig::Words(words),
        }
    }
}

/// The shapes a hotword takes in configuration: `false`, `"word"` or a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HotwordSetting {
    Toggle(bool),
    Word(String),
    Words(Vec<String>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HotwordError {
    #[error("hotword = true is not meaningful; use false, a word, or a list of words")]
    EnabledWithoutWord,
}

impl TryFrom<HotwordSetting> for HotwordConfig {
    type Error = HotwordError;

    fn try_from(setting: HotwordSetting) -> Result<Self, Self::Error> {
        match setting {
            HotwordSetting::Toggle(false) => Ok(HotwordConfig::Disabled),
            HotwordSetting::Toggle(true) => Err(HotwordError::EnabledWithoutWord),
            HotwordSetting::Word(word) => Ok(HotwordConfig::Word(word)),
            HotwordSetting::Words(words) => Ok(HotwordConfig::from(words)),
        }
    }
}

impl From<HotwordConfig> for HotwordSetting {
    fn from(config: HotwordConfig) -> Self {
        match config {
            HotwordConfig::Disabled => HotwordSetting::Toggle(false),
            HotwordConfig::Word(word) => HotwordSetting::Word(word),
            HotwordConfig::Words(words) => HotwordSetting::Words(words),
        }
    }
}
