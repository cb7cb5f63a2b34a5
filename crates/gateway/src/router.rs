//! Keyword-based intent classifier.

use agent_mesh_core::config::RoutingConfig;
use agent_mesh_core::traits::{IntentCategory, IntentClassifier};

/// Classifies free text by substring match against a keyword list.
///
/// Matching is case-insensitive on the trimmed message. Empty keywords never
/// match, so an empty list classifies nothing.
pub struct KeywordIntentClassifier {
    keywords: Vec<String>,
}

impl KeywordIntentClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Classifier over the configured tool-use keywords.
    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.tool_keywords.iter().cloned())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Add a custom keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into().to_lowercase();
        if !keyword.is_empty() {
            self.keywords.push(keyword);
        }
        self
    }

    fn matched(&self, text: &str) -> Option<&str> {
        let lower = text.trim().to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, text: &str) -> Option<IntentCategory> {
        let keyword = self.matched(text)?;
        tracing::debug!(keyword, "Message matched tool-use keyword");
        Some(IntentCategory::ToolUse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_keywords_match_case_insensitive() {
        let classifier = KeywordIntentClassifier::default();
        assert_eq!(classifier.classify("Please ECHO this back"), Some(IntentCategory::ToolUse));
        assert_eq!(classifier.classify("  Hello there"), Some(IntentCategory::ToolUse));
        assert_eq!(classifier.classify("what is my portfolio worth"), None);
    }

    #[test]
    fn test_keywords_follow_routing_config() {
        let default = KeywordIntentClassifier::default();
        assert_eq!(default.keywords(), RoutingConfig::default().tool_keywords.as_slice());

        let config = RoutingConfig {
            tool_keywords: vec!["Weather".into()],
            ..RoutingConfig::default()
        };
        let classifier = KeywordIntentClassifier::from_config(&config);
        assert_eq!(classifier.classify("what's the weather"), Some(IntentCategory::ToolUse));
        assert_eq!(classifier.classify("please echo this"), None);
    }

    #[test]
    fn test_trailing_space_keyword() {
        let classifier = KeywordIntentClassifier::default();
        // "hello " needs a following character after trimming
        assert_eq!(classifier.classify("hello"), None);
    }

    #[test]
    fn test_empty_keywords_never_match() {
        let classifier = KeywordIntentClassifier::new(Vec::<String>::new()).with_keyword("");
        assert_eq!(classifier.classify("greet me"), None);
        assert_eq!(classifier.classify(""), None);
    }
}
