//! Wildcard and regex pattern matching.
//!
//! Every name-matching operation funnels through [`PatternMatcher`]: a pattern
//! string plus two flags compile into a single predicate over strings. Wildcard
//! patterns are anchored full-string matches (`*` and `?` placeholders); regex
//! patterns are passed to the regex engine as-is, giving substring semantics
//! unless the caller anchors them.

use regex::{Regex, RegexBuilder};

use crate::Result;

/// A compiled name pattern.
#[derive(Debug)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Compiles a pattern.
    ///
    /// An empty pattern is treated as `"*"` and matches everything. When
    /// `use_regex` is false, `*` matches zero or more characters, `?` matches
    /// exactly one, and everything else is literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`](crate::Error::InvalidParameter)
    /// with the compiler's diagnostic text when the pattern does not compile.
    pub fn compile(pattern: &str, use_regex: bool, case_sensitive: bool) -> Result<Self> {
        let pattern = if pattern.is_empty() { "*" } else { pattern };
        let source = if use_regex {
            pattern.to_string()
        } else {
            wildcard_to_regex(pattern)
        };
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|err| invalid_param_error!("Invalid pattern: {err}"))?;
        Ok(PatternMatcher { regex })
    }

    /// Returns `true` if `text` matches the compiled pattern. Empty text never
    /// matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        !text.is_empty() && self.regex.is_match(text)
    }
}

fn wildcard_to_regex(pattern: &str) -> String {
    let escaped = regex::escape(pattern);
    format!("^{}$", escaped.replace("\\*", ".*").replace("\\?", "."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_star() {
        let matcher = PatternMatcher::compile("*Foo*", false, true).unwrap();
        assert!(matcher.is_match("xFoox"));
        assert!(matcher.is_match("Foo"));
        assert!(!matcher.is_match("Fo"));
    }

    #[test]
    fn test_wildcard_question_mark() {
        let matcher = PatternMatcher::compile("?oo", false, true).unwrap();
        assert!(matcher.is_match("Zoo"));
        assert!(!matcher.is_match("Zooo"));
        assert!(!matcher.is_match("oo"));
    }

    #[test]
    fn test_wildcard_is_anchored() {
        let matcher = PatternMatcher::compile("Foo", false, true).unwrap();
        assert!(matcher.is_match("Foo"));
        assert!(!matcher.is_match("xFoo"));
        assert!(!matcher.is_match("Foox"));
    }

    #[test]
    fn test_wildcard_escapes_regex_metacharacters() {
        let matcher = PatternMatcher::compile("Get(Value)", false, true).unwrap();
        assert!(matcher.is_match("Get(Value)"));
        assert!(!matcher.is_match("GetValue"));
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let matcher = PatternMatcher::compile("", false, true).unwrap();
        assert!(matcher.is_match("anything"));
        assert!(!matcher.is_match(""));
    }

    #[test]
    fn test_case_sensitivity() {
        let sensitive = PatternMatcher::compile("foo*", false, true).unwrap();
        assert!(!sensitive.is_match("FooBar"));

        let insensitive = PatternMatcher::compile("foo*", false, false).unwrap();
        assert!(insensitive.is_match("FooBar"));
    }

    #[test]
    fn test_regex_mode() {
        let matcher = PatternMatcher::compile("^System\\..*Attribute$", true, true).unwrap();
        assert!(matcher.is_match("System.SerializableAttribute"));
        assert!(!matcher.is_match("Game.SerializableAttribute"));
    }

    #[test]
    fn test_invalid_regex_is_invalid_parameter() {
        let err = PatternMatcher::compile("(unclosed", true, true).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidParameter(_)));
    }
}
