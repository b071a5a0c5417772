//! Multi-term text matching.
//!
//! The unified `search` operation does not use name patterns; it takes free
//! text split on whitespace into terms, each of which must (or, with
//! `match_any`, may) appear as a substring. Whole-word matching additionally
//! requires that neither neighbor of an occurrence is an identifier character.

/// A compiled multi-term text matcher.
pub struct TermMatcher {
    terms: Vec<String>,
    case_sensitive: bool,
    whole_words: bool,
    match_any: bool,
}

impl TermMatcher {
    /// Compiles `search_text` into a matcher. Terms are whitespace-separated;
    /// with no terms the matcher never matches.
    #[must_use]
    pub fn new(
        search_text: &str,
        case_sensitive: bool,
        match_whole_words: bool,
        match_any: bool,
    ) -> Self {
        let terms = search_text
            .split_whitespace()
            .map(|term| {
                if case_sensitive {
                    term.to_string()
                } else {
                    term.to_lowercase()
                }
            })
            .collect();
        TermMatcher {
            terms,
            case_sensitive,
            whole_words: match_whole_words,
            match_any,
        }
    }

    /// Returns `true` if `text` satisfies the term set: every term found
    /// (implicit AND), or any term found when `match_any` is set. Empty text
    /// never matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        if text.is_empty() || self.terms.is_empty() {
            return false;
        }
        let haystack = if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        };
        if self.match_any {
            self.terms.iter().any(|term| self.contains_term(&haystack, term))
        } else {
            self.terms.iter().all(|term| self.contains_term(&haystack, term))
        }
    }

    fn contains_term(&self, haystack: &str, term: &str) -> bool {
        if term.is_empty() {
            return false;
        }
        let mut search_from = 0;
        while let Some(found) = haystack[search_from..].find(term) {
            let index = search_from + found;
            if !self.whole_words || is_whole_word(haystack, index, term.len()) {
                return true;
            }
            search_from = index + term.len();
        }
        false
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_whole_word(haystack: &str, index: usize, length: usize) -> bool {
    let left_ok = haystack[..index]
        .chars()
        .next_back()
        .map_or(true, |ch| !is_word_char(ch));
    let right_ok = haystack[index + length..]
        .chars()
        .next()
        .map_or(true, |ch| !is_word_char(ch));
    left_ok && right_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_boundaries() {
        let matcher = TermMatcher::new("Run", false, true, false);
        assert!(!matcher.is_match("PreRun"));
        assert!(!matcher.is_match("Runner"));
        assert!(matcher.is_match("Run Fast"));
        assert!(matcher.is_match("Fast.Run"));
        assert!(matcher.is_match("Run"));
    }

    #[test]
    fn test_all_terms_required_by_default() {
        let matcher = TermMatcher::new("load module", false, false, false);
        assert!(matcher.is_match("LoadModuleFromDisk"));
        assert!(!matcher.is_match("LoadAssembly"));
    }

    #[test]
    fn test_match_any() {
        let matcher = TermMatcher::new("load save", false, false, true);
        assert!(matcher.is_match("SaveGame"));
        assert!(matcher.is_match("LoadGame"));
        assert!(!matcher.is_match("DeleteGame"));
    }

    #[test]
    fn test_empty_inputs_never_match() {
        let matcher = TermMatcher::new("", false, false, false);
        assert!(!matcher.is_match("anything"));

        let matcher = TermMatcher::new("term", false, false, false);
        assert!(!matcher.is_match(""));
    }

    #[test]
    fn test_case_sensitivity() {
        let sensitive = TermMatcher::new("Run", true, false, false);
        assert!(!sensitive.is_match("running"));
        assert!(sensitive.is_match("Running"));

        let insensitive = TermMatcher::new("Run", false, false, false);
        assert!(insensitive.is_match("running"));
    }

    #[test]
    fn test_whole_word_underscore_is_word_char() {
        let matcher = TermMatcher::new("size", false, true, false);
        assert!(!matcher.is_match("item_size"));
        assert!(matcher.is_match("item-size"));
    }

    #[test]
    fn test_whole_word_scans_past_partial_hits() {
        // The first occurrence is embedded in an identifier, the second stands
        // alone; the matcher must not give up after the first.
        let matcher = TermMatcher::new("run", false, true, false);
        assert!(matcher.is_match("rerun run"));
    }
}
