use tracing::debug;

/// Decides whether a configured keyword triggers on a message.
///
/// Exact mode is a plain case-sensitive substring check. Fuzzy mode accepts
/// the keyword as a case-insensitive subsequence of the text, or, for
/// keywords longer than two characters, either two-character end of the
/// keyword appearing verbatim. Fuzzy mode is loose on short keywords: "群聊"
/// matches any message with 群 somewhere before 聊.
#[derive(Debug, Clone, Copy)]
pub struct KeywordMatcher {
    fuzzy: bool,
}

impl KeywordMatcher {
    pub fn new(fuzzy: bool) -> Self {
        Self { fuzzy }
    }

    pub fn matches(&self, keyword: &str, text: &str) -> bool {
        if !self.fuzzy {
            return text.contains(keyword);
        }

        if is_subsequence(keyword, text) {
            debug!("Fuzzy match: keyword '{}' in '{}'", keyword, text);
            return true;
        }

        if affix_match(keyword, text) {
            debug!("Partial match: keyword '{}' in '{}'", keyword, text);
            return true;
        }

        false
    }
}

/// Every character of `keyword` appears in `text` in the same order,
/// ignoring case.
fn is_subsequence(keyword: &str, text: &str) -> bool {
    let mut haystack = text.chars().flat_map(char::to_lowercase);
    keyword
        .chars()
        .flat_map(char::to_lowercase)
        .all(|k| haystack.any(|c| c == k))
}

/// The first two or last two characters of `keyword` occur in `text`.
/// Only applies to keywords of three characters or more.
fn affix_match(keyword: &str, text: &str) -> bool {
    let Some((head_end, _)) = keyword.char_indices().nth(2) else {
        return false;
    };
    let Some((tail_start, _)) = keyword.char_indices().rev().nth(1) else {
        return false;
    };

    text.contains(&keyword[..head_end]) || text.contains(&keyword[tail_start..])
}
