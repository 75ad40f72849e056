use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category the prompt engine can be asked to guard against (`prompt_guard`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFilter {
    Defamation,
    Privacy,
    Hate,
    SexualContent,
    Elections,
    CodeInterpreterAbuse,
    // Misspelling is the engine's wire name.
    #[serde(rename = "indiscrimate_weapons")]
    IndiscriminateWeapons,
    SpecializedAdvice,
}

impl ContentFilter {
    /// Display order on the page.
    pub const ALL: [ContentFilter; 8] = [
        ContentFilter::Defamation,
        ContentFilter::Privacy,
        ContentFilter::Hate,
        ContentFilter::SexualContent,
        ContentFilter::Elections,
        ContentFilter::CodeInterpreterAbuse,
        ContentFilter::IndiscriminateWeapons,
        ContentFilter::SpecializedAdvice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentFilter::Defamation => "defamation",
            ContentFilter::Privacy => "privacy",
            ContentFilter::Hate => "hate",
            ContentFilter::SexualContent => "sexual_content",
            ContentFilter::Elections => "elections",
            ContentFilter::CodeInterpreterAbuse => "code_interpreter_abuse",
            ContentFilter::IndiscriminateWeapons => "indiscrimate_weapons",
            ContentFilter::SpecializedAdvice => "specialized_advice",
        }
    }
}

impl fmt::Display for ContentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown content filter: {0}")]
pub struct UnknownFilter(pub String);

impl FromStr for ContentFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

/// Add `filter` if absent, remove it if present. Returns whether it is now selected.
pub fn toggle(selected: &mut Vec<ContentFilter>, filter: ContentFilter) -> bool {
    if let Some(pos) = selected.iter().position(|f| *f == filter) {
        selected.remove(pos);
        false
    } else {
        selected.push(filter);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut selected = Vec::new();
        assert!(toggle(&mut selected, ContentFilter::Hate));
        assert_eq!(selected, vec![ContentFilter::Hate]);
        assert!(!toggle(&mut selected, ContentFilter::Hate));
        assert!(selected.is_empty());
    }

    #[test]
    fn toggle_twice_restores_original_selection() {
        let original = vec![ContentFilter::Privacy, ContentFilter::Elections];
        for filter in ContentFilter::ALL {
            let mut selected = original.clone();
            toggle(&mut selected, filter);
            toggle(&mut selected, filter);
            let mut a = selected.clone();
            let mut b = original.clone();
            a.sort_by_key(|f| f.as_str());
            b.sort_by_key(|f| f.as_str());
            assert_eq!(a, b, "filter {filter}");
        }
    }

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for filter in ContentFilter::ALL {
            assert_eq!(filter.as_str().parse::<ContentFilter>(), Ok(filter));
        }
    }

    #[test]
    fn serde_uses_engine_spelling() {
        let json = serde_json::to_string(&ContentFilter::IndiscriminateWeapons).unwrap();
        assert_eq!(json, "\"indiscrimate_weapons\"");
    }

    #[test]
    fn unknown_filter_is_rejected() {
        assert!("violence".parse::<ContentFilter>().is_err());
    }
}
