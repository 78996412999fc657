use crate::models::{Property, PropertyType};
use crate::search::filter::normalize;
use crate::search::history::SearchHistory;
use serde::Serialize;

pub const MAX_SUGGESTIONS: usize = 8;
pub const MIN_SUGGEST_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    City,
    PropertyType,
    Title,
    History,
}

/// Type-ahead entry for the search box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    /// Text placed in the search box when picked
    pub text: String,
    pub label: String,
}

impl Suggestion {
    fn new(kind: SuggestionKind, text: &str) -> Self {
        let label = match kind {
            SuggestionKind::City => format!("{} (city)", text),
            SuggestionKind::PropertyType => format!("{} (type)", capitalize(text)),
            SuggestionKind::Title => text.to_string(),
            SuggestionKind::History => format!("{} (recent)", text),
        };
        Self {
            kind,
            text: text.to_string(),
            label,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Suggestions for a partially typed term: cities, then types, then listing
/// titles, then past searches.
pub fn suggest(properties: &[Property], history: &SearchHistory, term: &str) -> Vec<Suggestion> {
    let needle = normalize(term);
    if needle.chars().count() < MIN_SUGGEST_CHARS {
        return Vec::new();
    }
    let hit = |text: &str| normalize(text).contains(&needle);

    let cities = properties
        .iter()
        .map(|p| p.city.as_str())
        .filter(|city| !city.is_empty() && hit(city))
        .map(|city| Suggestion::new(SuggestionKind::City, city));

    let types = PropertyType::ALL
        .into_iter()
        .filter(|t| hit(t.as_str()) || hit(t.cms_label()))
        .map(|t| Suggestion::new(SuggestionKind::PropertyType, t.cms_label()));

    let titles = properties
        .iter()
        .map(|p| p.title.as_str())
        .filter(|title| !title.is_empty() && hit(title))
        .map(|title| Suggestion::new(SuggestionKind::Title, title));

    let past = history
        .matching(term)
        .map(|entry| Suggestion::new(SuggestionKind::History, entry));

    let mut suggestions: Vec<Suggestion> = Vec::new();
    for candidate in cities.chain(types).chain(titles).chain(past) {
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
        let duplicate = suggestions
            .iter()
            .any(|s| s.kind == candidate.kind && s.text == candidate.text);
        if !duplicate {
            suggestions.push(candidate);
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, title: &str, city: &str) -> Property {
        Property {
            title: title.to_string(),
            city: city.to_string(),
            ..Property::new(id)
        }
    }

    #[test]
    fn test_short_term_gives_nothing() {
        let props = vec![listing("1", "Casa", "Cascavel")];
        assert!(suggest(&props, &SearchHistory::new(), "c").is_empty());
    }

    #[test]
    fn test_kinds_in_order_without_duplicates() {
        let props = vec![
            listing("1", "Casa com piscina", "Cascavel"),
            listing("2", "Casarão histórico", "Cascavel"),
        ];
        let mut history = SearchHistory::new();
        history.record("casas baratas");

        let found = suggest(&props, &history, "cas");
        let kinds: Vec<SuggestionKind> = found.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SuggestionKind::City,
                SuggestionKind::PropertyType,
                SuggestionKind::Title,
                SuggestionKind::Title,
                SuggestionKind::History,
            ]
        );
        assert_eq!(found[0].label, "Cascavel (city)");
        assert_eq!(found[1].label, "Casa (type)");
    }

    #[test]
    fn test_capped_and_accent_insensitive() {
        let props: Vec<Property> = (0..20)
            .map(|i| listing(&i.to_string(), &format!("Imóvel {}", i), ""))
            .collect();
        let found = suggest(&props, &SearchHistory::new(), "imovel");
        assert_eq!(found.len(), MAX_SUGGESTIONS);
        assert!(found.iter().all(|s| s.kind == SuggestionKind::Title));
    }
}
