//! Buyer-facing listing descriptions.
//!
//! The listing's own sentences are reordered so that whatever matched the
//! buyer is read first. Nothing is invented, so prices, sizes and addresses
//! stay exactly as the agent wrote them.

use crate::core::explain::{COMMUNITY_STOPWORDS, OUTDOOR_KEYWORDS, TRANSPORT_KEYWORDS};
use crate::core::parsing::{contains_word, tokens};
use crate::models::{Listing, PreferenceField, PreferenceSchema};

const BEDROOM_KEYWORDS: &[&str] = &["bedroom", "bed", "studio"];
const BATHROOM_KEYWORDS: &[&str] = &["bathroom", "en-suite", "ensuite", "shower"];

/// Words too vague to tie a sentence to a must-have feature
const GENERIC_FEATURE_WORDS: &[&str] = &["feature", "features", "modern", "good"];

/// Describe a listing with the sentences behind `fields` first
///
/// `fields` are the explained preference fields in the order they were
/// explained (buyer priorities first). Sentences from the description and
/// the area description are grouped by the first field they mention; the
/// rest follow in their written order. When no sentence mentions any field
/// the original description is returned unchanged.
pub fn personalize_description(
    prefs: &PreferenceSchema,
    listing: &Listing,
    fields: &[PreferenceField],
) -> String {
    let mut sentences = split_sentences(&listing.description);
    sentences.extend(split_sentences(&listing.area_description));

    let mut taken = vec![false; sentences.len()];
    let mut ordered: Vec<&str> = Vec::with_capacity(sentences.len());

    for field in fields {
        let keywords = field_keywords(*field, prefs, listing);
        if keywords.is_empty() {
            continue;
        }
        for (idx, sentence) in sentences.iter().enumerate() {
            if !taken[idx] && keywords.iter().any(|k| mentions(sentence, k)) {
                taken[idx] = true;
                ordered.push(*sentence);
            }
        }
    }

    if ordered.is_empty() {
        return listing.description.clone();
    }

    ordered.extend(
        sentences
            .iter()
            .zip(&taken)
            .filter(|(_, taken)| !**taken)
            .map(|(sentence, _)| *sentence),
    );
    ordered.join(" ")
}

/// Words whose presence ties a sentence to a preference field
fn field_keywords(field: PreferenceField, prefs: &PreferenceSchema, listing: &Listing) -> Vec<String> {
    let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();
    let significant = |phrase: &str, skip: &[&str]| {
        tokens(phrase)
            .into_iter()
            .filter(|t| t.len() > 3 && !skip.contains(&t.as_str()))
            .collect::<Vec<_>>()
    };

    match field {
        PreferenceField::PropertyType => significant(&listing.property_type, &[]),
        PreferenceField::Area => vec![listing.area.trim().to_lowercase()],
        PreferenceField::Bedrooms => owned(BEDROOM_KEYWORDS),
        PreferenceField::Bathrooms => owned(BATHROOM_KEYWORDS),
        PreferenceField::OutdoorSpace => owned(OUTDOOR_KEYWORDS),
        PreferenceField::Transport => owned(TRANSPORT_KEYWORDS),
        PreferenceField::Features => prefs
            .must_have_features
            .iter()
            .flat_map(|f| significant(f, GENERIC_FEATURE_WORDS))
            .collect(),
        PreferenceField::Community => prefs
            .community_type
            .as_deref()
            .map(|c| significant(c, COMMUNITY_STOPWORDS))
            .unwrap_or_default(),
        PreferenceField::Amenities => prefs
            .amenities
            .iter()
            .flat_map(|a| significant(a, &[]))
            .collect(),
        // Prices are not repeated in prose
        PreferenceField::Budget => Vec::new(),
    }
}

/// Whole-word match, also inside hyphenated words ("two-bedroom")
fn mentions(sentence: &str, keyword: &str) -> bool {
    if keyword.contains(' ') || keyword.contains('-') {
        return sentence.to_lowercase().contains(keyword);
    }
    contains_word(sentence, keyword)
        || sentence
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w == keyword || w.strip_suffix('s') == Some(keyword))
}

fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') && bytes.get(idx + 1).map_or(true, u8::is_ascii_whitespace) {
            let sentence = text[start..=idx].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = idx + 1;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn create_listing() -> Listing {
        Listing {
            id: "clapham_2".to_string(),
            area: "Clapham".to_string(),
            postcode: "SW4 7AA".to_string(),
            price: 575_000,
            bedrooms: 2,
            bathrooms: 1,
            size_sqft: Some(720),
            property_type: "modern flat".to_string(),
            description: "Spacious two-bedroom flat on a quiet street. Private roof terrace with skyline views. \
                          Five minutes from Clapham Common tube station."
                .to_string(),
            area_description: "Lively area with bars and restaurants.".to_string(),
            structured_amenities: BTreeSet::new(),
            structured_features: BTreeSet::new(),
            category: None,
        }
    }

    #[test]
    fn test_matching_sentences_lead_in_field_order() {
        let prefs = PreferenceSchema {
            outdoor_space: Some("roof terrace".to_string()),
            top_priorities: vec!["transport".to_string()],
            ..Default::default()
        };

        let text = personalize_description(
            &prefs,
            &create_listing(),
            &[PreferenceField::Transport, PreferenceField::OutdoorSpace],
        );

        assert_eq!(
            text,
            "Five minutes from Clapham Common tube station. Private roof terrace with skyline views. \
             Spacious two-bedroom flat on a quiet street. Lively area with bars and restaurants."
        );
    }

    #[test]
    fn test_hyphenated_words_and_amenities() {
        let prefs = PreferenceSchema {
            amenities: ["restaurants".to_string()].into_iter().collect(),
            ..Default::default()
        };

        let text = personalize_description(
            &prefs,
            &create_listing(),
            &[PreferenceField::Amenities, PreferenceField::Bedrooms],
        );

        assert!(text.starts_with(
            "Lively area with bars and restaurants. Spacious two-bedroom flat on a quiet street."
        ));
    }

    #[test]
    fn test_falls_back_to_original_description() {
        let listing = create_listing();

        let text = personalize_description(&PreferenceSchema::default(), &listing, &[PreferenceField::Budget]);
        assert_eq!(text, listing.description);

        let text = personalize_description(&PreferenceSchema::default(), &listing, &[]);
        assert_eq!(text, listing.description);
    }

    #[test]
    fn test_every_sentence_kept_once() {
        let prefs = PreferenceSchema::default();
        let listing = create_listing();
        let text = personalize_description(
            &prefs,
            &listing,
            &[PreferenceField::Area, PreferenceField::Transport, PreferenceField::Bedrooms],
        );

        // The tube sentence names Clapham and a station; it must appear once
        assert_eq!(text.matches("tube station").count(), 1);
        assert_eq!(text.split(". ").count(), 4);
        assert!(text.starts_with("Five minutes from Clapham Common tube station."));
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("Price £1.2m. Garden! Near the tube? Yes"),
            vec!["Price £1.2m.", "Garden!", "Near the tube?", "Yes"]
        );
        assert!(split_sentences("   ").is_empty());
    }
}
