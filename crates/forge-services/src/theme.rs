//! Parser for generated theme text.
//!
//! The generation service answers with three labeled lines:
//!
//! ```text
//! THEMATIC_NAME: Force Lightning
//! FLAVOR_TEXT: "Unlimited power!"
//! ART_PROMPT: a hooded figure casting blue lightning --ar 3:5
//! ```
//!
//! Anything else in the response is ignored. Each label must appear exactly
//! once with a non-empty value that fits the themed-card limits.

use forge_core::entities::ThemedCard;

use crate::error::ParseError;

const THEMATIC_NAME: &str = "THEMATIC_NAME";
const FLAVOR_TEXT: &str = "FLAVOR_TEXT";
const ART_PROMPT: &str = "ART_PROMPT";

/// Label, character limit.
const FIELDS: [(&str, usize); 3] = [
    (THEMATIC_NAME, ThemedCard::MAX_NAME_LEN),
    (FLAVOR_TEXT, ThemedCard::MAX_FLAVOR_LEN),
    (ART_PROMPT, ThemedCard::MAX_ART_PROMPT_LEN),
];

/// Extract a [`ThemedCard`] from a generation response.
///
/// # Errors
///
/// `MissingField`, `DuplicateField` or `EmptyField` naming the offending
/// label, or `FieldTooLong` when a trimmed value exceeds its limit.
pub fn parse_theme_response(text: &str) -> Result<ThemedCard, ParseError> {
    let mut values: [Option<&str>; 3] = [None; 3];

    for line in text.lines() {
        let line = line.trim_start();
        for (slot, (label, _)) in values.iter_mut().zip(FIELDS) {
            let Some(rest) = line
                .strip_prefix(label)
                .and_then(|rest| rest.strip_prefix(':'))
            else {
                continue;
            };
            if slot.is_some() {
                return Err(ParseError::DuplicateField(label));
            }
            *slot = Some(rest.trim());
        }
    }

    let field = |index: usize| -> Result<String, ParseError> {
        let (label, max) = FIELDS[index];
        let value = values[index].ok_or(ParseError::MissingField(label))?;
        if value.is_empty() {
            return Err(ParseError::EmptyField(label));
        }
        let len = value.chars().count();
        if len > max {
            return Err(ParseError::FieldTooLong {
                field: label,
                max,
                len,
            });
        }
        Ok(value.to_string())
    };

    Ok(ThemedCard {
        thematic_name: field(0)?,
        flavor_text: field(1)?,
        art_prompt: field(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const RESPONSE: &str = "Here is your card.\n\
        THEMATIC_NAME:  Force Lightning \n\
        FLAVOR_TEXT: \"Unlimited power!\"\n\
        ART_PROMPT: a hooded figure casting blue lightning --ar 3:5\n";

    #[test]
    fn parses_labeled_lines() {
        let card = parse_theme_response(RESPONSE).unwrap();
        assert_eq!(
            card,
            ThemedCard {
                thematic_name: "Force Lightning".into(),
                flavor_text: "\"Unlimited power!\"".into(),
                art_prompt: "a hooded figure casting blue lightning --ar 3:5".into(),
            }
        );
    }

    #[test]
    fn order_does_not_matter() {
        let text = "ART_PROMPT: p\nTHEMATIC_NAME: n\nFLAVOR_TEXT: f";
        let card = parse_theme_response(text).unwrap();
        assert_eq!(card.thematic_name, "n");
        assert_eq!(card.art_prompt, "p");
    }

    #[rstest]
    #[case::no_name("FLAVOR_TEXT: f\nART_PROMPT: p", ParseError::MissingField("THEMATIC_NAME"))]
    #[case::no_prompt("THEMATIC_NAME: n\nFLAVOR_TEXT: f", ParseError::MissingField("ART_PROMPT"))]
    #[case::empty_flavor(
        "THEMATIC_NAME: n\nFLAVOR_TEXT:   \nART_PROMPT: p",
        ParseError::EmptyField("FLAVOR_TEXT")
    )]
    #[case::twice(
        "THEMATIC_NAME: n\nTHEMATIC_NAME: m\nFLAVOR_TEXT: f\nART_PROMPT: p",
        ParseError::DuplicateField("THEMATIC_NAME")
    )]
    #[case::empty_response("", ParseError::MissingField("THEMATIC_NAME"))]
    fn rejects_malformed(#[case] text: &str, #[case] expected: ParseError) {
        assert_eq!(parse_theme_response(text).unwrap_err(), expected);
    }

    #[test]
    fn rejects_overlong_name() {
        let text = format!(
            "THEMATIC_NAME: {}\nFLAVOR_TEXT: f\nART_PROMPT: p",
            "x".repeat(101)
        );
        assert_eq!(
            parse_theme_response(&text).unwrap_err(),
            ParseError::FieldTooLong {
                field: "THEMATIC_NAME",
                max: 100,
                len: 101
            }
        );
    }

    #[test]
    fn length_counts_characters() {
        let text = format!(
            "THEMATIC_NAME: {}\nFLAVOR_TEXT: f\nART_PROMPT: p",
            "é".repeat(100)
        );
        assert!(parse_theme_response(&text).is_ok());
    }
}
