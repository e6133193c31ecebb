//! "Other, please specify" choice options
//!
//! A choice whose label names an "other" option reveals a free-text field.
//! The stored answer is `"<label>: <text>"`, or the bare label while the
//! text is empty. A label that itself ends in `": "` followed by text is
//! indistinguishable from a filled-in other option; the receiving workflow
//! expects this format, so it is kept as is.

/// Lowercased fragments that mark an option as "other"
const OTHER_SYNONYMS: &[&str] = &["other", "others", "อื่นๆ", "อื่น ๆ", "อื่น", "โปรดระบุ"];

const SEPARATOR: &str = ": ";

/// An "other" option and the free text entered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherSelection<'a> {
    pub label: &'a str,
    pub text: &'a str,
}

/// Whether an option label is an "other" option
pub fn is_other_option(label: &str) -> bool {
    let lower = label.to_lowercase();
    OTHER_SYNONYMS.iter().any(|synonym| lower.contains(synonym))
}

/// Stored form of an "other" option with its free text
pub fn encode_other(label: &str, text: &str) -> String {
    if text.trim().is_empty() {
        label.to_string()
    } else {
        format!("{label}{SEPARATOR}{text}")
    }
}

/// Recover the "other" option and its text from a stored value
pub fn decode_other<'a>(stored: &'a str, options: &'a [String]) -> Option<OtherSelection<'a>> {
    options
        .iter()
        .filter(|option| is_other_option(option))
        .find_map(|option| {
            if stored == option {
                Some(OtherSelection {
                    label: option,
                    text: "",
                })
            } else {
                stored
                    .strip_prefix(option.as_str())
                    .and_then(|rest| rest.strip_prefix(SEPARATOR))
                    .map(|text| OtherSelection {
                        label: option,
                        text,
                    })
            }
        })
}

/// Whether a stored value selects `option`
pub fn stored_matches(stored: &str, option: &str, options: &[String]) -> bool {
    if stored == option {
        return true;
    }
    is_other_option(option) && decode_other(stored, options).is_some_and(|s| s.label == option)
}

/// Index of the option a stored value selects
pub fn selected_index(stored: &str, options: &[String]) -> Option<usize> {
    options
        .iter()
        .position(|option| stored_matches(stored, option, options))
}
