//! Argument-shape checks applied before any store call.

use castlist_model::PersonID;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CatalogError, Result};

/// Characters accepted in an id-list parameter.
static ID_LIST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[!-&+,0-9]+$").expect("id list regex should compile")
});

/// Strip quotes and surrounding whitespace from a raw id list.
pub fn normalize_id_list(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

/// Parse a comma separated id list.
///
/// The list must be non-empty and only contain characters from
/// [`ID_LIST_PATTERN`]; tokens that are not decimal integers are dropped.
pub fn parse_id_list(raw: &str) -> Result<Vec<PersonID>> {
    let normalized = normalize_id_list(raw);
    if normalized.is_empty() {
        return Err(CatalogError::invalid_argument_for_user(
            "invalid param value, param mustn't be empty",
        ));
    }
    if !ID_LIST_PATTERN.is_match(&normalized) {
        return Err(CatalogError::invalid_argument_for_user(
            "invalid param value, param must contain only digits and commas",
        ));
    }

    Ok(normalized
        .split(',')
        .filter_map(|token| token.parse::<i32>().ok())
        .map(PersonID)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ids(raw: &[i32]) -> Vec<PersonID> {
        raw.iter().copied().map(PersonID).collect()
    }

    #[test]
    fn parses_quoted_and_padded_lists() {
        assert_eq!(parse_id_list(" \"1,2,3\" ").expect("parse"), ids(&[1, 2, 3]));
    }

    #[test]
    fn drops_tokens_that_are_not_numbers() {
        assert_eq!(parse_id_list("1,!,2,,&3").expect("parse"), ids(&[1, 2]));
        assert_eq!(parse_id_list("+5").expect("parse"), ids(&[5]));
    }

    #[test]
    fn rejects_empty_and_foreign_characters() {
        for raw in ["", "  ", "\"\"", "1;2", "1, 2", "abc", "-1"] {
            let err = parse_id_list(raw).expect_err(raw);
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{raw:?}");
        }
    }
}
