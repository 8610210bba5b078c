//! Sparse field-set records.
//!
//! Every attribute is optional: `None` means "not provided" and is never part
//! of a generated predicate or partial update. Raw transport values should be
//! passed through [`present`] so an empty string is treated the same as a
//! missing one.

use chrono::NaiveDate;

/// Normalise a raw string into a field value; empty strings are absent.
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Search / dedup predicate over the descriptive person attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchPersonParams {
    pub fullname_ru: Option<String>,
    pub fullname_en: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<String>,
}

impl SearchPersonParams {
    pub fn is_empty(&self) -> bool {
        self.fullname_ru.is_none()
            && self.fullname_en.is_none()
            && self.birthday.is_none()
            && self.sex.is_none()
    }
}

/// Values for a new person row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePersonParams {
    pub fullname_ru: Option<String>,
    pub fullname_en: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<String>,
    pub photo_id: Option<String>,
}

/// Values for an update of an existing person row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePersonParams {
    pub fullname_ru: Option<String>,
    pub fullname_en: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<String>,
    pub photo_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_not_present() {
        assert_eq!(present(Some(String::new())), None);
        assert_eq!(present(None), None);
        assert_eq!(present(Some("M".into())), Some("M".into()));
    }

    #[test]
    fn any_present_field_makes_a_predicate() {
        assert!(SearchPersonParams::default().is_empty());
        let params = SearchPersonParams {
            sex: Some("F".into()),
            ..Default::default()
        };
        assert!(!params.is_empty());
    }
}
