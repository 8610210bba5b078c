use chrono::NaiveDate;

use crate::{error::ModelError, ids::PersonID};

/// Date format used for birthdays at the API boundary.
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// A person row as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Person {
    pub id: PersonID,
    pub fullname_ru: String,
    pub fullname_en: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<String>,
    pub photo_id: Option<String>,
}

impl Person {
    /// Birthday rendered as `YYYY-MM-DD`, or an empty string when unknown.
    pub fn birthday_string(&self) -> String {
        self.birthday
            .map(|date| date.format(BIRTHDAY_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Project the row into its API shape. `photo_url` is resolved by the
    /// caller because it depends on blob store configuration.
    pub fn into_view(self, photo_url: String) -> PersonView {
        let birthday = self.birthday_string();
        PersonView {
            id: self.id,
            fullname_ru: self.fullname_ru,
            fullname_en: self.fullname_en.unwrap_or_default(),
            birthday,
            sex: self.sex.unwrap_or_default(),
            photo_url,
        }
    }
}

/// API-facing person projection. Absent values are rendered as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersonView {
    pub id: PersonID,
    pub fullname_ru: String,
    pub fullname_en: String,
    pub birthday: String,
    pub sex: String,
    pub photo_url: String,
}

/// Parse an optional `YYYY-MM-DD` birthday; empty input means "absent".
pub fn parse_birthday(raw: Option<&str>) -> Result<Option<NaiveDate>, ModelError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, BIRTHDAY_FORMAT)
            .map(Some)
            .map_err(|_| ModelError::InvalidDate(value.to_string())),
    }
}
