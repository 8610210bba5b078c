use crate::error::ModelError;
use std::str::FromStr;

/// Store-assigned identifier of a person record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct PersonID(pub i32);

impl From<i32> for PersonID {
    fn from(raw: i32) -> Self {
        PersonID(raw)
    }
}

impl From<PersonID> for i32 {
    fn from(id: PersonID) -> Self {
        id.0
    }
}

impl FromStr for PersonID {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(PersonID)
            .map_err(|_| ModelError::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for PersonID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
