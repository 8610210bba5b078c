//! Core data model definitions shared across castlist crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod fields;
pub mod ids;
pub mod person;

pub use error::{ModelError, Result as ModelResult};
pub use fields::{
    CreatePersonParams, SearchPersonParams, UpdatePersonParams, present,
};
pub use ids::PersonID;
pub use person::{BIRTHDAY_FORMAT, Person, PersonView, parse_birthday};
