//! # Castlist Core
//!
//! Person records for a media catalog: sparse predicate compilation, the
//! person lifecycle service, photo ingestion and deletion notifications.
//!
//! ## Architecture
//!
//! - [`query`]: compiles field-set records into parameterized SQL fragments
//! - [`database`]: the `PersonsRepository` port with PostgreSQL and in-memory adapters
//! - [`image`]: validate/resize/store pipeline over pluggable processor and blob store ports
//! - [`events`]: fire-and-forget `person_deleted` notifications
//! - [`service`]: `PersonsService`, the orchestration layer used by transports
#![allow(missing_docs)]

pub mod database;
pub mod error;
pub mod events;
pub mod image;
pub mod query;
pub mod service;

pub use error::{CatalogError, ErrorKind, Result};
pub use service::{PersonPayload, PersonsService};

/// Embedded schema migrations for the `persons` table.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
