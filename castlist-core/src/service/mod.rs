mod persons;
pub mod validate;

pub use persons::{
    DUPLICATE_PROBE_LIMIT, PersonExistence, PersonPayload, PersonsExistence,
    PersonsService,
};
