mod database;
pub mod persons;

pub use database::{PoolStats, PostgresDatabase};
pub use persons::PostgresPersonsRepository;
