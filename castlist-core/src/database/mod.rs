pub mod infrastructure;
pub mod ports;

pub use infrastructure::memory::InMemoryPersonsRepository;
pub use infrastructure::postgres::{
    PoolStats, PostgresDatabase, PostgresPersonsRepository,
};
pub use ports::persons::PersonsRepository;
