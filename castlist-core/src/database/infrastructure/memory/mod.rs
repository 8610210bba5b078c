mod persons;

pub use persons::InMemoryPersonsRepository;
