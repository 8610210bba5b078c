mod http;
mod memory;

pub use http::HttpBlobStore;
pub use memory::MemoryBlobStore;
