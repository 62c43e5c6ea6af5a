pub mod memory;
pub mod notion;

pub use memory::MemoryStore;
pub use notion::NotionStore;
