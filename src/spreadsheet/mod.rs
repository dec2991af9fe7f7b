pub mod loader;
pub mod table;
pub mod writer;

pub use loader::SheetCache;
pub use writer::persist_assignment;
