//! Storage effect handlers
//!
//! `FilesystemStorageHandler` is the durable store used on device;
//! `MemoryStorageHandler` backs runtimes without a writable data directory
//! (web previews), where state is intentionally lost on restart.

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemStorageHandler;
pub use memory::MemoryStorageHandler;
