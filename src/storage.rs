//! Storage abstraction layer for Colloquy.
//!
//! Model artifacts are written through the [`Storage`] trait so the model
//! store does not care whether it talks to a directory on disk or to memory.
//!
//! - [`FileStorage`]: one file per artifact inside a directory
//! - [`MemoryStorage`]: in-memory map, for tests and throwaway engines
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//!
//! use colloquy::storage::{MemoryStorage, Storage};
//!
//! # fn main() -> colloquy::error::Result<()> {
//! let storage = MemoryStorage::new_default();
//!
//! let mut output = storage.create_output("greeting.bin")?;
//! output.write_all(b"hello")?;
//! output.flush_and_sync()?;
//!
//! let mut input = storage.open_input("greeting.bin")?;
//! let mut data = String::new();
//! input.read_to_string(&mut data)?;
//! assert_eq!(data, "hello");
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};
