//! Folder view and document import for the reMarkable tablet's document store.
//!
//! See [`storage`] for the record layout and the main types.

pub mod event;
pub mod id;
pub mod parse;
pub mod storage;

pub use storage::{Error, Result};
