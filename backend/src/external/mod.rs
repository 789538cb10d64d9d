//! External service integrations

pub mod object_storage;

pub use object_storage::{ObjectStoragePresigner, PresignError, PutObject};
