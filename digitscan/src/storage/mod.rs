//! Upload storage.
//!
//! `filename` derives collision-resistant, traversal-free names from whatever
//! the client sent; `store` writes and serves files under one root directory.

mod filename;
mod store;

pub use filename::{allowed_file, secure_filename, unique_name, TIMESTAMP_FORMAT};
pub use store::{ImageStore, StoredFile};
