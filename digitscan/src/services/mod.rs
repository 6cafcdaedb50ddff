mod upload;

pub use upload::{UploadFailure, UploadService};
