pub mod files;
pub mod health;
pub mod upload;

pub use files::get_upload;
pub use health::{health_check, ping, root};
pub use upload::upload_image;
