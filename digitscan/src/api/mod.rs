pub mod dto;
mod extractors;
pub mod handlers;
mod middleware;
pub mod openapi;
mod routes;
mod state;

pub use extractors::{ImageForm, IMAGE_FIELD};
pub use routes::create_router;
pub use state::AppState;
