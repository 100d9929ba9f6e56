pub mod dto;
mod repository;
pub mod response;
mod router;

pub use router::{AppState, create_router};
