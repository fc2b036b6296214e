pub mod actor;
mod deadlines;
mod delegate;
pub mod dto;
mod options;
pub mod response;
mod router;
mod rows;
mod sheets;
pub mod validation;

pub use router::{AppState, create_router};
