mod error;
mod handlers;
pub mod respond;
mod router;
mod types;

pub use error::{ApiError, ApiResult};
pub use router::router;
pub use types::AppState;
