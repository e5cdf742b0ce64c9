mod error;
pub mod rest;
mod router;

pub use error::{ApiError, ErrorResponse, INVALID_FIELDS_DETAIL, LOGIN_FAILED_DETAIL, NOT_FOUND_DETAIL};
pub use router::{ApiRouter, ApiState};
