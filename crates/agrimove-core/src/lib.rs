pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, FieldError, Result, ValidationErrors};
pub use traits::*;
pub use types::*;
