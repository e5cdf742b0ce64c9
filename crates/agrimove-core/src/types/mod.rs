mod identity;
mod token;
mod transport;

pub use identity::*;
pub use token::*;
pub use transport::*;
