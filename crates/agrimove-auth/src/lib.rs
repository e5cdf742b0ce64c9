mod authenticator;
mod middleware;
mod password;
mod store;
mod token;

pub use authenticator::Authenticator;
pub use middleware::{unauthorized_response, AuthLayer, AuthService, CurrentUser, CREDENTIALS_DETAIL};
pub use password::{PasswordHasher, DEFAULT_ITERATIONS};
pub use store::InMemoryCredentialStore;
pub use token::{TokenManager, DEFAULT_TTL_MINUTES};
