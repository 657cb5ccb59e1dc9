//! Authentication primitives for Booker: password hashing, session tokens,
//! and token-to-identity resolution.

pub mod error;
pub mod guard;
pub mod password;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use guard::{Authenticator, SubjectResolver};
pub use password::PasswordHasher;
pub use token::{Claims, IssuedToken, TokenConfig, TokenManager};
