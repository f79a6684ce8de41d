//! Authentication primitives for the ordering backend: session tokens and passwords

pub mod jwt;
pub mod password;

pub use jwt::{JwtClaims, JwtError, JwtValidator, SESSION_AUDIENCE, SESSION_ISSUER};
pub use password::{check_password_policy, hash_password, verify_password, PasswordError};
