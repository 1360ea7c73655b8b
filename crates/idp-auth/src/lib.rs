//! # idp-auth
//!
//! The two capabilities protocol flows delegate rather than implement:
//!
//! - [`PasswordVerifier`] - checks a submitted password against a stored hash
//!   (Argon2id via [`PasswordHasherService`])
//! - [`ClaimsSigner`] - turns a claim set into a compact token
//!   (HS256 JWT via [`Hs256ClaimsSigner`])
//!
//! Both are object-safe traits so the server can swap implementations
//! without touching the protocol crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod password;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use password::{PasswordHasherService, PasswordPolicy, PasswordVerifier};
pub use token::{Claims, ClaimsSigner, Hs256ClaimsSigner};
