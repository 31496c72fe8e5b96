//! Security subsystem.
//!
//! # Responsibilities
//! - PBKDF2 password hashing for stored user credentials
//! - Constant-time credential comparison
//!
//! # Design Decisions
//! - Body size limits are enforced by the HTTP layer, not here
//! - Plaintext stored passwords are rejected unless explicitly allowed

pub mod password;

pub use password::{hash_password, hash_password_with, verify_password, LegacyPolicy};
