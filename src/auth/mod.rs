//! Authentication system
//!
//! Pluggable credential verification for USER/PASS.

pub mod credentials;
pub mod validator;

pub use credentials::StaticCredentials;
pub use validator::{AcceptAll, CredentialVerifier, verifier_for};
