//! Authentication validator
//!
//! The credential check consulted by USER and PASS. It is a capability so
//! sessions can be driven without any real authentication backend.

use std::collections::HashMap;
use std::sync::Arc;

use super::credentials::StaticCredentials;

/// Decides whether a username and password are acceptable.
pub trait CredentialVerifier: Send + Sync {
    fn verify_user(&self, username: &str) -> bool;
    fn verify_password(&self, username: &str, password: &str) -> bool;
}

/// Accepts every login.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl CredentialVerifier for AcceptAll {
    fn verify_user(&self, _username: &str) -> bool {
        true
    }

    fn verify_password(&self, _username: &str, _password: &str) -> bool {
        true
    }
}

/// Picks the verifier for a configured user table: everyone is accepted
/// when the table is empty.
pub fn verifier_for(users: &HashMap<String, String>) -> Arc<dyn CredentialVerifier> {
    if users.is_empty() {
        Arc::new(AcceptAll)
    } else {
        Arc::new(StaticCredentials::new(users.clone()))
    }
}
