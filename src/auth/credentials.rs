//! Credential storage
//!
//! A username/password table loaded from configuration.

use std::collections::HashMap;

use super::validator::CredentialVerifier;

/// Verifies logins against a fixed username → password table.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify_user(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    fn verify_password(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| stored == password)
    }
}
