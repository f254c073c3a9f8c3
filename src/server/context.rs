//! Shared, read-only collaborators handed to every session.

use config::ConfigError;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use crate::auth::{CredentialVerifier, verifier_for};
use crate::config::ServerConfig;
use crate::storage::{Filesystem, LocalFilesystem};

/// Everything a session needs besides its own connection state.
pub struct SessionContext {
    pub config: ServerConfig,
    pub bind_ip: IpAddr,
    pub passive_ip: Ipv4Addr,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub filesystem: Arc<dyn Filesystem>,
}

impl SessionContext {
    /// Builds the default collaborators: the local disk below `server_root`
    /// and the configured user table.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let verifier = verifier_for(&config.users);
        let filesystem = Arc::new(LocalFilesystem::new(config.server_root_path()));
        Self::with_capabilities(config, verifier, filesystem)
    }

    pub fn with_capabilities(
        config: ServerConfig,
        verifier: Arc<dyn CredentialVerifier>,
        filesystem: Arc<dyn Filesystem>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let bind_ip = config
            .bind_ip()
            .ok_or_else(|| ConfigError::Message("invalid bind_address".into()))?;
        let passive_ip = config
            .passive_ip()
            .ok_or_else(|| ConfigError::Message("invalid passive_address".into()))?;

        Ok(Self {
            config,
            bind_ip,
            passive_ip,
            verifier,
            filesystem,
        })
    }
}
