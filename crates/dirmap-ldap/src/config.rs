//! LDAP directory configuration.

use serde::{Deserialize, Serialize};

use dirmap_core::error::DirectoryError;

/// Configuration for the LDAP directory channel.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Directory server hostname or IP address.
    pub host: String,

    /// Server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Upgrade a plain connection with STARTTLS.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN searches run under (e.g. "dc=example,dc=com").
    pub base_dn: String,

    /// Bind DN for authentication.
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection establishment timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

fn default_port() -> u16 {
    389
}

fn default_timeout_secs() -> u64 {
    30
}

impl LdapConfig {
    /// Create a config with required fields and defaults for the rest.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            connect_timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS) and switch to the LDAPS port.
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// The connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.host.is_empty() {
            return Err(DirectoryError::invalid_configuration("host is required"));
        }
        if self.base_dn.is_empty() {
            return Err(DirectoryError::invalid_configuration("base_dn is required"));
        }
        if self.bind_dn.is_empty() {
            return Err(DirectoryError::invalid_configuration("bind_dn is required"));
        }
        if self.use_ssl && self.use_starttls {
            return Err(DirectoryError::invalid_configuration(
                "use_ssl and use_starttls are mutually exclusive",
            ));
        }
        Ok(())
    }
}
