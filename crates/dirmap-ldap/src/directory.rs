//! `ldap3`-backed implementation of the directory-search channel.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use dirmap_core::directory::{DirectoryEntry, DirectoryService, SearchReply};
use dirmap_core::error::DirectoryError;

use crate::config::LdapConfig;

/// LDAP result code for invalid bind credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Directory-search channel over a cached LDAP connection.
///
/// The connection is established lazily on first search and reused across
/// engine calls; a transport-level search failure drops it so the next
/// call reconnects. The offline flag is a cheap atomic the owning service
/// toggles; the engine consults it before doing any work.
pub struct LdapDirectory {
    config: LdapConfig,
    connection: Arc<RwLock<Option<Ldap>>>,
    offline: AtomicBool,
}

impl LdapDirectory {
    /// Create a channel over the given configuration.
    pub fn new(config: LdapConfig) -> Result<Self, DirectoryError> {
        config.validate()?;
        Ok(Self {
            config,
            connection: Arc::new(RwLock::new(None)),
            offline: AtomicBool::new(false),
        })
    }

    /// The channel configuration.
    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Mark the directory offline or online. While offline the engine
    /// refuses batches without touching them.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    async fn get_connection(&self) -> Result<Ldap, DirectoryError> {
        {
            let guard = self.connection.read().await;
            if let Some(conn) = guard.as_ref() {
                return Ok(conn.clone());
            }
        }

        let conn = self.connect().await?;
        *self.connection.write().await = Some(conn.clone());
        Ok(conn)
    }

    async fn connect(&self) -> Result<Ldap, DirectoryError> {
        let url = self.config.url();
        debug!(url = %url, "connecting to directory");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.config.connect_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                DirectoryError::connection_failed_with_source(
                    format!("failed to connect to {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "directory connection driver error");
            }
        });

        let password = self.config.bind_password.as_deref().unwrap_or("");
        debug!(bind_dn = %self.config.bind_dn, "binding to directory");

        let result = ldap
            .simple_bind(&self.config.bind_dn, password)
            .await
            .map_err(|e| {
                DirectoryError::connection_failed_with_source(
                    format!("bind request failed for {}", self.config.bind_dn),
                    e,
                )
            })?;

        if result.rc != 0 {
            if result.rc == RC_INVALID_CREDENTIALS {
                return Err(DirectoryError::BindFailed {
                    message: "invalid credentials".to_string(),
                });
            }
            return Err(DirectoryError::BindFailed {
                message: format!("bind failed with code {}: {}", result.rc, result.text),
            });
        }

        info!(host = %self.config.host, "directory connection established");
        self.offline.store(false, Ordering::Relaxed);
        Ok(ldap)
    }

    async fn drop_connection(&self) {
        *self.connection.write().await = None;
    }
}

/// Convert an LDAP search entry into the engine's opaque entry form.
fn convert_entry(entry: SearchEntry) -> DirectoryEntry {
    DirectoryEntry {
        dn: entry.dn,
        attrs: entry.attrs,
        bin_attrs: entry.bin_attrs,
    }
}

#[async_trait]
impl DirectoryService for LdapDirectory {
    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    async fn search(
        &self,
        filter: &str,
        attributes: &[&str],
    ) -> Result<SearchReply, DirectoryError> {
        let mut ldap = self.get_connection().await?;
        let attrs: Vec<String> = attributes.iter().map(|a| a.to_string()).collect();

        let result = match ldap
            .search(&self.config.base_dn, Scope::Subtree, filter, attrs)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                // Transport failure: force a reconnect on the next call.
                self.drop_connection().await;
                return Err(DirectoryError::search_failed_with_source(
                    "search request failed",
                    e,
                ));
            }
        };

        let (entries, _res) = result.success().map_err(|e| {
            DirectoryError::search_failed(format!("search returned failure: {e}"))
        })?;

        debug!(count = entries.len(), "directory search complete");
        Ok(SearchReply::new(
            entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(convert_entry)
                .collect(),
        ))
    }
}
