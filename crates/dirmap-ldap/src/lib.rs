//! # LDAP directory channel
//!
//! `ldap3`-backed implementation of the `dirmap-core` [`DirectoryService`]
//! contract: a lazily established, cached connection with simple bind,
//! subtree search under a configured base DN, and conversion of raw search
//! entries (including binary attributes) into the engine's entry form.
//!
//! ## Example
//!
//! ```ignore
//! use dirmap_core::prelude::*;
//! use dirmap_ldap::{LdapConfig, LdapDirectory};
//!
//! let config = LdapConfig::new(
//!     "dc01.example.com",
//!     "dc=example,dc=com",
//!     "cn=svc,dc=example,dc=com",
//! )
//! .with_password("secret")
//! .with_ssl();
//!
//! let directory = LdapDirectory::new(config)?;
//! let engine = MappingEngine::new(&directory);
//! engine.resolve_ids_for_objects(&mut requests).await?;
//! ```
//!
//! [`DirectoryService`]: dirmap_core::directory::DirectoryService

pub mod config;
pub mod directory;

pub use config::LdapConfig;
pub use directory::LdapDirectory;
