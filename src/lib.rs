//! # Gitea Provisioner
//!
//! Provisions a Gitea account, a private repository and an access token for
//! each project of a delivery pipeline, and removes them again on request.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! gitea-provisioner = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gitea_provisioner::config::{GiteaConfig, ProvisionerConfig};
//! use gitea_provisioner::provisioner::Provisioner;
//! use gitea_provisioner::server::{AppState, create_router};
//!
//! let gitea = GiteaConfig::new("http://gitea:3000", "admin", "secret");
//! let provisioner = Provisioner::gitea(&gitea, ProvisionerConfig::default()).unwrap();
//! let router = create_router(Arc::new(AppState::new(Arc::new(provisioner))));
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `gitea-provisioner` binary.

pub mod config;
pub mod error;
pub mod host;
pub mod provisioner;
pub mod server;
