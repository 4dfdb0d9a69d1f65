//! Microsoft Graph directory client for groupsync.
//!
//! Wraps the handful of Graph API operations group reconciliation needs:
//! group lookup, transitive membership listings, owned-device listings,
//! batched member adds and single-member removes. Every call goes through
//! a shared [`AuthContext`] that owns the bearer token and a process-wide
//! reauthentication ceiling.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use groupsync_graph::{AuthContext, ClientAuth, Credentials, GraphClient, TokenAudience};
//!
//! # async fn example() -> groupsync_graph::GraphResult<()> {
//! let credentials = Credentials {
//!     tenant_id: "your-tenant-id".to_string(),
//!     client_id: "your-client-id".to_string(),
//!     auth: ClientAuth::Secret("your-client-secret".to_string().into()),
//! };
//!
//! let auth = Arc::new(AuthContext::new(credentials, TokenAudience::Graph));
//! let client = GraphClient::new(auth)?;
//! let group = client.get_group("group-object-id").await?;
//! println!("{}", group.display_name);
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod devices;
mod error;
mod groups;

/// Production Graph API base URL.
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Production login endpoint for token acquisition.
pub const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";

// Re-exports
pub use auth::{AuthContext, ClientAuth, Credentials, TokenAudience, REFRESH_LIMIT};
pub use client::{GraphClient, ODataResponse};
pub use devices::DeviceRecord;
pub use error::{GraphError, GraphResult};
pub use groups::{GroupRecord, MemberRecord, MemberType, ADD_BATCH_CEILING};
