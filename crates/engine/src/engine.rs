//! The sync engine: one instance per channel, coordinating imports and
//! exports between the local store and the remote platform.

use std::sync::Arc;

use tracing::instrument;

use crate::identity::IdentityMap;
use crate::models::Channel;
use crate::remote::{ConnectionStatus, RemoteApi, RemoteFault, RemoteSession};
use crate::resolver::ResolveCtx;
use crate::store::LocalStore;
use crate::watermark::WindowTracker;

/// Reconciliation engine for a single channel.
///
/// Holds the channel configuration, the local store, and the remote API
/// factory. Sessions are opened per operation and dropped as soon as the
/// operation completes; nothing here keeps a connection alive between
/// calls.
pub struct SyncEngine {
    pub(crate) channel: Channel,
    pub(crate) store: Arc<dyn LocalStore>,
    pub(crate) remote: Arc<dyn RemoteApi>,
    pub(crate) identity: IdentityMap,
    pub(crate) windows: WindowTracker,
}

impl SyncEngine {
    /// Build an engine for `channel` backed by `store` and `remote`.
    #[must_use]
    pub fn new(channel: Channel, store: Arc<dyn LocalStore>, remote: Arc<dyn RemoteApi>) -> Self {
        let identity = IdentityMap::new(Arc::clone(&store));
        let windows = WindowTracker::new(Arc::clone(&store));
        Self {
            channel,
            store,
            remote,
            identity,
            windows,
        }
    }

    /// The channel this engine reconciles.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Open a fresh session against the remote platform.
    pub(crate) async fn session(&self) -> Result<Box<dyn RemoteSession>, RemoteFault> {
        self.remote.connect(&self.channel).await
    }

    /// Resolution context borrowing this engine's parts and `session`.
    pub(crate) fn ctx<'a>(&'a self, session: &'a dyn RemoteSession) -> ResolveCtx<'a> {
        ResolveCtx {
            store: &self.store,
            identity: &self.identity,
            channel: &self.channel,
            session,
        }
    }

    /// Probe the remote platform with the channel's credentials.
    ///
    /// Opens a session and drops it again. Transient faults report the
    /// endpoint as unreachable, anything else as rejected credentials or
    /// a broken endpoint.
    #[instrument(skip(self), fields(channel = %self.channel.id))]
    pub async fn test_connection(&self) -> ConnectionStatus {
        match self.session().await {
            Ok(_session) => ConnectionStatus::Connected,
            Err(fault) if fault.is_transient() => ConnectionStatus::Unreachable {
                detail: fault.to_string(),
            },
            Err(fault) => ConnectionStatus::Rejected {
                detail: fault.to_string(),
            },
        }
    }
}
