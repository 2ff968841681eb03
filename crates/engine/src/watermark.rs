//! Incremental sync windows.
//!
//! Each incremental pipeline tracks the last time it ran in a keyed
//! watermark table: one timestamp per (scope, kind). Opening a window reads
//! the stored watermark, advances it to now and persists it before any
//! record is processed. A crash mid-run therefore skips the unprocessed
//! remainder of the window instead of importing it twice; the next full
//! sync picks the stragglers up.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use storebridge_core::{ChannelId, StoreViewId};

use crate::store::{LocalStore, StoreError};

/// What a watermark is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncScope {
    /// A channel-wide pipeline.
    Channel(ChannelId),
    /// A pipeline running per store view.
    StoreView(StoreViewId),
}

impl fmt::Display for SyncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "channel:{id}"),
            Self::StoreView(id) => write!(f, "store_view:{id}"),
        }
    }
}

/// Which pipeline a watermark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkKind {
    /// Incremental order import.
    OrderImport,
    /// Incremental order status export.
    OrderExport,
    /// Incremental shipment export.
    ShipmentExport,
}

impl fmt::Display for WatermarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OrderImport => "order_import",
            Self::OrderExport => "order_export",
            Self::ShipmentExport => "shipment_export",
        };
        f.write_str(name)
    }
}

/// An open incremental window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    /// Lower bound of the window, `None` on the first run.
    pub since: Option<DateTime<Utc>>,
    /// When the window was opened; also the new watermark.
    pub opened_at: DateTime<Utc>,
}

/// Opens incremental windows against the watermark table.
#[derive(Clone)]
pub struct WindowTracker {
    store: Arc<dyn LocalStore>,
}

impl WindowTracker {
    /// Create a tracker over a watermark store.
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Open a window ending now.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the watermark cannot be read or written.
    pub async fn open_window(
        &self,
        scope: SyncScope,
        kind: WatermarkKind,
    ) -> Result<SyncWindow, StoreError> {
        self.open_window_at(scope, kind, Utc::now()).await
    }

    /// Open a window ending at `now`.
    ///
    /// The stored watermark never moves backwards: if `now` is behind it,
    /// the watermark stays put and the window lower bound still comes from
    /// the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the watermark cannot be read or written.
    pub async fn open_window_at(
        &self,
        scope: SyncScope,
        kind: WatermarkKind,
        now: DateTime<Utc>,
    ) -> Result<SyncWindow, StoreError> {
        let current = self.store.watermark(scope, kind).await?;
        let advanced = current.map_or(now, |mark| mark.max(now));
        self.store.set_watermark(scope, kind, advanced).await?;
        debug!(%scope, %kind, since = ?current, "Opened sync window");
        Ok(SyncWindow {
            since: current.map(truncate_to_seconds),
            opened_at: now,
        })
    }
}

/// Drop the sub-second part of a timestamp.
///
/// The remote side filters on whole seconds, so the window lower bound is
/// widened rather than narrowed: a record stamped inside the truncated
/// second is seen again rather than missed.
#[must_use]
pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}
