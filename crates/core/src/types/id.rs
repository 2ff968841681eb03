//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use storebridge_core::define_id;
/// define_id!(ChannelId);
/// define_id!(WebsiteId);
///
/// let channel_id = ChannelId::new(1);
/// let website_id = WebsiteId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ChannelId = website_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(ChannelId);
define_id!(WebsiteId);
define_id!(StoreId);
define_id!(StoreViewId);
define_id!(CategoryId);
define_id!(ProductId);
define_id!(ListingId);
define_id!(OrderId);
define_id!(OrderLineId);
define_id!(ShipmentId);
define_id!(CarrierId);
define_id!(OrderStateId);
define_id!(TaxId);
define_id!(PriceListId);
define_id!(StockLocationId);
define_id!(IssueId);

/// An identifier assigned by the remote platform.
///
/// Remote ids share one numeric space per entity kind on the remote side, so
/// a single wrapper is used for all of them; the local side always pairs a
/// `RemoteId` with the scope that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(i64);

impl RemoteId {
    /// Create a new remote ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying i64 value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RemoteId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RemoteId> for i64 {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_id!(TestId);

    #[test]
    fn test_id_round_trip() {
        let id = TestId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(TestId::from(42), id);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ChannelId::new(7).to_string(), "7");
        assert_eq!(RemoteId::new(9000).to_string(), "9000");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = WebsiteId::new(3);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "3");
        let back: WebsiteId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
