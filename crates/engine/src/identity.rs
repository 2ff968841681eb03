//! Identity mapping between remote ids and local entities.
//!
//! Every remote entity is identified by its id within a scope (channel for
//! categories and products, channel plus reference prefix for orders). The
//! map is append-only: once a remote id is linked to a local entity the
//! link never changes, so repeated imports converge on the same rows.

use std::sync::Arc;

use storebridge_core::{CategoryId, ChannelId, ProductId, RemoteId};

use crate::models::{Category, CategoryLink, Channel, Listing, Order, Product};
use crate::store::{LocalStore, StoreError};

/// Lookup and linking of remote ids against the local store.
#[derive(Clone)]
pub struct IdentityMap {
    store: Arc<dyn LocalStore>,
}

impl IdentityMap {
    /// Create an identity map over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// The local category a remote category id is linked to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DataCorruption`] when a link points at a
    /// category that no longer exists.
    pub async fn category(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<Category>, StoreError> {
        let Some(link) = self.store.category_link(channel, remote).await? else {
            return Ok(None);
        };
        match self.store.category(link.category_id).await {
            Ok(category) => Ok(Some(category)),
            Err(StoreError::NotFound) => Err(StoreError::DataCorruption(format!(
                "category link {remote} points at missing category {}",
                link.category_id
            ))),
            Err(err) => Err(err),
        }
    }

    /// The remote id a local category is linked to, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lookup fails.
    pub async fn category_external(
        &self,
        channel: ChannelId,
        category: CategoryId,
    ) -> Result<Option<RemoteId>, StoreError> {
        Ok(self
            .store
            .category_link_for(channel, category)
            .await?
            .map(|link| link.remote_id))
    }

    /// Link a remote category id to a local category.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when either side is already linked.
    pub async fn link_category(
        &self,
        channel: ChannelId,
        remote: RemoteId,
        category: CategoryId,
    ) -> Result<CategoryLink, StoreError> {
        self.store
            .create_category_link(CategoryLink {
                channel_id: channel,
                remote_id: remote,
                category_id: category,
            })
            .await
    }

    /// The local product a remote product id is listed as.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DataCorruption`] when a listing points at a
    /// product that no longer exists.
    pub async fn product(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<Product>, StoreError> {
        let Some(listing) = self.store.listing(channel, remote).await? else {
            return Ok(None);
        };
        match self.store.product(listing.product_id).await {
            Ok(product) => Ok(Some(product)),
            Err(StoreError::NotFound) => Err(StoreError::DataCorruption(format!(
                "listing {remote} points at missing product {}",
                listing.product_id
            ))),
            Err(err) => Err(err),
        }
    }

    /// The listing of a local product on a channel, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lookup fails.
    pub async fn listing_for(
        &self,
        channel: ChannelId,
        product: ProductId,
    ) -> Result<Option<Listing>, StoreError> {
        self.store.listing_for_product(channel, product).await
    }

    /// The local order imported for a remote increment id, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lookup fails.
    pub async fn order_by_external(
        &self,
        channel: &Channel,
        increment_id: &str,
    ) -> Result<Option<Order>, StoreError> {
        let reference = channel.order_reference(increment_id);
        self.store.order_by_reference(channel.id, &reference).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::CreateCategoryInput;
    use crate::store::memory::MemoryStore;

    fn map() -> (Arc<MemoryStore>, IdentityMap) {
        let store = Arc::new(MemoryStore::new());
        let identity = IdentityMap::new(store.clone());
        (store, identity)
    }

    #[tokio::test]
    async fn test_category_link_round_trip() {
        let (store, identity) = map();
        let channel = ChannelId::new(1);
        let category = store
            .create_category(CreateCategoryInput {
                name: "Books".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();

        identity
            .link_category(channel, RemoteId::new(12), category.id)
            .await
            .unwrap();

        let found = identity
            .category(channel, RemoteId::new(12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, category.id);
        assert_eq!(
            identity
                .category_external(channel, category.id)
                .await
                .unwrap(),
            Some(RemoteId::new(12))
        );
    }

    #[tokio::test]
    async fn test_category_links_are_append_only() {
        let (store, identity) = map();
        let channel = ChannelId::new(1);
        let books = store
            .create_category(CreateCategoryInput {
                name: "Books".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();
        let games = store
            .create_category(CreateCategoryInput {
                name: "Games".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();

        identity
            .link_category(channel, RemoteId::new(12), books.id)
            .await
            .unwrap();
        let err = identity
            .link_category(channel, RemoteId::new(12), games.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // The original link survives.
        let found = identity
            .category(channel, RemoteId::new(12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, books.id);
    }

    #[tokio::test]
    async fn test_unlinked_remote_id_is_none() {
        let (_store, identity) = map();
        let found = identity
            .category(ChannelId::new(1), RemoteId::new(99))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
