use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use stockroom_catalog::{
    Item, ItemFilter, ItemPatch, Location, NewItem, NewLocation, NewUser, User,
};
use stockroom_core::{CoreError, CoreResult, ItemId, LocationId, UserId, require};

use crate::store::{Store, Transaction};

use super::{adjust_in_tx, normalize_batch, now};

/// An item together with the location it currently sits at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub location: Option<Location>,
}

/// Item, location and user registry.
#[derive(Debug)]
pub struct Catalog<S> {
    store: Arc<S>,
}

impl<S> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> Catalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, new), fields(sku = %new.sku), err)]
    pub async fn create_item(&self, mut new: NewItem) -> CoreResult<Item> {
        normalize_batch(&mut new.batch);
        let item = Item::create(ItemId::new(), new, now())?;

        let mut tx = self.store.begin().await?;
        if let Some(location_id) = item.location_id {
            require(tx.location(location_id).await?, &location_id)?;
        }
        tx.insert_item(&item).await?;
        tx.commit().await?;

        info!(item_id = %item.id, quantity = item.quantity, "item created");
        Ok(item)
    }

    pub async fn get_item(&self, id: ItemId) -> CoreResult<Item> {
        let mut tx = self.store.begin().await?;
        require(tx.item(id).await?, &id)
    }

    pub async fn get_item_detail(&self, id: ItemId) -> CoreResult<ItemDetail> {
        let mut tx = self.store.begin().await?;
        let item = require(tx.item(id).await?, &id)?;
        let location = match item.location_id {
            Some(location_id) => tx.location(location_id).await?,
            None => None,
        };
        Ok(ItemDetail { item, location })
    }

    #[instrument(skip(self, patch), err)]
    pub async fn update_item(&self, id: ItemId, mut patch: ItemPatch) -> CoreResult<Item> {
        if let Some(batch) = patch.batch.as_mut() {
            normalize_batch(batch);
        }
        let mut tx = self.store.begin().await?;
        let mut item = require(tx.item_for_update(id).await?, &id)?;
        item.apply_patch(patch, now())?;
        tx.update_item(&item).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Remove an item. Its movement history is kept.
    #[instrument(skip(self), err)]
    pub async fn delete_item(&self, id: ItemId) -> CoreResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_item(id).await? {
            return Err(CoreError::not_found("item", id));
        }
        tx.commit().await?;
        info!(item_id = %id, "item deleted");
        Ok(())
    }

    pub async fn list_items(&self, filter: ItemFilter) -> CoreResult<Vec<Item>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.items(&filter).await?)
    }

    pub async fn categories(&self) -> CoreResult<Vec<String>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.categories().await?)
    }

    /// Apply a stock delta: `quantity += delta`, refusing to go below zero.
    #[instrument(skip(self), err)]
    pub async fn adjust_quantity(&self, id: ItemId, delta: i64) -> CoreResult<Item> {
        let mut tx = self.store.begin().await?;
        let item = adjust_in_tx(&mut tx, id, delta, now()).await?;
        tx.commit().await?;
        info!(item_id = %id, delta, quantity = item.quantity, "stock adjusted");
        Ok(item)
    }

    #[instrument(skip(self, new), fields(code = %new.code), err)]
    pub async fn create_location(&self, new: NewLocation) -> CoreResult<Location> {
        let location = Location::create(LocationId::new(), new, now())?;
        let mut tx = self.store.begin().await?;
        tx.insert_location(&location).await?;
        tx.commit().await?;
        Ok(location)
    }

    pub async fn get_location(&self, id: LocationId) -> CoreResult<Location> {
        let mut tx = self.store.begin().await?;
        require(tx.location(id).await?, &id)
    }

    pub async fn list_locations(&self) -> CoreResult<Vec<Location>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.locations().await?)
    }

    #[instrument(skip(self, new), fields(username = %new.username, role = %new.role), err)]
    pub async fn create_user(&self, new: NewUser) -> CoreResult<User> {
        let user = User::create(UserId::new(), new, now())?;
        let mut tx = self.store.begin().await?;
        tx.insert_user(&user).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> CoreResult<User> {
        let mut tx = self.store.begin().await?;
        require(tx.user(id).await?, &id)
    }
}
