use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CoreError, CoreResult, Entity, ItemId, LocationId};

/// Unit symbol used when a caller leaves the unit blank.
pub const DEFAULT_UNIT: &str = "pcs";

/// Delivery batch the current stock arrived with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub number: String,
    /// Quantity delivered with the batch (informational, never adjusted).
    pub quantity: i64,
    pub arrived_at: Option<DateTime<Utc>>,
}

/// Catalog item: a stocked part with a quantity and an optional shelf location.
///
/// `quantity` is only changed through [`Item::adjust`], and `location_id` only
/// by the movement ledger, so both stay consistent with the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub sku: String,
    pub description: String,
    pub quantity: i64,
    pub unit: String,
    pub category: String,
    pub part_number: String,
    pub batch: Batch,
    pub invoice_photo: Option<String>,
    pub location_id: Option<LocationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Item {
    type Id = ItemId;
    const KIND: &'static str = "item";

    fn id(&self) -> &ItemId {
        &self.id
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub batch: Batch,
    #[serde(default)]
    pub location_id: Option<LocationId>,
}

/// Partial update of an item's descriptive fields.
///
/// Quantity and location are deliberately absent: they move through
/// `adjust_quantity`/`issue` and `relocate` respectively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub part_number: Option<String>,
    pub batch: Option<Batch>,
    pub invoice_photo: Option<String>,
}

/// Listing filter: free-text search over name/SKU/part number plus exact category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ItemFilter {
    /// Lower-cased search needle, `None` when blank.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(category) = self.category() {
            if item.category != category {
                return false;
            }
        }
        match self.needle() {
            None => true,
            Some(needle) => [&item.name, &item.sku, &item.part_number]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle)),
        }
    }
}

fn require_text(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn normalize_unit(unit: String) -> String {
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        DEFAULT_UNIT.to_string()
    } else {
        trimmed.to_string()
    }
}

impl Item {
    /// Build a new item from validated input.
    pub fn create(id: ItemId, new: NewItem, now: DateTime<Utc>) -> CoreResult<Self> {
        require_text("name", &new.name)?;
        require_text("sku", &new.sku)?;
        if new.quantity < 0 {
            return Err(CoreError::validation("quantity cannot be negative"));
        }
        if new.batch.quantity < 0 {
            return Err(CoreError::validation("batch quantity cannot be negative"));
        }

        Ok(Self {
            id,
            name: new.name.trim().to_string(),
            sku: new.sku.trim().to_string(),
            description: new.description,
            quantity: new.quantity,
            unit: normalize_unit(new.unit),
            category: new.category.trim().to_string(),
            part_number: new.part_number.trim().to_string(),
            batch: new.batch,
            invoice_photo: None,
            location_id: new.location_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: ItemPatch, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        if let Some(sku) = &patch.sku {
            require_text("sku", sku)?;
        }
        if let Some(batch) = &patch.batch {
            if batch.quantity < 0 {
                return Err(CoreError::validation("batch quantity cannot be negative"));
            }
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(sku) = patch.sku {
            self.sku = sku.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(unit) = patch.unit {
            self.unit = normalize_unit(unit);
        }
        if let Some(category) = patch.category {
            self.category = category.trim().to_string();
        }
        if let Some(part_number) = patch.part_number {
            self.part_number = part_number.trim().to_string();
        }
        if let Some(batch) = patch.batch {
            self.batch = batch;
        }
        if let Some(photo) = patch.invoice_photo {
            self.invoice_photo = Some(photo).filter(|p| !p.trim().is_empty());
        }
        self.updated_at = now;
        Ok(())
    }

    /// Apply `quantity += delta`, refusing to go below zero.
    ///
    /// On error the item is left untouched.
    pub fn adjust(&mut self, delta: i64, now: DateTime<Utc>) -> CoreResult<()> {
        if delta == 0 {
            return Err(CoreError::validation("delta cannot be zero"));
        }
        let next = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| CoreError::validation("quantity overflow"))?;
        if next < 0 {
            return Err(CoreError::invalid_state(format!(
                "stock cannot go negative: item {} has {} {}, requested {}",
                self.sku, self.quantity, self.unit, delta
            )));
        }
        self.quantity = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn relocate(&mut self, to: LocationId, now: DateTime<Utc>) -> Option<LocationId> {
        let from = self.location_id.replace(to);
        self.updated_at = now;
        from
    }
}
