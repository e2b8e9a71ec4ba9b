use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CoreError, CoreResult, Entity, LocationId};

/// Warehouse location (row / section / shelf), addressed by a unique code such as `LOC-A1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub code: String,
    pub description: String,
    pub row: String,
    pub section: String,
    pub shelf: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Location {
    type Id = LocationId;
    const KIND: &'static str = "location";

    fn id(&self) -> &LocationId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub row: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub shelf: String,
}

impl Location {
    pub fn create(id: LocationId, new: NewLocation, now: DateTime<Utc>) -> CoreResult<Self> {
        let code = new.code.trim();
        if code.is_empty() {
            return Err(CoreError::validation("location code cannot be empty"));
        }
        Ok(Self {
            id,
            code: code.to_string(),
            description: new.description,
            row: new.row,
            section: new.section,
            shelf: new.shelf,
            created_at: now,
            updated_at: now,
        })
    }
}
