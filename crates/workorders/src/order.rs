use core::str::FromStr;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CoreError, CoreResult, Entity, ItemId, UserId, WorkOrderId};

/// Unit symbol used when a line leaves the unit blank.
pub const DEFAULT_LINE_UNIT: &str = "pcs";

/// Work order status lifecycle: `draft → pending → collecting → ready → issued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderStatus {
    Draft,
    Pending,
    Collecting,
    Ready,
    Issued,
}

impl WorkOrderStatus {
    /// Position in the forward lifecycle.
    pub fn rank(self) -> u8 {
        match self {
            WorkOrderStatus::Draft => 0,
            WorkOrderStatus::Pending => 1,
            WorkOrderStatus::Collecting => 2,
            WorkOrderStatus::Ready => 3,
            WorkOrderStatus::Issued => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkOrderStatus::Draft => "draft",
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::Collecting => "collecting",
            WorkOrderStatus::Ready => "ready",
            WorkOrderStatus::Issued => "issued",
        }
    }
}

impl core::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(WorkOrderStatus::Draft),
            "pending" => Ok(WorkOrderStatus::Pending),
            "collecting" => Ok(WorkOrderStatus::Collecting),
            "ready" => Ok(WorkOrderStatus::Ready),
            "issued" => Ok(WorkOrderStatus::Issued),
            other => Err(CoreError::validation(format!("unknown work order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "normal" => Ok(Priority::Normal),
            "urgent" => Ok(Priority::Urgent),
            other => Err(CoreError::validation(format!("unknown priority '{other}'"))),
        }
    }
}

/// Picking status of a single requested part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    #[default]
    Pending,
    Collected,
    NotFound,
}

impl LineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LineStatus::Pending => "pending",
            LineStatus::Collected => "collected",
            LineStatus::NotFound => "not_found",
        }
    }
}

impl FromStr for LineStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(LineStatus::Pending),
            "collected" => Ok(LineStatus::Collected),
            "not_found" => Ok(LineStatus::NotFound),
            other => Err(CoreError::validation(format!("unknown line status '{other}'"))),
        }
    }
}

/// Order line: one requested part. Identified by `(order id, line_no)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderLine {
    pub line_no: u32,
    /// Catalog reference; `None` when the part is not stocked.
    pub item_id: Option<ItemId>,
    pub name: String,
    pub part_number: String,
    pub unit: String,
    pub quantity: i64,
    pub justification: String,
    pub photo_url: Option<String>,
    pub status: LineStatus,
}

/// Aggregate root: WorkOrder, exclusively owning its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub mechanic_id: Option<UserId>,
    pub equipment: String,
    pub equipment_number: String,
    pub work_type: String,
    pub priority: Priority,
    pub description: String,
    pub status: WorkOrderStatus,
    pub lines: Vec<WorkOrderLine>,
    /// Set once, by the issuance routine.
    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for WorkOrder {
    type Id = WorkOrderId;
    const KIND: &'static str = "work order";

    fn id(&self) -> &WorkOrderId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    #[serde(default)]
    pub item_id: Option<ItemId>,
    pub name: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: i64,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkOrder {
    pub equipment: String,
    pub equipment_number: String,
    pub work_type: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mechanic_id: Option<UserId>,
    pub lines: Vec<NewLine>,
}

impl NewWorkOrder {
    /// Check required fields before any id is allocated or store is touched.
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("equipment", &self.equipment),
            ("equipment_number", &self.equipment_number),
            ("work_type", &self.work_type),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::validation(format!("{field} cannot be empty")));
            }
        }
        if self.lines.is_empty() {
            return Err(CoreError::validation("work order needs at least one line"));
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if line.name.trim().is_empty() {
                return Err(CoreError::validation(format!("line {} has no name", idx + 1)));
            }
            if line.quantity < 1 {
                return Err(CoreError::validation(format!(
                    "line {} quantity must be at least 1",
                    idx + 1
                )));
            }
        }
        Ok(())
    }

    /// Catalog items referenced by the lines (in line order, possibly repeated).
    pub fn referenced_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.lines.iter().filter_map(|l| l.item_id)
    }
}

/// Outcome of a status overwrite, used by the caller to flag suspicious transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: WorkOrderStatus,
    pub to: WorkOrderStatus,
}

impl StatusChange {
    /// Moving to an earlier lifecycle stage (e.g. `issued → draft`).
    pub fn is_backwards(&self) -> bool {
        self.to.rank() < self.from.rank()
    }
}

/// Listing filter for work orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub mechanic_id: Option<UserId>,
}

impl OrderFilter {
    pub fn matches(&self, order: &WorkOrder) -> bool {
        match self.mechanic_id {
            Some(mechanic) => order.mechanic_id == Some(mechanic),
            None => true,
        }
    }
}

impl WorkOrder {
    pub fn create(id: WorkOrderId, new: NewWorkOrder, now: DateTime<Utc>) -> CoreResult<Self> {
        new.validate()?;

        let lines = new
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let unit = line.unit.trim();
                WorkOrderLine {
                    line_no: idx as u32 + 1,
                    item_id: line.item_id,
                    name: line.name.trim().to_string(),
                    part_number: line.part_number.trim().to_string(),
                    unit: if unit.is_empty() {
                        DEFAULT_LINE_UNIT.to_string()
                    } else {
                        unit.to_string()
                    },
                    quantity: line.quantity,
                    justification: line.justification,
                    photo_url: line.photo_url.filter(|p| !p.trim().is_empty()),
                    status: LineStatus::Pending,
                }
            })
            .collect();

        Ok(Self {
            id,
            mechanic_id: new.mechanic_id,
            equipment: new.equipment.trim().to_string(),
            equipment_number: new.equipment_number.trim().to_string(),
            work_type: new.work_type.trim().to_string(),
            priority: new.priority.unwrap_or_default(),
            description: new.description,
            status: WorkOrderStatus::Pending,
            lines,
            issued_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn items_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether stock has already been issued for this order.
    pub fn is_issued(&self) -> bool {
        self.status == WorkOrderStatus::Issued || self.issued_at.is_some()
    }

    /// Overwrite the status. Any transition is accepted; the returned change
    /// tells the caller whether it ran backwards.
    pub fn set_status(&mut self, to: WorkOrderStatus, now: DateTime<Utc>) -> StatusChange {
        let change = StatusChange {
            from: self.status,
            to,
        };
        self.status = to;
        self.updated_at = now;
        change
    }

    pub fn set_line_status(
        &mut self,
        line_no: u32,
        status: LineStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let order_id = &self.id;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == line_no)
            .ok_or_else(|| CoreError::not_found("work order line", format!("{order_id}#{line_no}")))?;
        line.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Stock to decrement on issue, summed per catalog item.
    ///
    /// Entries come out in ascending item id order. Issuers lock item rows in
    /// this order, so two orders sharing parts never wait on each other in a
    /// cycle.
    pub fn stock_demand(&self) -> Vec<(ItemId, i64)> {
        let mut demand: BTreeMap<ItemId, i64> = BTreeMap::new();
        for line in &self.lines {
            if let Some(item) = line.item_id {
                *demand.entry(item).or_default() += line.quantity;
            }
        }
        demand.into_iter().collect()
    }

    pub fn ensure_issuable(&self) -> CoreResult<()> {
        if self.is_issued() {
            return Err(CoreError::invalid_state(format!(
                "work order {} already issued",
                self.id
            )));
        }
        Ok(())
    }

    pub fn mark_issued(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_issuable()?;
        self.status = WorkOrderStatus::Issued;
        self.issued_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}
