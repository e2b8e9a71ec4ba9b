//! Human-readable work order ids: `WO-<YYYYMMDD>-<suffix>`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockroom_core::WorkOrderId;

/// Number of hex characters in a generated suffix.
pub const SUFFIX_LEN: usize = 4;

/// Source of the short random part of an order id.
///
/// Suffixes are not guaranteed unique; callers retry on collision.
pub trait SuffixSource: Send + Sync {
    fn next_suffix(&self) -> String;
}

/// Default suffix source: the first hex characters of a random UUIDv4.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> String {
        let mut suffix = Uuid::new_v4().simple().to_string();
        suffix.truncate(SUFFIX_LEN);
        suffix
    }
}

pub fn order_id(created_at: DateTime<Utc>, suffix: &str) -> WorkOrderId {
    WorkOrderId::from_string(format!("WO-{}-{}", created_at.format("%Y%m%d"), suffix))
}
