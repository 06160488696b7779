use crate::error::SaveError;
use crate::model::{CycleToken, Id, WriteStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Terminal status of one region's playlist write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionOutcome {
    pub region_id: Id,
    pub status: WriteStatus,
}

/// Summary of one submit cycle, produced once nothing is pending or queued.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReport {
    pub cycle: CycleToken,
    pub screen_id: Id,
    pub primary: WriteStatus,
    /// `Idle` when no group payload was captured or the primary write failed.
    pub groups: WriteStatus,
    /// In drain order.
    pub regions: Vec<RegionOutcome>,
    #[serde(skip)]
    pub errors: Vec<SaveError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SaveReport {
    pub(crate) fn begin(cycle: CycleToken, screen_id: Id) -> Self {
        let now = Utc::now();
        Self {
            cycle,
            screen_id,
            primary: WriteStatus::Pending,
            groups: WriteStatus::Idle,
            regions: Vec::new(),
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.primary == WriteStatus::Succeeded
    }

    pub fn failed_regions(&self) -> impl Iterator<Item = &Id> {
        self.regions
            .iter()
            .filter(|outcome| outcome.status == WriteStatus::Failed)
            .map(|outcome| &outcome.region_id)
    }
}
