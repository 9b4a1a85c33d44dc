// src/bot/session.rs — Per-user conversational state

use serde::{Deserialize, Serialize};

use super::action::PendingAction;
use crate::core::{Period, PeriodData};

pub type UserId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    #[serde(default)]
    pub data: PeriodData,
    /// Full copy of `data` taken before a destructive change; one level deep.
    #[serde(default)]
    pub backup: PeriodData,
    /// Period being assembled across several replies.
    #[serde(default)]
    pub temp: Option<Period>,
    /// 0-based index of the period being edited.
    #[serde(default)]
    pub editing_index: Option<usize>,
    #[serde(default)]
    pub pending: PendingAction,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn with_data(user_id: UserId, data: PeriodData) -> Self {
        Self {
            user_id,
            data,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn snapshot(&mut self) {
        self.backup = self.data.clone();
    }

    /// Replace all periods, keeping the previous ones for `undo`.
    pub fn replace_data(&mut self, data: PeriodData) {
        self.snapshot();
        self.data = data;
        self.editing_index = None;
    }

    /// Restore the last snapshot. Returns false when there is nothing to restore.
    pub fn undo(&mut self) -> bool {
        if self.backup == PeriodData::default() {
            return false;
        }
        self.data = std::mem::take(&mut self.backup);
        self.editing_index = None;
        self.clear_pending();
        true
    }

    pub fn reset(&mut self) {
        self.data = PeriodData::default();
        self.backup = PeriodData::default();
        self.editing_index = None;
        self.clear_pending();
    }

    pub fn clear_pending(&mut self) {
        self.pending = PendingAction::Idle;
        self.temp = None;
    }

    /// The editing index, if it still points at an existing period.
    pub fn editing(&self) -> Option<usize> {
        self.editing_index.filter(|&i| i < self.data.len())
    }
}
