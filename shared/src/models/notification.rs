//! Notification cursor models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point up to which a user has seen activity.
///
/// Passed explicitly into unread-count queries; a user who has never checked
/// has no `last_checked_at` and sees everything as new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCursor {
    pub user_id: Uuid,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl NotificationCursor {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            last_checked_at: None,
        }
    }

    /// Cursor moved to `now`
    pub fn advanced(&self, now: DateTime<Utc>) -> Self {
        Self {
            user_id: self.user_id,
            last_checked_at: Some(now),
        }
    }
}

/// Activity by other users since the cursor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadSummary {
    pub inventory_imports: u64,
    pub cost_sheet_imports: u64,
    pub since: Option<DateTime<Utc>>,
}

impl UnreadSummary {
    pub fn total(&self) -> u64 {
        self.inventory_imports + self.cost_sheet_imports
    }
}
