//! Common types used across the service

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fixed cap on listing endpoints; there is no cursor beyond it
pub const MOVEMENT_LIST_LIMIT: i64 = 50;

/// Company code used when a tenant has no `t_emp` rows
pub const DEFAULT_COMPANY_CODE: i32 = 1;

/// Optional date bounds for movement queries (both inclusive)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.start.map_or(true, |start| value >= start) && self.end.map_or(true, |end| value <= end)
    }
}

/// Company selector accepted by the movement writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyKey {
    /// `t_emp.ID`
    Guid(uuid::Uuid),
    /// `t_emp.cdemp`
    Code(i32),
}
