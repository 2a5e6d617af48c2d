use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::Money;

/// Reference to a business record managed outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusinessId(pub String);

/// Reference to an employee record managed outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmployeeId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub Uuid);

impl StreamId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for BusinessId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::fmt::Display for StreamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Active,
    Inactive,
}

impl core::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StreamStatus::Active => write!(f, "active"),
            StreamStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// One employee's continuously accruing salary arrangement.
///
/// `total_withdrawn` only ever grows, and only through settlement.
#[derive(Debug, Clone)]
pub struct Stream {
    pub id: StreamId,
    pub business_id: BusinessId,
    pub employee_id: EmployeeId,
    pub annual_salary: Money,
    pub rate_per_second: Decimal,
    pub start_date: DateTime<Utc>,
    pub status: StreamStatus,
    pub total_withdrawn: Money,
    pub last_withdrawal_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Stream {
    pub fn is_active(&self) -> bool {
        self.status == StreamStatus::Active
    }
}

/// Parameters for provisioning a stream. A missing `start_date` defaults
/// to the instant the stream is created.
#[derive(Debug, Clone)]
pub struct NewStream {
    pub business_id: BusinessId,
    pub employee_id: EmployeeId,
    pub annual_salary: Money,
    pub start_date: Option<DateTime<Utc>>,
}
