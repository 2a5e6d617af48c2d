use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::stream::{EmployeeId, StreamId};
use crate::domain::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Paid,
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Paid => write!(f, "paid"),
        }
    }
}

/// A claim against a stream's available balance, fixed in amount when it
/// is created. More may have accrued by the time it settles; the claim
/// does not grow with it.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub id: RequestId,
    pub stream_id: StreamId,
    pub amount: Money,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub settlement_ref: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Pending request enriched for the business-side review list.
#[derive(Debug, Clone)]
pub struct PendingWithdrawal {
    pub request_id: RequestId,
    pub stream_id: StreamId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub payment_address: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}
