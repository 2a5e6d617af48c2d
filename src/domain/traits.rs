use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::domain::request::{RequestId, WithdrawalRequest};
use crate::domain::stream::{BusinessId, EmployeeId, Stream as PayrollStream, StreamId};
use crate::domain::{Error, Money, Operation};

pub trait OperationStream {
    type OpStream: Stream<Item = Result<Operation, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::OpStream;
}

pub trait DeadLetterQueue {
    fn report(&self, error: &Error);
}

/// Durable store backing streams and withdrawal requests.
///
/// Settlement is a single operation on purpose: marking the request paid
/// and advancing the stream total must land together or not at all.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn stream(&self, id: StreamId) -> Result<Option<PayrollStream>, Error>;

    async fn active_stream(&self, id: StreamId) -> Result<Option<PayrollStream>, Error>;

    async fn active_stream_for_pair(
        &self,
        business: &BusinessId,
        employee: &EmployeeId,
    ) -> Result<Option<PayrollStream>, Error>;

    /// Active streams for one business, newest-created first.
    async fn streams_for_business(
        &self,
        business: &BusinessId,
    ) -> Result<Vec<PayrollStream>, Error>;

    /// Active streams for one employee, newest-created first.
    async fn streams_for_employee(
        &self,
        employee: &EmployeeId,
    ) -> Result<Vec<PayrollStream>, Error>;

    async fn insert_stream(&self, stream: PayrollStream) -> Result<PayrollStream, Error>;

    /// All pending requests, oldest-created first.
    async fn pending_requests(&self) -> Result<Vec<WithdrawalRequest>, Error>;

    async fn request(&self, id: RequestId) -> Result<Option<WithdrawalRequest>, Error>;

    async fn insert_request(
        &self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalRequest, Error>;

    /// Marks the request paid and advances the stream's withdrawn total in
    /// one transactional step. `expected_total` is the caller's last
    /// observed `total_withdrawn`; a mismatch fails with [`Error::Conflict`]
    /// and leaves both records untouched.
    async fn settle_withdrawal(
        &self,
        request_id: RequestId,
        stream_id: StreamId,
        expected_total: Money,
        new_total: Money,
        reference: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<WithdrawalRequest, Error>;
}

#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub name: String,
    pub payment_address: String,
}

/// Read-only lookup into the employee records managed outside the engine.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, Error>;
}
