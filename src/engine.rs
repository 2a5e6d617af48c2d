use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::accrual;
use crate::domain::{
    BusinessId, EmployeeDirectory, EmployeeId, Error, Money, NewStream, PayrollStore,
    PendingWithdrawal, RequestId, RequestStatus, Stream, StreamId, StreamStatus,
    WithdrawalRequest,
};

/// Service layer over the payroll store: provisions streams, validates and
/// records withdrawal requests, and settles them against an external
/// payment reference.
///
/// Request creation and settlement for a given stream run inside that
/// stream's critical section, so two callers can never validate against
/// the same availability snapshot concurrently.
#[derive(Debug)]
pub struct PayrollEngine<S, D>
where
    S: PayrollStore,
    D: EmployeeDirectory,
{
    store: S,
    directory: D,
    stream_locks: Mutex<HashMap<StreamId, Arc<Mutex<()>>>>,
}

impl<S, D> PayrollEngine<S, D>
where
    S: PayrollStore,
    D: EmployeeDirectory,
{
    pub fn new(store: S, directory: D) -> Self {
        Self {
            store,
            directory,
            stream_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    async fn stream_lock(&self, id: StreamId) -> Arc<Mutex<()>> {
        let mut locks = self.stream_locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Provisions a salary stream. The start date defaults to `now`, the
    /// withdrawn total starts at zero, and the per-second rate is derived
    /// from the annual salary once and stored with the stream.
    pub async fn create_stream(
        &self,
        new: NewStream,
        now: DateTime<Utc>,
    ) -> Result<Stream, Error> {
        if new.business_id.0.trim().is_empty() || new.employee_id.0.trim().is_empty() {
            return Err(Error::Validation(
                "business and employee ids are required".to_string(),
            ));
        }
        if !new.annual_salary.is_positive() {
            return Err(Error::Validation(
                "annual salary must be positive".to_string(),
            ));
        }
        if self
            .store
            .active_stream_for_pair(&new.business_id, &new.employee_id)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(format!(
                "employee {} already has an active stream",
                new.employee_id
            )));
        }

        let stream = Stream {
            id: StreamId::generate(),
            business_id: new.business_id,
            employee_id: new.employee_id,
            annual_salary: new.annual_salary,
            rate_per_second: accrual::rate_per_second(new.annual_salary),
            start_date: new.start_date.unwrap_or(now),
            status: StreamStatus::Active,
            total_withdrawn: Money::zero(),
            last_withdrawal_at: None,
            created_at: now,
        };
        let stream = self.store.insert_stream(stream).await?;
        info!(
            stream = %stream.id,
            business = %stream.business_id,
            employee = %stream.employee_id,
            salary = %stream.annual_salary,
            "stream created"
        );
        Ok(stream)
    }

    /// Live-balance read for the client display poll.
    pub async fn available_to_withdraw(
        &self,
        stream_id: StreamId,
        now: DateTime<Utc>,
    ) -> Result<Money, Error> {
        let stream = self
            .store
            .active_stream(stream_id)
            .await?
            .ok_or(Error::NotFound("stream"))?;
        Ok(accrual::available_to_withdraw(&stream, now))
    }

    pub async fn streams_for_business(
        &self,
        business: &BusinessId,
    ) -> Result<Vec<Stream>, Error> {
        self.store.streams_for_business(business).await
    }

    pub async fn streams_for_employee(
        &self,
        employee: &EmployeeId,
    ) -> Result<Vec<Stream>, Error> {
        self.store.streams_for_employee(employee).await
    }

    /// Records a pending withdrawal request. The amount is checked against
    /// availability at `now` and snapshotted; it is not recomputed at
    /// settlement time.
    pub async fn create_withdrawal(
        &self,
        stream_id: StreamId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalRequest, Error> {
        if !amount.is_positive() {
            return Err(Error::Validation("amount must be positive".to_string()));
        }

        let lock = self.stream_lock(stream_id).await;
        let _guard = lock.lock().await;

        let stream = self
            .store
            .active_stream(stream_id)
            .await?
            .ok_or(Error::NotFound("stream"))?;

        let available = accrual::available_to_withdraw(&stream, now);
        if amount > available {
            debug!(
                stream = %stream.id,
                requested = %amount,
                %available,
                "withdrawal rejected"
            );
            return Err(Error::InsufficientAvailable { available });
        }

        let request = WithdrawalRequest {
            id: RequestId::generate(),
            stream_id: stream.id,
            amount,
            status: RequestStatus::Pending,
            created_at: now,
            settlement_ref: None,
            settled_at: None,
        };
        let request = self.store.insert_request(request).await?;
        info!(request = %request.id, stream = %stream.id, amount = %request.amount, "withdrawal requested");
        Ok(request)
    }

    /// Pending requests for one business, oldest first, enriched with the
    /// employee's name and payment address. Requests whose stream or
    /// employee cannot be resolved are left out rather than failing the
    /// whole listing.
    pub async fn pending_withdrawals(
        &self,
        business: &BusinessId,
    ) -> Result<Vec<PendingWithdrawal>, Error> {
        let requests = self.store.pending_requests().await?;
        let mut list = Vec::with_capacity(requests.len());
        for request in requests {
            let Some(stream) = self.store.stream(request.stream_id).await? else {
                continue;
            };
            if stream.business_id != *business {
                continue;
            }
            let Some(employee) = self.directory.employee(&stream.employee_id).await? else {
                continue;
            };
            list.push(PendingWithdrawal {
                request_id: request.id,
                stream_id: request.stream_id,
                employee_id: stream.employee_id,
                employee_name: employee.name,
                payment_address: employee.payment_address,
                amount: request.amount,
                created_at: request.created_at,
            });
        }
        Ok(list)
    }

    /// Settles a pending request after the caller has executed the
    /// external payment. Marks the request paid and advances the stream's
    /// withdrawn total in one store transaction; a request that is absent
    /// or no longer pending is rejected, so replaying a completion cannot
    /// apply the amount twice.
    pub async fn complete_withdrawal(
        &self,
        request_id: RequestId,
        business: &BusinessId,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalRequest, Error> {
        let request = self
            .store
            .request(request_id)
            .await?
            .ok_or(Error::NotFound("withdrawal request"))?;
        if !request.is_pending() {
            return Err(Error::NotFound("withdrawal request"));
        }

        let lock = self.stream_lock(request.stream_id).await;
        let _guard = lock.lock().await;

        let stream = self
            .store
            .stream(request.stream_id)
            .await?
            .ok_or(Error::NotFound("stream"))?;
        if stream.business_id != *business {
            return Err(Error::NotFound("stream"));
        }

        // The withdrawn total may never outrun accrual, so a claim that
        // availability no longer covers (beyond one cent of rounding) is
        // rejected rather than settled.
        let available = accrual::available_to_withdraw(&stream, now);
        let ceiling = available.checked_add(Money::CENT).unwrap_or(available);
        if request.amount > ceiling {
            return Err(Error::InsufficientAvailable { available });
        }

        let new_total = stream
            .total_withdrawn
            .checked_add(request.amount)
            .ok_or_else(|| Error::Validation("withdrawn total overflows".to_string()))?;

        let settled = self
            .store
            .settle_withdrawal(
                request.id,
                stream.id,
                stream.total_withdrawn,
                new_total,
                reference,
                now,
            )
            .await?;
        info!(
            request = %settled.id,
            stream = %stream.id,
            amount = %settled.amount,
            total_withdrawn = %new_total,
            "withdrawal settled"
        );
        Ok(settled)
    }
}
