use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Write;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::Mutex;

use crate::accrual;
use crate::domain::{
    BusinessId, EmployeeId, Error, Money, PayrollStore, RequestId, RequestStatus, Stream,
    StreamId, WithdrawalRequest,
};

#[derive(Default, Debug)]
struct Tables {
    // Records carry an insertion sequence so listings stay stable when
    // timestamps tie.
    streams: HashMap<StreamId, (u64, Stream)>,
    requests: HashMap<RequestId, (u64, WithdrawalRequest)>,
    seq: u64,
}

/// In-memory reference implementation of the payroll store.
///
/// Both tables live behind one lock, which is what makes
/// `settle_withdrawal` a genuine all-or-nothing step here.
#[derive(Default, Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the final state of every stream and request as two CSV
    /// blocks, with availability evaluated at `now`. Rows are sorted so
    /// the output is reproducible for a fixed input.
    pub async fn write_report<W: Write>(
        &self,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<(), Error> {
        let tables = self.tables.lock().await;

        let mut streams: Vec<&(u64, Stream)> = tables.streams.values().collect();
        streams.sort_by(|(a_seq, a), (b_seq, b)| {
            (&a.business_id.0, &a.employee_id.0, a_seq).cmp(&(
                &b.business_id.0,
                &b.employee_id.0,
                b_seq,
            ))
        });

        writeln!(
            out,
            "business,employee,annual_salary,total_withdrawn,available,status,last_withdrawal_at"
        )?;
        for (_, stream) in streams {
            writeln!(
                out,
                "{},{},{},{},{},{},{}",
                stream.business_id,
                stream.employee_id,
                stream.annual_salary,
                stream.total_withdrawn,
                accrual::available_to_withdraw(stream, now),
                stream.status,
                stream
                    .last_withdrawal_at
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_default(),
            )?;
        }

        let mut requests: Vec<&(u64, WithdrawalRequest)> = tables.requests.values().collect();
        requests.sort_by_key(|(seq, request)| (request.created_at, *seq));

        writeln!(out)?;
        writeln!(out, "business,employee,amount,status,created_at,settled_at")?;
        for (_, request) in requests {
            let owner = tables.streams.get(&request.stream_id).map(|(_, s)| s);
            writeln!(
                out,
                "{},{},{},{},{},{}",
                owner.map(|s| s.business_id.0.as_str()).unwrap_or(""),
                owner.map(|s| s.employee_id.0.as_str()).unwrap_or(""),
                request.amount,
                request.status,
                request
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                request
                    .settled_at
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_default(),
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn stream(&self, id: StreamId) -> Result<Option<Stream>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables.streams.get(&id).map(|(_, s)| s.clone()))
    }

    async fn active_stream(&self, id: StreamId) -> Result<Option<Stream>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables
            .streams
            .get(&id)
            .map(|(_, s)| s)
            .filter(|s| s.is_active())
            .cloned())
    }

    async fn active_stream_for_pair(
        &self,
        business: &BusinessId,
        employee: &EmployeeId,
    ) -> Result<Option<Stream>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables
            .streams
            .values()
            .map(|(_, s)| s)
            .find(|s| {
                s.is_active() && s.business_id == *business && s.employee_id == *employee
            })
            .cloned())
    }

    async fn streams_for_business(&self, business: &BusinessId) -> Result<Vec<Stream>, Error> {
        let tables = self.tables.lock().await;
        let mut streams: Vec<&(u64, Stream)> = tables
            .streams
            .values()
            .filter(|(_, s)| s.is_active() && s.business_id == *business)
            .collect();
        streams.sort_by(|(a_seq, a), (b_seq, b)| {
            (b.created_at, b_seq).cmp(&(a.created_at, a_seq))
        });
        Ok(streams.into_iter().map(|(_, s)| s.clone()).collect())
    }

    async fn streams_for_employee(&self, employee: &EmployeeId) -> Result<Vec<Stream>, Error> {
        let tables = self.tables.lock().await;
        let mut streams: Vec<&(u64, Stream)> = tables
            .streams
            .values()
            .filter(|(_, s)| s.is_active() && s.employee_id == *employee)
            .collect();
        streams.sort_by(|(a_seq, a), (b_seq, b)| {
            (b.created_at, b_seq).cmp(&(a.created_at, a_seq))
        });
        Ok(streams.into_iter().map(|(_, s)| s.clone()).collect())
    }

    async fn insert_stream(&self, stream: Stream) -> Result<Stream, Error> {
        let mut tables = self.tables.lock().await;
        tables.seq += 1;
        let seq = tables.seq;
        match tables.streams.entry(stream.id) {
            Entry::Vacant(e) => {
                e.insert((seq, stream.clone()));
                Ok(stream)
            }
            Entry::Occupied(_) => Err(Error::Conflict(format!(
                "stream {} already exists",
                stream.id
            ))),
        }
    }

    async fn pending_requests(&self) -> Result<Vec<WithdrawalRequest>, Error> {
        let tables = self.tables.lock().await;
        let mut pending: Vec<&(u64, WithdrawalRequest)> = tables
            .requests
            .values()
            .filter(|(_, r)| r.is_pending())
            .collect();
        pending.sort_by_key(|(seq, r)| (r.created_at, *seq));
        Ok(pending.into_iter().map(|(_, r)| r.clone()).collect())
    }

    async fn request(&self, id: RequestId) -> Result<Option<WithdrawalRequest>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables.requests.get(&id).map(|(_, r)| r.clone()))
    }

    async fn insert_request(
        &self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalRequest, Error> {
        let mut tables = self.tables.lock().await;
        tables.seq += 1;
        let seq = tables.seq;
        match tables.requests.entry(request.id) {
            Entry::Vacant(e) => {
                e.insert((seq, request.clone()));
                Ok(request)
            }
            Entry::Occupied(_) => Err(Error::Conflict(format!(
                "withdrawal request {} already exists",
                request.id
            ))),
        }
    }

    async fn settle_withdrawal(
        &self,
        request_id: RequestId,
        stream_id: StreamId,
        expected_total: Money,
        new_total: Money,
        reference: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<WithdrawalRequest, Error> {
        let mut tables = self.tables.lock().await;

        match tables.requests.get(&request_id) {
            Some((_, request)) if request.is_pending() => {}
            Some(_) => return Err(Error::NotFound("withdrawal request")),
            None => return Err(Error::NotFound("withdrawal request")),
        }
        let Some((_, stream)) = tables.streams.get(&stream_id) else {
            return Err(Error::NotFound("stream"));
        };
        if stream.total_withdrawn != expected_total {
            return Err(Error::Conflict(format!(
                "stream {} was withdrawn from concurrently",
                stream_id
            )));
        }
        if new_total < expected_total {
            return Err(Error::Conflict(format!(
                "withdrawn total for stream {} may not decrease",
                stream_id
            )));
        }

        // Both records mutate under the same lock acquisition; no caller
        // can observe one write without the other.
        if let Some((_, stream)) = tables.streams.get_mut(&stream_id) {
            stream.total_withdrawn = new_total;
            stream.last_withdrawal_at = Some(at);
        }
        let settled = tables
            .requests
            .get_mut(&request_id)
            .map(|(_, request)| {
                request.status = RequestStatus::Paid;
                request.settlement_ref = reference;
                request.settled_at = Some(at);
                request.clone()
            })
            .ok_or(Error::NotFound("withdrawal request"))?;
        Ok(settled)
    }
}
