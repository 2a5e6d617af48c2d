use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, info};

use crate::directory::MemoryDirectory;
use crate::domain::traits::OperationStream;
use crate::domain::{
    DeadLetterQueue, EmployeeRecord, Error, NewStream, Operation, OperationKind, RequestId,
    StreamId,
};
use crate::engine::PayrollEngine;
use crate::store::MemoryStore;

/// Applies a stream of operations to the engine, row by row.
///
/// Stream and request ids are minted by the engine, so the runner keeps
/// the mapping from each row's caller-chosen label to the generated id.
/// A failed row goes to the dead-letter queue and the run continues.
pub struct Runner<Q>
where
    Q: DeadLetterQueue,
{
    engine: PayrollEngine<MemoryStore, MemoryDirectory>,
    dlq: Q,
    stream_labels: HashMap<String, StreamId>,
    request_labels: HashMap<String, RequestId>,
    latest_at: Option<DateTime<Utc>>,
}

impl<Q> Runner<Q>
where
    Q: DeadLetterQueue,
{
    pub fn new(engine: PayrollEngine<MemoryStore, MemoryDirectory>, dlq: Q) -> Self {
        Self {
            engine,
            dlq,
            stream_labels: HashMap::new(),
            request_labels: HashMap::new(),
            latest_at: None,
        }
    }

    pub async fn run<I: OperationStream>(&mut self, mut ops: I) -> Result<(), Error> {
        let mut res = ops.stream();

        while let Some(op) = res.next().await {
            match op {
                Ok(op) => {
                    debug!(%op, at = %op.at, "applying operation");
                    self.latest_at = Some(self.latest_at.map_or(op.at, |seen| seen.max(op.at)));
                    if let Err(e) = self.apply(op).await {
                        self.dlq.report(&e);
                    }
                }
                Err(e) => self.dlq.report(&e),
            }
        }

        Ok(())
    }

    async fn apply(&mut self, op: Operation) -> Result<(), Error> {
        match op.kind {
            OperationKind::RegisterEmployee {
                employee,
                name,
                address,
            } => {
                self.engine
                    .directory()
                    .register(EmployeeRecord {
                        id: employee,
                        name,
                        payment_address: address,
                    })
                    .await;
                Ok(())
            }
            OperationKind::CreateStream {
                business,
                employee,
                stream_label,
                annual_salary,
            } => {
                if self.stream_labels.contains_key(&stream_label) {
                    return Err(Error::Ingestion(format!(
                        "Stream label already used: {}",
                        stream_label
                    )));
                }
                let stream = self
                    .engine
                    .create_stream(
                        NewStream {
                            business_id: business,
                            employee_id: employee,
                            annual_salary,
                            start_date: None,
                        },
                        op.at,
                    )
                    .await?;
                self.stream_labels.insert(stream_label, stream.id);
                Ok(())
            }
            OperationKind::Withdraw {
                stream_label,
                request_label,
                amount,
            } => {
                let stream_id = self.stream_label(&stream_label)?;
                if self.request_labels.contains_key(&request_label) {
                    return Err(Error::Ingestion(format!(
                        "Request label already used: {}",
                        request_label
                    )));
                }
                let request = self.engine.create_withdrawal(stream_id, amount, op.at).await?;
                self.request_labels.insert(request_label, request.id);
                Ok(())
            }
            OperationKind::Complete {
                business,
                request_label,
                reference,
            } => {
                let request_id = self.request_label(&request_label)?;
                self.engine
                    .complete_withdrawal(request_id, &business, reference, op.at)
                    .await?;
                Ok(())
            }
            OperationKind::Balance { stream_label } => {
                let stream_id = self.stream_label(&stream_label)?;
                let available = self.engine.available_to_withdraw(stream_id, op.at).await?;
                info!(stream = %stream_label, %available, at = %op.at, "available to withdraw");
                Ok(())
            }
        }
    }

    fn stream_label(&self, label: &str) -> Result<StreamId, Error> {
        self.stream_labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::Ingestion(format!("Unknown stream label: {}", label)))
    }

    fn request_label(&self, label: &str) -> Result<RequestId, Error> {
        self.request_labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::Ingestion(format!("Unknown request label: {}", label)))
    }

    /// Writes the final-state report, with availability evaluated at the
    /// latest timestamp seen in the input.
    pub async fn report<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        let now = self.latest_at.unwrap_or_else(Utc::now);
        self.engine.store().write_report(now, out).await
    }
}
