use std::io::Read;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use serde::Deserialize;

use crate::domain::traits::OperationStream;
use crate::domain::{
    BusinessId, EmployeeId, Error, Money, Operation, OperationKind,
};

pub struct CsvReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> CsvReader<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Ok(Self { reader: Some(rdr) })
    }
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct CsvRow {
    op: String,
    at: Option<String>,
    business: Option<String>,
    employee: Option<String>,
    stream: Option<String>,
    request: Option<String>,
    name: Option<String>,
    address: Option<String>,
    amount: Option<Money>,
    reference: Option<String>,
}

fn required(field: Option<String>, name: &str) -> Result<String, Error> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Ingestion(format!("Missing field: {}", name))),
    }
}

fn required_amount(field: Option<Money>) -> Result<Money, Error> {
    field.ok_or_else(|| Error::Ingestion("Missing field: amount".to_string()))
}

fn parse_at(field: Option<String>) -> Result<DateTime<Utc>, Error> {
    let raw = required(field, "at")?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| Error::Ingestion(format!("Invalid timestamp {}: {}", raw, e)))
}

impl TryFrom<CsvRow> for Operation {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self, Self::Error> {
        let at = parse_at(row.at)?;
        let kind = match row.op.trim().to_ascii_lowercase().as_str() {
            "employee" => OperationKind::RegisterEmployee {
                employee: EmployeeId(required(row.employee, "employee")?),
                name: required(row.name, "name")?,
                address: required(row.address, "address")?,
            },
            "create_stream" => OperationKind::CreateStream {
                business: BusinessId(required(row.business, "business")?),
                employee: EmployeeId(required(row.employee, "employee")?),
                stream_label: required(row.stream, "stream")?,
                annual_salary: required_amount(row.amount)?,
            },
            "withdraw" => OperationKind::Withdraw {
                stream_label: required(row.stream, "stream")?,
                request_label: required(row.request, "request")?,
                amount: required_amount(row.amount)?,
            },
            "complete" => OperationKind::Complete {
                business: BusinessId(required(row.business, "business")?),
                request_label: required(row.request, "request")?,
                reference: row.reference.filter(|r| !r.trim().is_empty()),
            },
            "balance" => OperationKind::Balance {
                stream_label: required(row.stream, "stream")?,
            },
            other => {
                return Err(Error::Ingestion(format!(
                    "Invalid operation type: {}",
                    other
                )));
            }
        };

        Ok(Operation { kind, at })
    }
}

impl<R: Read + Send + 'static> OperationStream for CsvReader<R> {
    type OpStream = Pin<Box<dyn Stream<Item = Result<Operation, Error>> + Send>>;

    fn stream(&mut self) -> Self::OpStream {
        // Take ownership of the reader so the iterator we build owns all data and is 'static.
        let reader = match self.reader.take() {
            Some(r) => r,
            None => {
                // Already consumed; return an empty stream.
                return Box::pin(stream::iter(Vec::<Result<Operation, Error>>::new()));
            }
        };

        let iter = reader.into_deserialize::<CsvRow>().map(|row_res| match row_res {
            Ok(row) => Operation::try_from(row),
            Err(e) => Err(Error::Ingestion(format!(
                "CSV deserialization error: {}",
                e
            ))),
        });

        Box::pin(stream::iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn collect(input: &str) -> Vec<Result<Operation, Error>> {
        let mut reader = CsvReader::new(std::io::Cursor::new(input.to_string())).unwrap();
        reader.stream().collect().await
    }

    #[tokio::test]
    async fn parses_each_operation_kind() {
        let input = "\
op,at,business,employee,stream,request,name,address,amount,reference
employee,2026-01-01T00:00:00Z,,emp-1,,,Ada Lovelace,0xada,,
create_stream,2026-01-01T00:00:00Z,acme,emp-1,s1,,,,31557600.00,
withdraw,2026-01-01T00:01:40Z,,,s1,r1,,,60.00,
complete,2026-01-01T00:01:40Z,acme,,,r1,,,,0xabc
balance,2026-01-01T00:01:40Z,,,s1,,,,,
";
        let ops = collect(input).await;
        assert_eq!(ops.len(), 5);
        assert!(matches!(
            ops[0].as_ref().unwrap().kind,
            OperationKind::RegisterEmployee { .. }
        ));
        assert!(matches!(
            ops[1].as_ref().unwrap().kind,
            OperationKind::CreateStream { .. }
        ));
        match &ops[3].as_ref().unwrap().kind {
            OperationKind::Complete { reference, .. } => {
                assert_eq!(reference.as_deref(), Some("0xabc"));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejects_unknown_ops_and_bad_timestamps() {
        let input = "\
op,at,business,employee,stream,request,name,address,amount,reference
transfer,2026-01-01T00:00:00Z,,,,,,,,
balance,yesterday,,,s1,,,,,
";
        let ops = collect(input).await;
        assert!(matches!(ops[0], Err(Error::Ingestion(_))));
        assert!(matches!(ops[1], Err(Error::Ingestion(_))));
    }

    #[tokio::test]
    async fn missing_amount_is_an_ingestion_error() {
        let input = "\
op,at,business,employee,stream,request,name,address,amount,reference
withdraw,2026-01-01T00:01:40Z,,,s1,r1,,,,
";
        let ops = collect(input).await;
        assert!(matches!(ops[0], Err(Error::Ingestion(_))));
    }
}
