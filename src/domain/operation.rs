use chrono::{DateTime, Utc};

use crate::domain::stream::{BusinessId, EmployeeId};
use crate::domain::Money;

/// One row of the operations file, already validated into its kind.
///
/// Stream and request ids are generated by the engine, so rows refer to
/// them through caller-chosen labels resolved by the runner.
#[derive(Debug, Clone)]
pub enum OperationKind {
    RegisterEmployee {
        employee: EmployeeId,
        name: String,
        address: String,
    },
    CreateStream {
        business: BusinessId,
        employee: EmployeeId,
        stream_label: String,
        annual_salary: Money,
    },
    Withdraw {
        stream_label: String,
        request_label: String,
        amount: Money,
    },
    Complete {
        business: BusinessId,
        request_label: String,
        reference: Option<String>,
    },
    Balance {
        stream_label: String,
    },
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub at: DateTime<Utc>,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.kind {
            OperationKind::RegisterEmployee { employee, .. } => {
                write!(f, "employee,{}", employee)
            }
            OperationKind::CreateStream {
                business,
                employee,
                stream_label,
                annual_salary,
            } => write!(
                f,
                "create_stream,{},{},{},{}",
                business, employee, stream_label, annual_salary
            ),
            OperationKind::Withdraw {
                stream_label,
                request_label,
                amount,
            } => write!(f, "withdraw,{},{},{}", stream_label, request_label, amount),
            OperationKind::Complete {
                business,
                request_label,
                ..
            } => write!(f, "complete,{},{}", business, request_label),
            OperationKind::Balance { stream_label } => write!(f, "balance,{}", stream_label),
        }
    }
}
