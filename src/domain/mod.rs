pub mod error;
pub mod money;
pub mod operation;
pub mod request;
pub mod stream;
pub mod traits;

pub use error::Error;
pub use money::Money;
pub use operation::{Operation, OperationKind};
pub use request::{PendingWithdrawal, RequestId, RequestStatus, WithdrawalRequest};
pub use stream::{BusinessId, EmployeeId, NewStream, Stream, StreamId, StreamStatus};
pub use traits::{DeadLetterQueue, EmployeeDirectory, EmployeeRecord, PayrollStore};
