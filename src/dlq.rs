use tracing::warn;

use crate::domain::{DeadLetterQueue, Error};

/// Reports rejected operations on the log stream, keeping stdout clean
/// for the final report.
#[derive(Default, Debug)]
pub struct LogDlq {}

impl DeadLetterQueue for LogDlq {
    fn report(&self, error: &Error) {
        warn!(%error, "operation rejected");
    }
}
