use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{EmployeeDirectory, EmployeeId, EmployeeRecord, Error};

/// In-memory stand-in for the employee directory collaborator.
#[derive(Default, Debug)]
pub struct MemoryDirectory {
    employees: Mutex<HashMap<EmployeeId, EmployeeRecord>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, record: EmployeeRecord) {
        let mut employees = self.employees.lock().await;
        employees.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryDirectory {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, Error> {
        let employees = self.employees.lock().await;
        Ok(employees.get(id).cloned())
    }
}
