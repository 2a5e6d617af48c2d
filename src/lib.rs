//! Streaming payroll engine: converts fixed annual salaries into
//! per-second accruing balances, validates withdrawal requests against
//! real-time availability, and settles them against external payment
//! references.
//!
//! The engine never moves funds. It computes how much may be withdrawn
//! and records intent and settlement; the actual transfer is executed by
//! the caller before settlement is recorded.

pub mod accrual;
pub mod directory;
pub mod dlq;
pub mod domain;
pub mod engine;
pub mod ingestion;
pub mod runner;
pub mod store;

pub use directory::MemoryDirectory;
pub use engine::PayrollEngine;
pub use store::MemoryStore;
