//! Fixed-shape domain structs for the batch cleansing core.

pub mod balance;
pub mod batch;
pub mod record;

pub use balance::{BenefitBalances, CleansedRow, DisbursementBankAccount};
pub use batch::{Batch, BatchSnapshot, RecordOutcome};
pub use record::BatchRecord;
