//! Expense sharing domain module.
//!
//! Members, expense records and the fee-splitting engine, projects with
//! balance aggregation, reporting views and the persistence contracts. Pure
//! deterministic domain logic: no IO, no storage, no logging.

pub mod balance;
pub mod command;
pub mod export;
pub mod gateway;
pub mod ledger;
pub mod member;
pub mod project;
pub mod record;
pub mod statistics;

pub use balance::{MemberBalance, MemberRecordFee};
pub use command::{
    AddProjectMembers, CreateExpenseRecord, CreateProject, DeleteExpenseRecord, DeleteProject,
    UpdateExpenseRecord,
};
pub use export::{DEFAULT_DATE_FORMAT, ExpenseRecordRow};
pub use gateway::{ExpenseProjectGateway, ExpenseRecordGateway, GatewayError};
pub use ledger::LedgerEntry;
pub use member::{MemberId, Roster};
pub use project::ExpenseProject;
pub use record::{ExpenseRecord, RecordDetails};
pub use statistics::ExpenseTypeShare;
