//! Infrastructure layer: configuration, persistence gateways and the
//! command executor that ties them to the expense domain.

pub mod config;
pub mod executor;
pub mod gateway;


pub use config::ShareFairConfig;
pub use executor::{ExpenseCommandExecutor, ServiceError, bootstrap};
pub use gateway::InMemoryExpenseStore;
