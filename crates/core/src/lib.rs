//! `sharefair-core`: domain foundation building blocks.
//!
//! Pure domain primitives shared by the expense model and the infrastructure
//! layer: ids, errors, money, the change-status lifecycle and the explicit
//! call context. No IO lives here.

pub mod aggregate;
pub mod change_status;
pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use change_status::{ChangeEvent, ChangeStatus};
pub use context::CallContext;
pub use entity::{Entity, Tracked};
pub use error::{DomainError, DomainResult};
pub use id::{ProjectId, RecordId, TenantId, UserId};
pub use money::{Money, Split};
pub use value_object::ValueObject;
