//! One member's line in a record's fee split.

use serde::{Deserialize, Serialize};

use sharefair_core::{DomainResult, Money, ValueObject};

use crate::member::MemberId;

/// What one member consumed and paid within a single expense record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub member: MemberId,
    pub consumed: Money,
    pub paid: Money,
}

impl ValueObject for LedgerEntry {}

impl LedgerEntry {
    /// `paid - consumed`: positive means the member is owed money.
    pub fn net(&self) -> DomainResult<Money> {
        self.paid.checked_sub(self.consumed)
    }
}
