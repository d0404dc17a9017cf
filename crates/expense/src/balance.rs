//! Per-member views over a project's records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharefair_core::{DomainResult, Money, RecordId};

use crate::member::MemberId;

/// A member's position across every live record of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member: MemberId,
    /// Total amount of the records the member paid for or consumed.
    pub record_amount: Money,
    pub paid: Money,
    pub consumed: Money,
    /// `paid - consumed`.
    pub net: Money,
    pub need_pay: Money,
    pub need_receive: Money,
}

impl MemberBalance {
    pub fn from_totals(
        member: MemberId,
        record_amount: Money,
        paid: Money,
        consumed: Money,
    ) -> DomainResult<Self> {
        let net = paid.checked_sub(consumed)?;
        let (need_pay, need_receive) = if net.is_negative() {
            (net.checked_neg()?, Money::ZERO)
        } else {
            (Money::ZERO, net)
        };
        Ok(Self {
            member,
            record_amount,
            paid,
            consumed,
            net,
            need_pay,
            need_receive,
        })
    }

    pub fn is_settled(&self) -> bool {
        self.net.is_zero()
    }
}

/// One record seen from a single member's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecordFee {
    pub record_id: RecordId,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub payer: MemberId,
    pub expense_type: String,
    pub remark: String,
    pub paid: Money,
    pub consumed: Money,
    pub consumers: Vec<MemberId>,
}
