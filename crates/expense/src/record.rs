//! Expense record: one payment split across a set of consumers.
//!
//! [`ExpenseRecord::calc_members_fee`] is the splitting engine. It divides the
//! amount into equal cent shares, hands leftover cents to the consumers that
//! sort first by member id, and credits the payer with the full amount.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharefair_core::{
    ChangeEvent, ChangeStatus, DomainError, DomainResult, Entity, Money, ProjectId, RecordId,
    Tracked, UserId,
};

use crate::ledger::LedgerEntry;
use crate::member::MemberId;

/// The editable content of a record, validated as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDetails {
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub expense_type: String,
    pub remark: String,
    pub payer: MemberId,
    pub consumers: Vec<MemberId>,
}

impl RecordDetails {
    /// Trim text fields, dedupe consumers (first occurrence wins) and check
    /// that the details describe a splittable expense.
    pub fn normalized(self) -> DomainResult<Self> {
        if !self.amount.is_positive() {
            return Err(DomainError::invalid_state(format!(
                "amount must be positive (got {})",
                self.amount
            )));
        }
        let expense_type = normalize_expense_type(&self.expense_type)?;
        let consumers = dedup_consumers(self.consumers);
        if consumers.is_empty() {
            return Err(DomainError::invalid_state("at least one consumer is required"));
        }

        Ok(Self {
            amount: self.amount,
            date: self.date,
            expense_type,
            remark: self.remark.trim().to_string(),
            payer: self.payer,
            consumers,
        })
    }

    /// Every member the record touches: the payer and the consumers.
    pub fn participants(&self) -> impl Iterator<Item = &MemberId> {
        core::iter::once(&self.payer).chain(self.consumers.iter())
    }
}

fn normalize_expense_type(raw: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("expense type must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn dedup_consumers(consumers: Vec<MemberId>) -> Vec<MemberId> {
    let mut seen = BTreeSet::new();
    consumers
        .into_iter()
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

/// Entity: ExpenseRecord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    id: RecordId,
    project_id: ProjectId,
    created_by: UserId,
    amount: Option<Money>,
    date: DateTime<Utc>,
    expense_type: String,
    remark: String,
    payer: Option<MemberId>,
    consumers: Vec<MemberId>,
    status: ChangeStatus,
}

impl ExpenseRecord {
    /// A record with no amount, payer or consumers yet.
    pub fn draft(
        id: RecordId,
        project_id: ProjectId,
        created_by: UserId,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            created_by,
            amount: None,
            date,
            expense_type: String::new(),
            remark: String::new(),
            payer: None,
            consumers: Vec::new(),
            status: ChangeStatus::New,
        }
    }

    pub fn new(
        id: RecordId,
        project_id: ProjectId,
        created_by: UserId,
        details: RecordDetails,
    ) -> DomainResult<Self> {
        let details = details.normalized()?;
        Ok(Self {
            id,
            project_id,
            created_by,
            amount: Some(details.amount),
            date: details.date,
            expense_type: details.expense_type,
            remark: details.remark,
            payer: Some(details.payer),
            consumers: details.consumers,
            status: ChangeStatus::New,
        })
    }

    pub fn id_typed(&self) -> RecordId {
        self.id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn amount(&self) -> Option<Money> {
        self.amount
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn expense_type(&self) -> &str {
        &self.expense_type
    }

    pub fn remark(&self) -> &str {
        &self.remark
    }

    pub fn payer(&self) -> Option<&MemberId> {
        self.payer.as_ref()
    }

    pub fn consumers(&self) -> &[MemberId] {
        &self.consumers
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    pub fn is_deleted(&self) -> bool {
        self.status.is_deleted()
    }

    /// Whether `member` paid for or consumed part of this record.
    pub fn involves(&self, member: &MemberId) -> bool {
        self.payer.as_ref() == Some(member) || self.consumers.contains(member)
    }

    /// Snapshot of the editable content; fails while the record is incomplete.
    pub fn details(&self) -> DomainResult<RecordDetails> {
        let amount = self.require_amount()?;
        let payer = self.require_payer()?.clone();
        Ok(RecordDetails {
            amount,
            date: self.date,
            expense_type: self.expense_type.clone(),
            remark: self.remark.clone(),
            payer,
            consumers: self.consumers.clone(),
        })
        .and_then(RecordDetails::normalized)
    }

    pub fn set_amount(&mut self, amount: Money) -> DomainResult<()> {
        if !amount.is_positive() {
            return Err(DomainError::invalid_state(format!(
                "amount must be positive (got {amount})"
            )));
        }
        self.touch()?;
        self.amount = Some(amount);
        Ok(())
    }

    pub fn set_date(&mut self, date: DateTime<Utc>) -> DomainResult<()> {
        self.touch()?;
        self.date = date;
        Ok(())
    }

    pub fn set_expense_type(&mut self, expense_type: &str) -> DomainResult<()> {
        let expense_type = normalize_expense_type(expense_type)?;
        self.touch()?;
        self.expense_type = expense_type;
        Ok(())
    }

    pub fn set_remark(&mut self, remark: &str) -> DomainResult<()> {
        self.touch()?;
        self.remark = remark.trim().to_string();
        Ok(())
    }

    pub fn set_payer(&mut self, payer: MemberId) -> DomainResult<()> {
        self.touch()?;
        self.payer = Some(payer);
        Ok(())
    }

    /// Returns `false` when the member already consumes this record.
    pub fn add_consumer(&mut self, member: MemberId) -> DomainResult<bool> {
        if self.consumers.contains(&member) {
            return Ok(false);
        }
        self.touch()?;
        self.consumers.push(member);
        Ok(true)
    }

    /// Returns `false` when the member was not a consumer.
    pub fn remove_consumer(&mut self, member: &MemberId) -> DomainResult<bool> {
        let Some(pos) = self.consumers.iter().position(|m| m == member) else {
            return Ok(false);
        };
        self.touch()?;
        self.consumers.remove(pos);
        Ok(true)
    }

    pub fn set_consumers(&mut self, consumers: Vec<MemberId>) -> DomainResult<()> {
        self.touch()?;
        self.consumers = dedup_consumers(consumers);
        Ok(())
    }

    /// Replace all editable fields at once. Nothing changes if validation fails.
    pub fn apply(&mut self, details: RecordDetails) -> DomainResult<()> {
        let details = details.normalized()?;
        self.touch()?;
        self.amount = Some(details.amount);
        self.date = details.date;
        self.expense_type = details.expense_type;
        self.remark = details.remark;
        self.payer = Some(details.payer);
        self.consumers = details.consumers;
        Ok(())
    }

    pub fn mark_removed(&mut self) -> DomainResult<()> {
        self.status = self.status.transition(ChangeEvent::Removed)?;
        Ok(())
    }

    /// Split the amount across consumers and credit the payer.
    ///
    /// Returns one entry per distinct member in `{payer} ∪ consumers`: the
    /// payer first when they did not consume, then consumers in insertion
    /// order. Consumed amounts sum to the record amount exactly.
    pub fn calc_members_fee(&self) -> DomainResult<Vec<LedgerEntry>> {
        let amount = self.require_amount()?;
        let payer = self.require_payer()?;
        if self.consumers.is_empty() {
            return Err(DomainError::invalid_state(format!(
                "record {} has no consumers to split {amount} between",
                self.id
            )));
        }

        let parts = u32::try_from(self.consumers.len())
            .map_err(|_| DomainError::arithmetic("too many consumers on one record"))?;
        let split = amount.split(parts)?;

        // Leftover cents go to the lowest member ids, one each.
        let mut ranked: Vec<&MemberId> = self.consumers.iter().collect();
        ranked.sort();
        let extra: BTreeSet<&MemberId> = ranked
            .into_iter()
            .take(split.remainder_cents as usize)
            .collect();
        let one_cent = Money::from_cents(1);

        let mut entries = Vec::with_capacity(self.consumers.len() + 1);
        if !self.consumers.contains(payer) {
            entries.push(LedgerEntry {
                member: payer.clone(),
                consumed: Money::ZERO,
                paid: amount,
            });
        }
        for consumer in &self.consumers {
            let consumed = if extra.contains(consumer) {
                split.share.checked_add(one_cent)?
            } else {
                split.share
            };
            let paid = if consumer == payer { amount } else { Money::ZERO };
            entries.push(LedgerEntry {
                member: consumer.clone(),
                consumed,
                paid,
            });
        }

        Ok(entries)
    }

    /// The entry for `member`, or `None` when the record does not involve them.
    pub fn member_fee(&self, member: &MemberId) -> DomainResult<Option<LedgerEntry>> {
        if !self.involves(member) {
            return Ok(None);
        }
        Ok(self
            .calc_members_fee()?
            .into_iter()
            .find(|entry| &entry.member == member))
    }

    fn require_amount(&self) -> DomainResult<Money> {
        match self.amount {
            Some(amount) if amount.is_positive() => Ok(amount),
            Some(amount) => Err(DomainError::invalid_state(format!(
                "record {} has non-positive amount {amount}",
                self.id
            ))),
            None => Err(DomainError::invalid_state(format!(
                "record {} has no amount",
                self.id
            ))),
        }
    }

    fn require_payer(&self) -> DomainResult<&MemberId> {
        self.payer
            .as_ref()
            .ok_or_else(|| DomainError::invalid_state(format!("record {} has no payer", self.id)))
    }

    fn touch(&mut self) -> DomainResult<()> {
        self.status = self.status.transition(ChangeEvent::Mutated)?;
        Ok(())
    }
}

impl Entity for ExpenseRecord {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Tracked for ExpenseRecord {
    fn change_status(&self) -> ChangeStatus {
        self.status
    }

    fn mark_persisted(&mut self) -> DomainResult<()> {
        self.status = self.status.transition(ChangeEvent::Persisted)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn m(name: &str) -> MemberId {
        MemberId::new(name).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn details(amount: &str, payer: &str, consumers: &[&str]) -> RecordDetails {
        RecordDetails {
            amount: money(amount),
            date: Utc::now(),
            expense_type: "food".to_string(),
            remark: String::new(),
            payer: m(payer),
            consumers: consumers.iter().map(|c| m(c)).collect(),
        }
    }

    fn record(amount: &str, payer: &str, consumers: &[&str]) -> ExpenseRecord {
        ExpenseRecord::new(
            RecordId::new(),
            ProjectId::new(),
            UserId::new(),
            details(amount, payer, consumers),
        )
        .unwrap()
    }

    fn entry<'a>(entries: &'a [LedgerEntry], name: &str) -> &'a LedgerEntry {
        entries
            .iter()
            .find(|e| e.member.as_str() == name)
            .unwrap_or_else(|| panic!("no entry for {name}"))
    }

    #[test]
    fn payer_outside_consumers_gets_own_entry_first() {
        let entries = record("90", "p1", &["u1", "u2", "u3"])
            .calc_members_fee()
            .unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].member, m("p1"));
        assert_eq!(entries[0].consumed, Money::ZERO);
        assert_eq!(entries[0].paid, money("90"));
        for name in ["u1", "u2", "u3"] {
            let e = entry(&entries, name);
            assert_eq!(e.consumed, money("30.00"));
            assert_eq!(e.paid, Money::ZERO);
        }
    }

    #[test]
    fn payer_who_also_consumes_gets_a_single_entry() {
        let entries = record("90", "p1", &["u1", "u2", "p1"])
            .calc_members_fee()
            .unwrap();

        assert_eq!(entries.len(), 3);
        let p1 = entry(&entries, "p1");
        assert_eq!(p1.consumed, money("30"));
        assert_eq!(p1.paid, money("90"));
        assert_eq!(p1.net().unwrap(), money("60"));
    }

    #[test]
    fn leftover_cent_goes_to_lowest_member_id() {
        let entries = record("100", "a", &["c", "b", "a"]).calc_members_fee().unwrap();

        assert_eq!(entry(&entries, "a").consumed, money("33.34"));
        assert_eq!(entry(&entries, "b").consumed, money("33.33"));
        assert_eq!(entry(&entries, "c").consumed, money("33.33"));
        // Consumers keep insertion order.
        let order: Vec<_> = entries.iter().map(|e| e.member.as_str()).collect();
        assert_eq!(order, ["c", "b", "a"]);
    }

    #[test]
    fn calculation_is_deterministic() {
        let r = record("10.01", "x", &["q", "w", "e", "r"]);
        assert_eq!(r.calc_members_fee().unwrap(), r.calc_members_fee().unwrap());
    }

    #[test]
    fn draft_without_consumers_is_an_invalid_state() {
        let mut r = ExpenseRecord::draft(RecordId::new(), ProjectId::new(), UserId::new(), Utc::now());
        assert!(matches!(r.calc_members_fee(), Err(DomainError::InvalidState(_))));

        r.set_amount(money("12")).unwrap();
        r.set_payer(m("p")).unwrap();
        match r.calc_members_fee() {
            Err(DomainError::InvalidState(msg)) => assert!(msg.contains("no consumers")),
            other => panic!("expected InvalidState, got {other:?}"),
        }

        r.add_consumer(m("p")).unwrap();
        assert_eq!(r.calc_members_fee().unwrap().len(), 1);
    }

    #[test]
    fn missing_payer_is_an_invalid_state() {
        let mut r = ExpenseRecord::draft(RecordId::new(), ProjectId::new(), UserId::new(), Utc::now());
        r.set_amount(money("5")).unwrap();
        r.add_consumer(m("a")).unwrap();
        match r.calc_members_fee() {
            Err(DomainError::InvalidState(msg)) => assert!(msg.contains("no payer")),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn construction_rejects_invalid_details() {
        let zero = RecordDetails {
            amount: Money::ZERO,
            ..details("1", "p", &["a"])
        };
        assert!(matches!(
            ExpenseRecord::new(RecordId::new(), ProjectId::new(), UserId::new(), zero),
            Err(DomainError::InvalidState(_))
        ));

        let blank_type = RecordDetails {
            expense_type: "  ".to_string(),
            ..details("1", "p", &["a"])
        };
        assert!(ExpenseRecord::new(RecordId::new(), ProjectId::new(), UserId::new(), blank_type).is_err());

        let nobody = details("1", "p", &[]);
        match ExpenseRecord::new(RecordId::new(), ProjectId::new(), UserId::new(), nobody) {
            Err(DomainError::InvalidState(msg)) => assert!(msg.contains("consumer")),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn unsplittable_edits_are_invalid_state_and_leave_the_record_alone() {
        let mut r = record("10", "p", &["a"]);
        let before = r.clone();

        assert!(matches!(r.set_amount(Money::ZERO), Err(DomainError::InvalidState(_))));
        assert!(matches!(
            r.set_amount(Money::from_cents(-100)),
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            r.apply(details("20", "p", &[])),
            Err(DomainError::InvalidState(_))
        ));
        assert_eq!(r, before);
    }

    #[test]
    fn duplicate_consumers_are_collapsed() {
        let r = record("9", "p", &["a", "b", "a"]);
        assert_eq!(r.consumers(), &[m("a"), m("b")]);
        assert_eq!(r.calc_members_fee().unwrap().len(), 3);
    }

    #[test]
    fn lifecycle_new_unchanged_modified_deleted() {
        let mut r = record("10", "p", &["a"]);
        assert_eq!(r.change_status(), ChangeStatus::New);

        r.set_remark("lunch").unwrap();
        assert_eq!(r.change_status(), ChangeStatus::New);

        r.mark_persisted().unwrap();
        assert_eq!(r.change_status(), ChangeStatus::Unchanged);

        r.set_amount(money("11")).unwrap();
        assert_eq!(r.change_status(), ChangeStatus::Modified);

        r.mark_removed().unwrap();
        assert!(r.is_deleted());
        assert!(matches!(r.set_remark("x"), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn failed_apply_leaves_record_untouched() {
        let mut r = record("10", "p", &["a"]);
        r.mark_persisted().unwrap();
        let before = r.clone();

        assert!(r.apply(details("20", "p", &[])).is_err());
        assert_eq!(r, before);
    }

    #[test]
    fn member_fee_returns_only_involved_members() {
        let r = record("90", "p1", &["u1", "u2", "u3"]);
        assert_eq!(r.member_fee(&m("u2")).unwrap().unwrap().consumed, money("30"));
        assert!(r.member_fee(&m("stranger")).unwrap().is_none());
    }

    fn member_name() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["ann", "bob", "cat", "dan", "eve", "fox", "gus"])
            .prop_map(str::to_string)
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        /// Property: consumed and paid both sum to the amount, one entry per participant.
        #[test]
        fn split_conserves_the_amount(
            cents in 1i64..10_000_000i64,
            payer in member_name(),
            consumers in prop::collection::vec(member_name(), 1..7),
        ) {
            let d = RecordDetails {
                amount: Money::from_cents(cents),
                date: Utc::now(),
                expense_type: "misc".to_string(),
                remark: String::new(),
                payer: m(&payer),
                consumers: consumers.iter().map(|c| m(c)).collect(),
            };
            let r = ExpenseRecord::new(RecordId::new(), ProjectId::new(), UserId::new(), d).unwrap();
            let entries = r.calc_members_fee().unwrap();

            let consumed = Money::try_sum(entries.iter().map(|e| e.consumed)).unwrap();
            let paid = Money::try_sum(entries.iter().map(|e| e.paid)).unwrap();
            prop_assert_eq!(consumed.cents(), cents);
            prop_assert_eq!(paid.cents(), cents);

            let mut participants: BTreeSet<&str> = consumers.iter().map(String::as_str).collect();
            participants.insert(payer.as_str());
            prop_assert_eq!(entries.len(), participants.len());

            let min = entries.iter().filter(|e| r.consumers().contains(&e.member)).map(|e| e.consumed).min().unwrap();
            let max = entries.iter().filter(|e| r.consumers().contains(&e.member)).map(|e| e.consumed).max().unwrap();
            prop_assert!(max.cents() - min.cents() <= 1);
        }
    }
}
