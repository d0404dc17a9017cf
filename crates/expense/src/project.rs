//! Expense project: a roster of members and the records they share.
//!
//! The project is the aggregate root. Records are added, edited and removed
//! through it so that roster membership is checked on every write and the
//! project version guards concurrent edits.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharefair_core::{
    AggregateRoot, ChangeEvent, ChangeStatus, DomainError, DomainResult, Entity, Money,
    ProjectId, RecordId, TenantId, Tracked, UserId,
};

use crate::balance::{MemberBalance, MemberRecordFee};
use crate::export::ExpenseRecordRow;
use crate::member::{MemberId, Roster};
use crate::record::{ExpenseRecord, RecordDetails};
use crate::statistics::{self, ExpenseTypeShare};

/// Project names must be shorter than this many characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Aggregate root: ExpenseProject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseProject {
    id: ProjectId,
    tenant_id: TenantId,
    owner: UserId,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    roster: Roster,
    /// Includes records removed since the last save, until the gateway drops them.
    records: Vec<ExpenseRecord>,
    version: u64,
    status: ChangeStatus,
}

impl ExpenseProject {
    pub fn new(
        id: ProjectId,
        tenant_id: TenantId,
        owner: UserId,
        name: &str,
        description: &str,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            tenant_id,
            owner,
            name: validate_name(name)?,
            description: description.trim().to_string(),
            created_at,
            roster: Roster::new(),
            records: Vec::new(),
            version: 0,
            status: ChangeStatus::New,
        })
    }

    pub fn id_typed(&self) -> ProjectId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    pub fn ensure_owner(&self, user: UserId) -> DomainResult<()> {
        if self.owner != user {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> DomainResult<()> {
        let name = validate_name(name)?;
        let next = self.next_status()?;
        self.name = name;
        self.status = next;
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) -> DomainResult<()> {
        let next = self.next_status()?;
        self.description = description.trim().to_string();
        self.status = next;
        Ok(())
    }

    // --- roster ---

    pub fn members(&self) -> &[MemberId] {
        self.roster.as_slice()
    }

    pub fn has_member(&self, member: &MemberId) -> bool {
        self.roster.contains(member)
    }

    pub fn add_member(&mut self, member: MemberId) -> DomainResult<()> {
        let next = self.next_status()?;
        self.roster.add(member)?;
        self.status = next;
        Ok(())
    }

    /// Add several members; a duplicate anywhere in the batch adds none.
    pub fn add_members<I>(&mut self, members: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = MemberId>,
    {
        let next = self.next_status()?;
        self.roster.add_all(members)?;
        self.status = next;
        Ok(())
    }

    // --- records ---

    /// Live records ordered by date, then by insertion.
    pub fn records(&self) -> Vec<&ExpenseRecord> {
        let mut live: Vec<&ExpenseRecord> = self.live_records().collect();
        live.sort_by_key(|r| r.date());
        live
    }

    pub fn record(&self, id: RecordId) -> Option<&ExpenseRecord> {
        self.live_records().find(|r| r.id_typed() == id)
    }

    /// Every record the project holds, including ones removed but not yet saved.
    pub fn tracked_records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn add_record(&mut self, record: ExpenseRecord) -> DomainResult<()> {
        if record.project_id() != self.id {
            return Err(DomainError::validation(format!(
                "record {} belongs to project {}, not {}",
                record.id_typed(),
                record.project_id(),
                self.id
            )));
        }
        if record.is_deleted() {
            return Err(DomainError::invalid_state(format!(
                "record {} has been deleted",
                record.id_typed()
            )));
        }
        if self.records.iter().any(|r| r.id_typed() == record.id_typed()) {
            return Err(DomainError::conflict(format!(
                "record {} already exists",
                record.id_typed()
            )));
        }
        let details = record.details()?;
        self.ensure_participants(&details)?;

        let next = self.next_status()?;
        self.records.push(record);
        self.status = next;
        Ok(())
    }

    pub fn update_record(&mut self, id: RecordId, details: RecordDetails) -> DomainResult<()> {
        let next = self.next_status()?;
        let details = details.normalized()?;
        self.ensure_participants(&details)?;
        self.live_record_mut(id)?.apply(details)?;
        self.status = next;
        Ok(())
    }

    pub fn remove_record(&mut self, id: RecordId) -> DomainResult<()> {
        let next = self.next_status()?;
        self.live_record_mut(id)?.mark_removed()?;
        self.status = next;
        Ok(())
    }

    pub fn mark_removed(&mut self) -> DomainResult<()> {
        self.status = self.status.transition(ChangeEvent::Removed)?;
        Ok(())
    }

    /// Called by a gateway once the project is stored at `version`.
    pub fn mark_stored(&mut self, version: u64) -> DomainResult<()> {
        self.mark_persisted()?;
        self.version = version;
        Ok(())
    }

    // --- reporting ---

    /// Net balance (`paid - consumed`) per member over all live records.
    ///
    /// Every roster member appears, settled ones with zero. Balances sum to zero.
    pub fn aggregate_balances(&self) -> DomainResult<BTreeMap<MemberId, Money>> {
        let mut balances: BTreeMap<MemberId, Money> = self
            .roster
            .iter()
            .map(|m| (m.clone(), Money::ZERO))
            .collect();

        for record in self.live_records() {
            for entry in record.calc_members_fee()? {
                let net = entry.net()?;
                let slot = balances.entry(entry.member).or_insert(Money::ZERO);
                *slot = slot.checked_add(net)?;
            }
        }

        Ok(balances)
    }

    /// Paid / consumed / net figures per member, in roster order.
    pub fn member_summaries(&self) -> DomainResult<Vec<MemberBalance>> {
        #[derive(Default)]
        struct Totals {
            record_amount: Money,
            paid: Money,
            consumed: Money,
        }

        let mut totals: BTreeMap<MemberId, Totals> = BTreeMap::new();
        for record in self.live_records() {
            let amount = record.details()?.amount;
            for entry in record.calc_members_fee()? {
                let t = totals.entry(entry.member).or_default();
                t.record_amount = t.record_amount.checked_add(amount)?;
                t.paid = t.paid.checked_add(entry.paid)?;
                t.consumed = t.consumed.checked_add(entry.consumed)?;
            }
        }

        let mut order: Vec<MemberId> = self.roster.iter().cloned().collect();
        order.extend(totals.keys().filter(|m| !self.roster.contains(m)).cloned());

        order
            .into_iter()
            .map(|member| {
                let t = totals.remove(&member).unwrap_or_default();
                MemberBalance::from_totals(member, t.record_amount, t.paid, t.consumed)
            })
            .collect()
    }

    /// The records `member` took part in, from their side.
    pub fn member_fee_details(&self, member: &MemberId) -> DomainResult<Vec<MemberRecordFee>> {
        if !self.has_member(member) {
            return Err(DomainError::not_found(format!(
                "member '{member}' in project {}",
                self.id
            )));
        }

        let mut details = Vec::new();
        for record in self.records() {
            let Some(entry) = record.member_fee(member)? else {
                continue;
            };
            let d = record.details()?;
            details.push(MemberRecordFee {
                record_id: record.id_typed(),
                date: d.date,
                amount: d.amount,
                payer: d.payer,
                expense_type: d.expense_type,
                remark: d.remark,
                paid: entry.paid,
                consumed: entry.consumed,
                consumers: d.consumers,
            });
        }
        Ok(details)
    }

    pub fn expense_type_statistics(&self) -> DomainResult<Vec<ExpenseTypeShare>> {
        statistics::expense_type_statistics(self.live_records())
    }

    pub fn export_rows(&self, date_format: &str) -> DomainResult<Vec<ExpenseRecordRow>> {
        self.records()
            .into_iter()
            .map(|r| ExpenseRecordRow::from_record(r, &self.name, date_format))
            .collect()
    }

    fn live_records(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.records.iter().filter(|r| !r.is_deleted())
    }

    fn live_record_mut(&mut self, id: RecordId) -> DomainResult<&mut ExpenseRecord> {
        let project_id = self.id;
        self.records
            .iter_mut()
            .find(|r| r.id_typed() == id && !r.is_deleted())
            .ok_or_else(|| DomainError::not_found(format!("record {id} in project {project_id}")))
    }

    fn ensure_participants(&self, details: &RecordDetails) -> DomainResult<()> {
        for member in details.participants() {
            self.roster.ensure_contains(member)?;
        }
        Ok(())
    }

    fn next_status(&self) -> DomainResult<ChangeStatus> {
        self.status.transition(ChangeEvent::Mutated)
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("project name must not be blank"));
    }
    if trimmed.chars().count() >= MAX_NAME_CHARS {
        return Err(DomainError::validation(format!(
            "project name must be shorter than {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

impl AggregateRoot for ExpenseProject {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Entity for ExpenseProject {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Tracked for ExpenseProject {
    fn change_status(&self) -> ChangeStatus {
        self.status
    }

    /// Drops removed records and marks the rest as stored.
    fn mark_persisted(&mut self) -> DomainResult<()> {
        let status = self.status.transition(ChangeEvent::Persisted)?;
        self.records.retain(|r| !r.is_deleted());
        for record in &mut self.records {
            record.mark_persisted()?;
        }
        self.status = status;
        Ok(())
    }
}
