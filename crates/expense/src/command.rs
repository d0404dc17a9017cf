//! Inbound commands and their conversion into domain objects.
//!
//! Commands carry raw user input (decimal strings, member names). Tenant and
//! operator come from the call context, never from the command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharefair_core::{DomainResult, Money, ProjectId, RecordId, TenantId, UserId};

use crate::member::{MemberId, parse_members};
use crate::project::ExpenseProject;
use crate::record::{ExpenseRecord, RecordDetails};

/// Command: CreateExpenseRecord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExpenseRecord {
    pub project_id: ProjectId,
    pub amount: String,
    /// Defaults to the time the command is handled.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub expense_type: String,
    #[serde(default)]
    pub remark: String,
    pub payer: String,
    pub consumers: Vec<String>,
}

impl CreateExpenseRecord {
    pub fn details(&self, now: DateTime<Utc>) -> DomainResult<RecordDetails> {
        build_details(
            &self.amount,
            self.date.unwrap_or(now),
            &self.expense_type,
            &self.remark,
            &self.payer,
            &self.consumers,
        )
    }

    pub fn to_record(
        &self,
        id: RecordId,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<ExpenseRecord> {
        ExpenseRecord::new(id, self.project_id, created_by, self.details(now)?)
    }
}

/// Command: UpdateExpenseRecord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateExpenseRecord {
    pub project_id: ProjectId,
    pub record_id: RecordId,
    pub amount: String,
    /// Keeps the stored date when absent.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub expense_type: String,
    #[serde(default)]
    pub remark: String,
    pub payer: String,
    pub consumers: Vec<String>,
}

impl UpdateExpenseRecord {
    pub fn details(&self, current_date: DateTime<Utc>) -> DomainResult<RecordDetails> {
        build_details(
            &self.amount,
            self.date.unwrap_or(current_date),
            &self.expense_type,
            &self.remark,
            &self.payer,
            &self.consumers,
        )
    }
}

/// Command: DeleteExpenseRecord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteExpenseRecord {
    pub project_id: ProjectId,
    pub record_id: RecordId,
}

/// Command: CreateProject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl CreateProject {
    pub fn to_project(
        &self,
        id: ProjectId,
        tenant_id: TenantId,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<ExpenseProject> {
        let mut project =
            ExpenseProject::new(id, tenant_id, owner, &self.name, &self.description, now)?;
        project.add_members(parse_members(&self.members)?)?;
        Ok(project)
    }
}

/// Command: AddProjectMembers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProjectMembers {
    pub project_id: ProjectId,
    pub members: Vec<String>,
}

impl AddProjectMembers {
    pub fn member_ids(&self) -> DomainResult<Vec<MemberId>> {
        parse_members(&self.members)
    }
}

/// Command: DeleteProject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProject {
    pub project_id: ProjectId,
}

fn build_details(
    amount: &str,
    date: DateTime<Utc>,
    expense_type: &str,
    remark: &str,
    payer: &str,
    consumers: &[String],
) -> DomainResult<RecordDetails> {
    RecordDetails {
        amount: Money::parse(amount)?,
        date,
        expense_type: expense_type.to_string(),
        remark: remark.to_string(),
        payer: MemberId::new(payer)?,
        consumers: parse_members(consumers)?,
    }
    .normalized()
}
