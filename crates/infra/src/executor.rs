//! Command execution pipeline (application-level orchestration).
//!
//! Every operation follows the same shape:
//!
//! ```text
//! CallContext + command
//!   ↓
//! 1. Load the project (tenant-scoped) and check the operator owns it
//!   ↓
//! 2. Apply the change through the aggregate (pure domain logic)
//!   ↓
//! 3. Save through the gateway (differential, optimistic version check)
//! ```
//!
//! Read-side operations (balances, statistics, export) stop after step 1 and
//! compute from the loaded aggregate.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use sharefair_core::{CallContext, DomainError, Money, ProjectId, RecordId};
use sharefair_expense::{
    AddProjectMembers, CreateExpenseRecord, CreateProject, DeleteExpenseRecord, DeleteProject,
    ExpenseProject, ExpenseProjectGateway, ExpenseRecord, ExpenseRecordGateway, ExpenseRecordRow,
    ExpenseTypeShare, GatewayError, MemberBalance, MemberId, MemberRecordFee,
    UpdateExpenseRecord,
};

use crate::config::{ExportConfig, ShareFairConfig};
use crate::gateway::InMemoryExpenseStore;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input on a command.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The entity is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic concurrency failure; reload and retry.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    /// The operator does not own the project.
    #[error("unauthorized")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidState(msg) => ServiceError::InvalidState(msg),
            DomainError::Arithmetic(msg) => ServiceError::Arithmetic(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Concurrency(msg),
            DomainError::Unauthorized => ServiceError::Unauthorized,
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::NotFound(what) => ServiceError::NotFound(what),
            GatewayError::Conflict(msg) => ServiceError::Concurrency(msg),
            GatewayError::TenantIsolation(msg) => ServiceError::TenantIsolation(msg),
            GatewayError::Domain(err) => ServiceError::from(err),
            GatewayError::Storage(msg) => ServiceError::Storage(msg),
        }
    }
}

/// Application service for expense projects and records.
///
/// `G` provides both gateways; the in-memory store does, a database adapter
/// would too.
#[derive(Debug)]
pub struct ExpenseCommandExecutor<G> {
    gateway: G,
    export: ExportConfig,
}

impl<G> ExpenseCommandExecutor<G> {
    pub fn new(gateway: G, export: ExportConfig) -> Self {
        Self { gateway, export }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn into_inner(self) -> G {
        self.gateway
    }
}

impl<G> ExpenseCommandExecutor<G>
where
    G: ExpenseProjectGateway + ExpenseRecordGateway,
{
    pub fn create_project(
        &self,
        ctx: &CallContext,
        cmd: CreateProject,
    ) -> Result<ExpenseProject, ServiceError> {
        let _span = command_span(ctx, "create_project").entered();
        log_payload(&cmd);

        let mut project =
            cmd.to_project(ProjectId::new(), ctx.tenant_id, ctx.operator, Utc::now())?;
        ExpenseProjectGateway::save(&self.gateway, &mut project)?;

        tracing::info!(
            "Created project {} with {} member(s)",
            project.id_typed(),
            project.members().len()
        );
        Ok(project)
    }

    pub fn add_members(
        &self,
        ctx: &CallContext,
        cmd: AddProjectMembers,
    ) -> Result<Vec<MemberId>, ServiceError> {
        let _span = command_span(ctx, "add_members").entered();
        log_payload(&cmd);

        let members = cmd.member_ids()?;
        let mut project = self.load_owned(ctx, cmd.project_id)?;
        project.add_members(members)?;
        ExpenseProjectGateway::save(&self.gateway, &mut project)?;

        tracing::info!(
            "Project {} now has {} member(s)",
            project.id_typed(),
            project.members().len()
        );
        Ok(project.members().to_vec())
    }

    pub fn list_members(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<Vec<MemberId>, ServiceError> {
        Ok(self.load_owned(ctx, project_id)?.members().to_vec())
    }

    pub fn add_record(
        &self,
        ctx: &CallContext,
        cmd: CreateExpenseRecord,
    ) -> Result<ExpenseRecord, ServiceError> {
        let _span = command_span(ctx, "add_record").entered();
        log_payload(&cmd);

        let mut project = self.load_owned(ctx, cmd.project_id)?;
        let record = cmd.to_record(RecordId::new(), ctx.operator, Utc::now())?;
        let record_id = record.id_typed();
        project.add_record(record)?;
        ExpenseProjectGateway::save(&self.gateway, &mut project)?;

        let stored = project
            .record(record_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("record {record_id}")))?;
        tracing::info!(
            "Added record {} ({}) to project {}",
            record_id,
            cmd.amount,
            project.id_typed()
        );
        Ok(stored)
    }

    pub fn update_record(
        &self,
        ctx: &CallContext,
        cmd: UpdateExpenseRecord,
    ) -> Result<ExpenseRecord, ServiceError> {
        let _span = command_span(ctx, "update_record").entered();
        log_payload(&cmd);

        let mut project = self.load_owned(ctx, cmd.project_id)?;
        let current_date = project
            .record(cmd.record_id)
            .map(ExpenseRecord::date)
            .ok_or_else(|| ServiceError::NotFound(format!("record {}", cmd.record_id)))?;
        project.update_record(cmd.record_id, cmd.details(current_date)?)?;
        ExpenseProjectGateway::save(&self.gateway, &mut project)?;

        let stored = project
            .record(cmd.record_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("record {}", cmd.record_id)))?;
        tracing::info!("Updated record {} in project {}", cmd.record_id, cmd.project_id);
        Ok(stored)
    }

    pub fn delete_record(
        &self,
        ctx: &CallContext,
        cmd: DeleteExpenseRecord,
    ) -> Result<(), ServiceError> {
        let _span = command_span(ctx, "delete_record").entered();

        let mut project = self.load_owned(ctx, cmd.project_id)?;
        project.remove_record(cmd.record_id)?;
        ExpenseProjectGateway::save(&self.gateway, &mut project)?;

        tracing::info!("Deleted record {} from project {}", cmd.record_id, cmd.project_id);
        Ok(())
    }

    pub fn delete_project(&self, ctx: &CallContext, cmd: DeleteProject) -> Result<(), ServiceError> {
        let _span = command_span(ctx, "delete_project").entered();

        let mut project = self.load_owned(ctx, cmd.project_id)?;
        project.mark_removed()?;
        ExpenseProjectGateway::save(&self.gateway, &mut project)?;

        tracing::info!("Deleted project {}", cmd.project_id);
        Ok(())
    }

    pub fn get_project(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<ExpenseProject, ServiceError> {
        self.load_owned(ctx, project_id)
    }

    /// Projects owned by the operator.
    pub fn list_projects(&self, ctx: &CallContext) -> Result<Vec<ExpenseProject>, ServiceError> {
        Ok(self
            .gateway
            .list_projects(ctx.tenant_id, Some(ctx.operator))?)
    }

    pub fn list_records(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseRecord>, ServiceError> {
        self.load_owned(ctx, project_id)?;
        Ok(self.gateway.list_records(ctx.tenant_id, project_id)?)
    }

    pub fn get_record(
        &self,
        ctx: &CallContext,
        record_id: RecordId,
    ) -> Result<ExpenseRecord, ServiceError> {
        let record = self
            .gateway
            .get_record_by_id(ctx.tenant_id, record_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("record {record_id}")))?;
        self.load_owned(ctx, record.project_id())?;
        Ok(record)
    }

    pub fn balances(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<BTreeMap<MemberId, Money>, ServiceError> {
        Ok(self.load_owned(ctx, project_id)?.aggregate_balances()?)
    }

    /// Who needs to pay and who needs to receive, per member.
    pub fn sharing_summary(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<Vec<MemberBalance>, ServiceError> {
        Ok(self.load_owned(ctx, project_id)?.member_summaries()?)
    }

    pub fn member_fee_details(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
        member: &str,
    ) -> Result<Vec<MemberRecordFee>, ServiceError> {
        let member = MemberId::new(member)?;
        Ok(self
            .load_owned(ctx, project_id)?
            .member_fee_details(&member)?)
    }

    pub fn export_records(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseRecordRow>, ServiceError> {
        let _span = command_span(ctx, "export_records").entered();

        let rows = self
            .load_owned(ctx, project_id)?
            .export_rows(&self.export.date_format)?;
        tracing::info!("Exported {} row(s) from project {}", rows.len(), project_id);
        Ok(rows)
    }

    pub fn expense_type_statistics(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseTypeShare>, ServiceError> {
        Ok(self
            .load_owned(ctx, project_id)?
            .expense_type_statistics()?)
    }

    fn load_owned(
        &self,
        ctx: &CallContext,
        project_id: ProjectId,
    ) -> Result<ExpenseProject, ServiceError> {
        let project = self
            .gateway
            .get_project_by_id(ctx.tenant_id, project_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("project {project_id}")))?;
        if project.tenant_id() != ctx.tenant_id {
            return Err(ServiceError::TenantIsolation(format!(
                "project {project_id} loaded for the wrong tenant"
            )));
        }
        if let Err(err) = project.ensure_owner(ctx.operator) {
            tracing::warn!(
                "Operator {} denied access to project {}",
                ctx.operator,
                project_id
            );
            return Err(err.into());
        }
        Ok(project)
    }
}

/// Initialize logging from `config` and wire an executor over the in-memory store.
pub fn bootstrap(
    config: &ShareFairConfig,
) -> anyhow::Result<ExpenseCommandExecutor<InMemoryExpenseStore>> {
    sharefair_observability::init(&config.log)?;
    tracing::info!("Expense executor ready (export date format {})", config.export.date_format);
    Ok(ExpenseCommandExecutor::new(
        InMemoryExpenseStore::new(),
        config.export.clone(),
    ))
}

fn command_span(ctx: &CallContext, command: &'static str) -> tracing::Span {
    tracing::info_span!(
        "expense_command",
        command,
        tenant_id = %ctx.tenant_id,
        operator = %ctx.operator,
        correlation_id = %ctx.correlation_id
    )
}

fn log_payload<T: Serialize>(payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => tracing::debug!("Command payload: {}", json),
        Err(e) => tracing::debug!("Command payload not serializable: {}", e),
    }
}
