//! Persistence contracts for projects and records.
//!
//! `save` is differential: the gateway inspects the entity's change-status
//! and inserts (NEW), updates (MODIFIED, version checked), removes (DELETED)
//! or does nothing (UNCHANGED). After a successful save the entity is
//! UNCHANGED and, for projects, carries the new stored version.

use std::sync::Arc;

use thiserror::Error;

use sharefair_core::{DomainError, ProjectId, RecordId, TenantId, UserId};

use crate::project::ExpenseProject;
use crate::record::ExpenseRecord;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Stale version or duplicate insert.
    #[error("concurrency conflict: {0}")]
    Conflict(String),

    /// Entity belongs to another tenant than the one asked for.
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

pub trait ExpenseRecordGateway: Send + Sync {
    /// Persist one record into its (already stored) project.
    fn save(&self, tenant_id: TenantId, record: &mut ExpenseRecord) -> Result<(), GatewayError>;

    fn get_record_by_id(
        &self,
        tenant_id: TenantId,
        record_id: RecordId,
    ) -> Result<Option<ExpenseRecord>, GatewayError>;

    /// Live records of a project, ordered by date then insertion.
    fn list_records(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseRecord>, GatewayError>;
}

pub trait ExpenseProjectGateway: Send + Sync {
    /// Persist the project and cascade its records' change-statuses.
    fn save(&self, project: &mut ExpenseProject) -> Result<(), GatewayError>;

    fn get_project_by_id(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<Option<ExpenseProject>, GatewayError>;

    /// Remove a project with all its records.
    fn delete(&self, tenant_id: TenantId, project_id: ProjectId) -> Result<(), GatewayError>;

    /// Projects of a tenant, optionally only those owned by `owner`.
    fn list_projects(
        &self,
        tenant_id: TenantId,
        owner: Option<UserId>,
    ) -> Result<Vec<ExpenseProject>, GatewayError>;
}

impl<G> ExpenseRecordGateway for Arc<G>
where
    G: ExpenseRecordGateway + ?Sized,
{
    fn save(&self, tenant_id: TenantId, record: &mut ExpenseRecord) -> Result<(), GatewayError> {
        (**self).save(tenant_id, record)
    }

    fn get_record_by_id(
        &self,
        tenant_id: TenantId,
        record_id: RecordId,
    ) -> Result<Option<ExpenseRecord>, GatewayError> {
        (**self).get_record_by_id(tenant_id, record_id)
    }

    fn list_records(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseRecord>, GatewayError> {
        (**self).list_records(tenant_id, project_id)
    }
}

impl<G> ExpenseProjectGateway for Arc<G>
where
    G: ExpenseProjectGateway + ?Sized,
{
    fn save(&self, project: &mut ExpenseProject) -> Result<(), GatewayError> {
        (**self).save(project)
    }

    fn get_project_by_id(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<Option<ExpenseProject>, GatewayError> {
        (**self).get_project_by_id(tenant_id, project_id)
    }

    fn delete(&self, tenant_id: TenantId, project_id: ProjectId) -> Result<(), GatewayError> {
        (**self).delete(tenant_id, project_id)
    }

    fn list_projects(
        &self,
        tenant_id: TenantId,
        owner: Option<UserId>,
    ) -> Result<Vec<ExpenseProject>, GatewayError> {
        (**self).list_projects(tenant_id, owner)
    }
}
