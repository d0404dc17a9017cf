use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sharefair_core::{
    AggregateRoot, ChangeStatus, ExpectedVersion, ProjectId, RecordId, TenantId, Tracked, UserId,
};
use sharefair_expense::{
    ExpenseProject, ExpenseProjectGateway, ExpenseRecord, ExpenseRecordGateway, GatewayError,
};

#[derive(Debug, Default)]
struct State {
    projects: HashMap<(TenantId, ProjectId), ExpenseProject>,
    /// Which project holds each stored record.
    record_index: HashMap<(TenantId, RecordId), ProjectId>,
}

impl State {
    fn index_records(&mut self, project: &ExpenseProject) {
        let tenant_id = project.tenant_id();
        self.record_index
            .retain(|(t, _), p| !(*t == tenant_id && *p == project.id_typed()));
        for record in project.tracked_records() {
            self.record_index
                .insert((tenant_id, record.id_typed()), project.id_typed());
        }
    }

    fn unindex_project(&mut self, tenant_id: TenantId, project_id: ProjectId) {
        self.record_index
            .retain(|(t, _), p| !(*t == tenant_id && *p == project_id));
    }

    /// A record id claimed by a different project of the same tenant.
    fn foreign_record(&self, project: &ExpenseProject) -> Option<RecordId> {
        project
            .tracked_records()
            .iter()
            .map(ExpenseRecord::id_typed)
            .find(|id| {
                self.record_index
                    .get(&(project.tenant_id(), *id))
                    .is_some_and(|owner| *owner != project.id_typed())
            })
    }
}

/// In-memory, tenant-isolated store for projects and their records.
///
/// Intended for tests/dev. Records live inside their project; a side index
/// resolves record ids to projects.
#[derive(Debug, Default)]
pub struct InMemoryExpenseStore {
    state: RwLock<State>,
}

impl InMemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, GatewayError> {
        self.state
            .read()
            .map_err(|_| GatewayError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, GatewayError> {
        self.state
            .write()
            .map_err(|_| GatewayError::Storage("lock poisoned".to_string()))
    }

    fn stored_project<'a>(
        state: &'a mut State,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<&'a mut ExpenseProject, GatewayError> {
        state
            .projects
            .get_mut(&(tenant_id, project_id))
            .ok_or_else(|| GatewayError::NotFound(format!("project {project_id}")))
    }
}

impl ExpenseProjectGateway for InMemoryExpenseStore {
    fn save(&self, project: &mut ExpenseProject) -> Result<(), GatewayError> {
        let tenant_id = project.tenant_id();
        let project_id = project.id_typed();
        let key = (tenant_id, project_id);

        let mut guard = self.write()?;
        let state = &mut *guard;

        match project.change_status() {
            ChangeStatus::Unchanged => {
                tracing::debug!("Project {} unchanged, nothing to save", project_id);
                Ok(())
            }
            ChangeStatus::New => {
                if state.projects.contains_key(&key) {
                    return Err(GatewayError::Conflict(format!(
                        "project {project_id} already exists"
                    )));
                }
                if let Some(id) = state.foreign_record(project) {
                    return Err(GatewayError::Conflict(format!(
                        "record {id} already belongs to another project"
                    )));
                }
                project.mark_stored(1)?;
                state.index_records(project);
                state.projects.insert(key, project.clone());
                tracing::debug!("Inserted project {} for tenant {}", project_id, tenant_id);
                Ok(())
            }
            ChangeStatus::Modified => {
                let stored_version = state
                    .projects
                    .get(&key)
                    .map(AggregateRoot::version)
                    .ok_or_else(|| GatewayError::NotFound(format!("project {project_id}")))?;
                ExpectedVersion::Exact(project.version())
                    .check(stored_version)
                    .map_err(|e| GatewayError::Conflict(e.to_string()))?;
                if let Some(id) = state.foreign_record(project) {
                    return Err(GatewayError::Conflict(format!(
                        "record {id} already belongs to another project"
                    )));
                }

                let next_version = stored_version + 1;
                project.mark_stored(next_version)?;
                state.index_records(project);
                state.projects.insert(key, project.clone());
                tracing::debug!(
                    "Updated project {} for tenant {} (version {} -> {})",
                    project_id,
                    tenant_id,
                    stored_version,
                    next_version
                );
                Ok(())
            }
            ChangeStatus::Deleted => {
                if state.projects.remove(&key).is_some() {
                    state.unindex_project(tenant_id, project_id);
                    tracing::debug!("Removed project {} for tenant {}", project_id, tenant_id);
                }
                Ok(())
            }
        }
    }

    fn get_project_by_id(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<Option<ExpenseProject>, GatewayError> {
        let state = self.read()?;
        Ok(state.projects.get(&(tenant_id, project_id)).cloned())
    }

    fn delete(&self, tenant_id: TenantId, project_id: ProjectId) -> Result<(), GatewayError> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        if state.projects.remove(&(tenant_id, project_id)).is_none() {
            return Err(GatewayError::NotFound(format!("project {project_id}")));
        }
        state.unindex_project(tenant_id, project_id);
        tracing::debug!("Deleted project {} for tenant {}", project_id, tenant_id);
        Ok(())
    }

    fn list_projects(
        &self,
        tenant_id: TenantId,
        owner: Option<UserId>,
    ) -> Result<Vec<ExpenseProject>, GatewayError> {
        let state = self.read()?;
        let mut projects: Vec<ExpenseProject> = state
            .projects
            .iter()
            .filter(|((t, _), p)| *t == tenant_id && owner.is_none_or(|o| p.owner() == o))
            .map(|(_, p)| p.clone())
            .collect();
        projects.sort_by_key(|p| (p.created_at(), p.id_typed()));
        Ok(projects)
    }
}

impl ExpenseRecordGateway for InMemoryExpenseStore {
    fn save(&self, tenant_id: TenantId, record: &mut ExpenseRecord) -> Result<(), GatewayError> {
        let record_id = record.id_typed();
        let mut guard = self.write()?;
        let state = &mut *guard;

        let status = record.change_status();
        if status == ChangeStatus::Unchanged {
            return Ok(());
        }

        let indexed = state.record_index.get(&(tenant_id, record_id)).copied();
        match (status, indexed) {
            (ChangeStatus::New, Some(_)) => {
                return Err(GatewayError::Conflict(format!(
                    "record {record_id} already exists"
                )));
            }
            (ChangeStatus::Deleted, None) => {
                tracing::debug!("Record {} was never stored, nothing to remove", record_id);
                return Ok(());
            }
            (ChangeStatus::Modified, None) => {
                return Err(GatewayError::NotFound(format!("record {record_id}")));
            }
            (_, Some(owner)) if owner != record.project_id() => {
                return Err(GatewayError::Conflict(format!(
                    "record {record_id} belongs to project {owner}"
                )));
            }
            _ => {}
        }

        let stored = Self::stored_project(state, tenant_id, record.project_id())?;
        let mut staged = stored.clone();
        match status {
            ChangeStatus::New => staged.add_record(record.clone())?,
            ChangeStatus::Modified => staged.update_record(record_id, record.details()?)?,
            ChangeStatus::Deleted => staged.remove_record(record_id)?,
            ChangeStatus::Unchanged => {}
        }
        let next_version = staged.version() + 1;
        staged.mark_stored(next_version)?;
        if status != ChangeStatus::Deleted {
            record.mark_persisted()?;
        }
        *stored = staged;

        match status {
            ChangeStatus::Deleted => {
                state.record_index.remove(&(tenant_id, record_id));
            }
            _ => {
                state
                    .record_index
                    .insert((tenant_id, record_id), record.project_id());
            }
        }
        tracing::debug!(
            "Saved record {} ({}) into project {} at version {}",
            record_id,
            status,
            record.project_id(),
            next_version
        );
        Ok(())
    }

    fn get_record_by_id(
        &self,
        tenant_id: TenantId,
        record_id: RecordId,
    ) -> Result<Option<ExpenseRecord>, GatewayError> {
        let state = self.read()?;
        let Some(project_id) = state.record_index.get(&(tenant_id, record_id)) else {
            return Ok(None);
        };
        Ok(state
            .projects
            .get(&(tenant_id, *project_id))
            .and_then(|p| p.record(record_id))
            .cloned())
    }

    fn list_records(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<Vec<ExpenseRecord>, GatewayError> {
        let state = self.read()?;
        let project = state
            .projects
            .get(&(tenant_id, project_id))
            .ok_or_else(|| GatewayError::NotFound(format!("project {project_id}")))?;
        Ok(project.records().into_iter().cloned().collect())
    }
}
