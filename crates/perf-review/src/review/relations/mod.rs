//! Period-scoped leader graph.
//!
//! Every write goes through `EmployeeRelation::normalize`, so `free_person` and an empty
//! leader set always move together. Role changes away from project leader cascade one level
//! into the rest of the period and are committed in a single repository call.

mod cascade;
mod csv_import;
mod import;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Attribute, Employee, EmployeeId, EmployeeRelation, Period, RelationRole};
use super::error::ReviewError;
use super::leaders::LeaderSet;
use super::repository::{DirectoryStore, RelationStore, RepositoryError};

pub use csv_import::{parse_relation_records, read_relation_csv, RelationCsvError};
pub use import::{ImportRecord, ImportReport, ImportRequest};

/// Who may request a role change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionMode {
    /// Interactive edits: the role rank may only stay or go down.
    Client,
    /// Imports and generators: any transition is allowed.
    System,
}

/// Full relation write for one employee and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationInput {
    pub period: Period,
    pub employee_id: EmployeeId,
    pub role: RelationRole,
    #[serde(default)]
    pub leader_names: Vec<String>,
    #[serde(default)]
    pub project_names: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Partial edit accepted at the role-edit boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationPatch {
    #[serde(default)]
    pub role: Option<RelationRole>,
    #[serde(default)]
    pub attributes: Option<Vec<Attribute>>,
    #[serde(default)]
    pub leaders: Option<LeaderSet>,
    #[serde(default)]
    pub project_names: Option<Vec<String>>,
}

/// Result of a role change: the edited relation and every peer the cascade rewrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleChange {
    pub relation: EmployeeRelation,
    pub cascaded: Vec<EmployeeRelation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationStatistics {
    pub period: Period,
    pub project_leader_count: usize,
    pub project_member_count: usize,
    pub free_person_count: usize,
    pub total_count: usize,
}

/// Relation projection with the employee's display name and derived leader count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationView {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub period: Period,
    pub role: RelationRole,
    pub leaders: LeaderSet,
    pub leader_count: usize,
    pub project_names: Vec<String>,
    pub attributes: BTreeSet<Attribute>,
}

pub struct RelationGraph<R> {
    repository: Arc<R>,
}

impl<R> RelationGraph<R>
where
    R: DirectoryStore + RelationStore + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Upserts the relation for `(employee, period)`. Replacing a project leader with a lower
    /// role still cascades into the period.
    pub fn set_relation(&self, input: RelationInput) -> Result<EmployeeRelation, ReviewError> {
        let employee = self.employee(input.employee_id)?;
        let period = input.period;

        let mut relation = EmployeeRelation::new(employee.id, period.clone(), input.role);
        relation.leaders = LeaderSet::from_names(&input.leader_names);
        relation.project_names = input
            .project_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        relation.attributes = input.attributes.into_iter().collect();

        let saved = self.repository.update_relations(&period, |period_relations| {
            let mut peers = Vec::new();
            if let Some(existing) = period_relations
                .iter()
                .find(|stored| stored.employee_id == employee.id)
            {
                relation.id = existing.id;
                if existing.role != relation.role {
                    peers = cascade::plan_role_change(
                        existing,
                        &employee.name,
                        relation.role,
                        period_relations,
                    )
                    .peers;
                }
            }
            relation.normalize(&employee.name);

            let mut batch = vec![relation];
            batch.extend(peers);
            Ok::<_, ReviewError>(batch)
        })?;
        let (relation, cascaded) = split_batch(saved)?;
        info!(
            employee = employee.id.0,
            period = %period,
            role = relation.role.label(),
            cascaded = cascaded.len(),
            "relation stored"
        );
        Ok(relation)
    }

    pub fn change_role(
        &self,
        period: &Period,
        employee_id: EmployeeId,
        next: RelationRole,
        mode: TransitionMode,
    ) -> Result<RoleChange, ReviewError> {
        let patch = RelationPatch {
            role: Some(next),
            ..RelationPatch::default()
        };
        self.apply(period, employee_id, patch, mode)
    }

    /// Applies a partial edit in client mode; a role that differs from the stored one
    /// cascades like `change_role`.
    pub fn update_relation(
        &self,
        period: &Period,
        employee_id: EmployeeId,
        patch: RelationPatch,
    ) -> Result<RoleChange, ReviewError> {
        self.apply(period, employee_id, patch, TransitionMode::Client)
    }

    /// Replaces every relation of the period with the resolvable records.
    pub fn bulk_replace(&self, request: ImportRequest) -> Result<ImportReport, ReviewError> {
        let period = Period::parse(&request.period)?;
        if request.relations.is_empty() {
            return Err(ReviewError::validation("import contains no relations"));
        }

        let staged = import::stage_records(&period, &request.relations, |name| {
            Ok(self.repository.employee_by_name(name)?)
        })?;
        let saved = self.repository.replace_relations(&period, staged.relations)?;

        if !staged.errors.is_empty() {
            warn!(
                period = %period,
                rejected = staged.errors.len(),
                "relation import skipped records"
            );
        }
        info!(period = %period, created = saved.len(), "relation import committed");

        Ok(ImportReport {
            success: true,
            created_count: saved.len(),
            errors: staged.errors,
        })
    }

    pub fn statistics(&self, period: &Period) -> Result<RelationStatistics, ReviewError> {
        let relations = self.repository.relations_in(period)?;
        let count = |role: RelationRole| relations.iter().filter(|r| r.role == role).count();

        let project_leader_count = count(RelationRole::ProjectLeader);
        let project_member_count = count(RelationRole::ProjectMember);
        let free_person_count = count(RelationRole::FreePerson);

        Ok(RelationStatistics {
            period: period.clone(),
            project_leader_count,
            project_member_count,
            free_person_count,
            total_count: project_leader_count + project_member_count + free_person_count,
        })
    }

    /// Ordered by employee id.
    pub fn relations(&self, period: &Period) -> Result<Vec<RelationView>, ReviewError> {
        self.repository
            .relations_in(period)?
            .into_iter()
            .map(|relation| {
                let employee = self.employee(relation.employee_id)?;
                Ok(view(employee, relation))
            })
            .collect()
    }

    pub fn relation(
        &self,
        period: &Period,
        employee_id: EmployeeId,
    ) -> Result<RelationView, ReviewError> {
        let employee = self.employee(employee_id)?;
        let relation = self.stored_relation(period, employee_id)?;
        Ok(view(employee, relation))
    }

    fn apply(
        &self,
        period: &Period,
        employee_id: EmployeeId,
        patch: RelationPatch,
        mode: TransitionMode,
    ) -> Result<RoleChange, ReviewError> {
        let employee = self.employee(employee_id)?;
        let saved = self.repository.update_relations(period, |period_relations| {
            let current = period_relations
                .iter()
                .find(|stored| stored.employee_id == employee_id)
                .cloned()
                .ok_or_else(|| missing_relation(period, employee_id))?;
            plan_patch(current, &employee.name, patch, mode, period_relations)
                .map(cascade::CascadePlan::into_batch)
        })?;

        let (relation, cascaded) = split_batch(saved)?;
        if !cascaded.is_empty() {
            info!(
                employee = employee_id.0,
                period = %period,
                role = relation.role.label(),
                cascaded = cascaded.len(),
                "role change cascaded"
            );
        }

        Ok(RoleChange { relation, cascaded })
    }

    fn employee(&self, id: EmployeeId) -> Result<Employee, ReviewError> {
        self.repository
            .employee(id)?
            .ok_or_else(|| ReviewError::not_found(id.to_string()))
    }

    fn stored_relation(
        &self,
        period: &Period,
        employee_id: EmployeeId,
    ) -> Result<EmployeeRelation, ReviewError> {
        self.repository
            .relation(employee_id, period)?
            .ok_or_else(|| missing_relation(period, employee_id))
    }
}

fn missing_relation(period: &Period, employee_id: EmployeeId) -> ReviewError {
    ReviewError::not_found(format!("relation of {employee_id} in period {period}"))
}

/// Checks the transition, applies the patch fields, then either normalizes in place or plans
/// the cascade against the rest of the period.
fn plan_patch(
    mut current: EmployeeRelation,
    own_name: &str,
    patch: RelationPatch,
    mode: TransitionMode,
    period_relations: &[EmployeeRelation],
) -> Result<cascade::CascadePlan, ReviewError> {
    if let Some(next) = patch.role {
        if mode == TransitionMode::Client && !current.role.can_transition_to(next) {
            return Err(ReviewError::validation(format!(
                "{own_name} cannot move from {} to {next}",
                current.role
            )));
        }
    }

    if let Some(leaders) = patch.leaders {
        current.leaders = leaders;
    }
    if let Some(attributes) = patch.attributes {
        current.attributes = attributes.into_iter().collect();
    }
    if let Some(project_names) = patch.project_names {
        current.project_names = project_names;
    }

    let next = patch.role.unwrap_or(current.role);
    if next == current.role {
        current.normalize(own_name);
        return Ok(cascade::CascadePlan {
            relation: current,
            peers: Vec::new(),
        });
    }
    Ok(cascade::plan_role_change(
        &current,
        own_name,
        next,
        period_relations,
    ))
}

/// The edited relation always leads the batch.
fn split_batch(
    saved: Vec<EmployeeRelation>,
) -> Result<(EmployeeRelation, Vec<EmployeeRelation>), ReviewError> {
    let mut saved = saved.into_iter();
    let relation = saved.next().ok_or_else(|| {
        ReviewError::Repository(RepositoryError::Unavailable(
            "relation batch came back empty".to_string(),
        ))
    })?;
    Ok((relation, saved.collect()))
}

fn view(employee: Employee, relation: EmployeeRelation) -> RelationView {
    let leader_count = relation.leader_count();
    RelationView {
        employee_id: employee.id,
        employee_name: employee.name,
        period: relation.period,
        leader_count,
        role: relation.role,
        leaders: relation.leaders,
        project_names: relation.project_names,
        attributes: relation.attributes,
    }
}
