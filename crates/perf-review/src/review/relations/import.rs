use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::review::domain::{Attribute, Employee, EmployeeRelation, Period, RelationRole};
use crate::review::error::ReviewError;
use crate::review::leaders::LeaderSet;

/// Bulk-import payload for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub period: String,
    #[serde(default)]
    pub relations: Vec<ImportRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub employee_name: String,
    #[serde(default)]
    pub leader_names: Vec<String>,
    #[serde(default)]
    pub project_names: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Outcome of a bulk replace. Unresolvable records are listed in `errors`; they never fail
/// the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub success: bool,
    pub created_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct StagedImport {
    pub(crate) relations: Vec<EmployeeRelation>,
    pub(crate) errors: Vec<String>,
}

/// Resolves every record against the directory and builds normalized relations.
pub(crate) fn stage_records<F>(
    period: &Period,
    records: &[ImportRecord],
    mut lookup: F,
) -> Result<StagedImport, ReviewError>
where
    F: FnMut(&str) -> Result<Option<Employee>, ReviewError>,
{
    let mut staged = StagedImport::default();
    let mut seen = HashSet::new();

    for record in records {
        let name = record.employee_name.trim();
        let Some(employee) = lookup(name)? else {
            staged.errors.push(format!("employee '{name}' does not exist"));
            continue;
        };
        if !seen.insert(employee.id) {
            staged
                .errors
                .push(format!("employee '{name}' appears more than once"));
            continue;
        }

        match build_relation(period, &employee, record) {
            Ok(relation) => staged.relations.push(relation),
            Err(message) => staged.errors.push(format!("employee '{name}': {message}")),
        }
    }

    Ok(staged)
}

fn build_relation(
    period: &Period,
    employee: &Employee,
    record: &ImportRecord,
) -> Result<EmployeeRelation, String> {
    let role = match record.role.as_deref().map(str::trim) {
        None | Some("") => RelationRole::FreePerson,
        Some(raw) => raw.parse::<RelationRole>().map_err(|_| format!("unknown role '{raw}'"))?,
    };
    let attributes = record
        .attributes
        .iter()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            raw.parse::<Attribute>()
                .map_err(|_| format!("unknown attribute '{}'", raw.trim()))
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    let leaders = LeaderSet::from_names(&record.leader_names);
    let mut relation = EmployeeRelation::new(employee.id, period.clone(), role);
    if leaders.is_empty() {
        relation.role = RelationRole::FreePerson;
    }
    relation.leaders = leaders;
    relation.project_names = record
        .project_names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    relation.attributes = attributes;
    relation.normalize(&employee.name);

    Ok(relation)
}
