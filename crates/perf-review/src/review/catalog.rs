use std::sync::Arc;

use tracing::info;

use super::domain::{DepartmentId, Indicator, IndicatorDraft};
use super::error::ReviewError;
use super::repository::{DirectoryStore, IndicatorStore};

/// Per-department scoring items.
pub struct IndicatorCatalog<R> {
    repository: Arc<R>,
}

impl<R> IndicatorCatalog<R>
where
    R: DirectoryStore + IndicatorStore + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Ordered by sequence. Unknown departments are a `NotFound`.
    pub fn indicators_for(&self, department: DepartmentId) -> Result<Vec<Indicator>, ReviewError> {
        self.require_department(department)?;
        Ok(self.repository.indicators_for(department)?)
    }

    pub fn upsert(&self, draft: IndicatorDraft) -> Result<Indicator, ReviewError> {
        draft.validate()?;
        self.require_department(draft.department_id)?;

        let indicator = self.repository.upsert_indicator(draft)?;
        info!(
            department = indicator.department_id.0,
            sequence = indicator.sequence,
            kind = indicator.kind.label(),
            "indicator stored"
        );
        Ok(indicator)
    }

    fn require_department(&self, department: DepartmentId) -> Result<(), ReviewError> {
        match self.repository.department(department)? {
            Some(_) => Ok(()),
            None => Err(ReviewError::not_found(department.to_string())),
        }
    }
}
