use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{
    Assessment, AssessmentStatus, DepartmentId, Employee, EmployeeId, Indicator, IndicatorKind,
    Period, ScoreSheet,
};
use super::error::ReviewError;
use super::repository::{AssessmentStore, DirectoryStore, IndicatorStore, RepositoryError};

/// One resolved line of a score sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub sequence: u32,
    pub kind: IndicatorKind,
    pub raw: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub total: f64,
    pub components: Vec<ScoreComponent>,
    /// Keys that did not resolve to an indicator of the department.
    pub skipped: Vec<String>,
}

/// Sums a single rater's sheet against the department catalog.
pub struct AssessmentScorer;

impl AssessmentScorer {
    /// Base and bonus inputs add, penalty magnitudes subtract. No clamping happens here.
    pub fn score(indicators: &[Indicator], scores: &ScoreSheet) -> ScoreOutcome {
        let mut total = 0.0;
        let mut components = Vec::new();
        let mut skipped = Vec::new();

        for (key, &raw) in scores {
            let Some(indicator) = resolve(indicators, key) else {
                skipped.push(key.clone());
                continue;
            };
            let contribution = indicator.contribution(raw);
            total += contribution;
            components.push(ScoreComponent {
                sequence: indicator.sequence,
                kind: indicator.kind,
                raw,
                contribution,
            });
        }

        ScoreOutcome {
            total,
            components,
            skipped,
        }
    }
}

fn resolve<'a>(indicators: &'a [Indicator], key: &str) -> Option<&'a Indicator> {
    let sequence = key.trim().parse::<u32>().ok()?;
    indicators
        .iter()
        .find(|indicator| indicator.sequence == sequence)
}

/// How `submit` treats an existing `(employee, evaluator, period)` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    #[default]
    #[serde(rename = "create")]
    CreateOnly,
    #[serde(rename = "upsert")]
    Upsert,
}

/// Rater input. The total is always derived, so it is not accepted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssessmentSubmission {
    pub employee_id: EmployeeId,
    pub evaluator_id: EmployeeId,
    pub period: Period,
    #[serde(default)]
    pub status: AssessmentStatus,
    #[serde(default)]
    pub scores: ScoreSheet,
    #[serde(default)]
    pub comment: Option<String>,
}

pub struct AssessmentService<R> {
    repository: Arc<R>,
}

impl<R> AssessmentService<R>
where
    R: DirectoryStore + IndicatorStore + AssessmentStore + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn submit(
        &self,
        submission: AssessmentSubmission,
        mode: WriteMode,
    ) -> Result<Assessment, ReviewError> {
        let employee = self.employee(submission.employee_id)?;
        self.employee(submission.evaluator_id)?;

        let indicators = self.repository.indicators_for(employee.department_id)?;
        check_ranges(&indicators, &submission.scores)?;
        let outcome = AssessmentScorer::score(&indicators, &submission.scores);
        if !outcome.skipped.is_empty() {
            debug!(
                employee = employee.id.0,
                skipped = ?outcome.skipped,
                "score keys without indicator ignored"
            );
        }

        let mut assessment = match mode {
            WriteMode::CreateOnly => Assessment::new(
                submission.employee_id,
                submission.evaluator_id,
                submission.period.clone(),
            ),
            WriteMode::Upsert => self
                .repository
                .assessment(
                    submission.employee_id,
                    submission.evaluator_id,
                    &submission.period,
                )?
                .unwrap_or_else(|| {
                    Assessment::new(
                        submission.employee_id,
                        submission.evaluator_id,
                        submission.period.clone(),
                    )
                }),
        };
        assessment.status = submission.status;
        assessment.scores = submission.scores;
        assessment.comment = submission.comment;
        assessment.set_total_score(outcome.total);

        let stored = match mode {
            WriteMode::CreateOnly => self.repository.insert_assessment(assessment)?,
            WriteMode::Upsert => single(self.repository.save_assessments(vec![assessment])?)?,
        };
        info!(
            employee = stored.employee_id.0,
            evaluator = stored.evaluator_id.0,
            period = %stored.period,
            total = stored.total_score(),
            "assessment stored"
        );
        Ok(stored)
    }

    /// Recomputes every stored total for employees of `department`. Returns the number of
    /// assessments rewritten.
    pub fn rescore_department(&self, department: DepartmentId) -> Result<usize, ReviewError> {
        let indicators = self.repository.indicators_for(department)?;
        let mut batch = Vec::new();
        for employee in self.repository.employees()? {
            if employee.department_id != department {
                continue;
            }
            for mut assessment in self.repository.assessments_of(employee.id)? {
                let total = AssessmentScorer::score(&indicators, &assessment.scores).total;
                assessment.set_total_score(total);
                batch.push(assessment);
            }
        }

        let rescored = self.repository.save_assessments(batch)?.len();
        if rescored > 0 {
            info!(department = department.0, rescored, "assessments rescored");
        }
        Ok(rescored)
    }

    /// Ordered by evaluator id.
    pub fn assessments_for(
        &self,
        employee: EmployeeId,
        period: &Period,
    ) -> Result<Vec<Assessment>, ReviewError> {
        self.employee(employee)?;
        Ok(self.repository.assessments_for(employee, period)?)
    }

    fn employee(&self, id: EmployeeId) -> Result<Employee, ReviewError> {
        self.repository
            .employee(id)?
            .ok_or_else(|| ReviewError::not_found(id.to_string()))
    }
}

fn check_ranges(indicators: &[Indicator], scores: &ScoreSheet) -> Result<(), ReviewError> {
    for (key, &raw) in scores {
        if !raw.is_finite() {
            return Err(ReviewError::validation(format!(
                "score for '{key}' is not a finite number"
            )));
        }
        if let Some(indicator) = resolve(indicators, key) {
            if !indicator.accepts(raw) {
                return Err(ReviewError::validation(format!(
                    "score {raw} for indicator {} outside [{}, {}]",
                    indicator.sequence, indicator.min_score, indicator.max_score
                )));
            }
        }
    }
    Ok(())
}

fn single(saved: Vec<Assessment>) -> Result<Assessment, ReviewError> {
    saved.into_iter().next().ok_or_else(|| {
        ReviewError::Repository(RepositoryError::Unavailable(
            "assessment batch came back empty".to_string(),
        ))
    })
}
