//! Performance reviews: the period-scoped relation graph, multi-rater scoring against a
//! department catalog, and the weighted final score with per-department ranking.

pub mod catalog;
pub mod directory;
pub mod domain;
pub mod error;
pub mod leaders;
pub mod memory;
pub mod ranking;
pub mod relations;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod seed;
pub mod service;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use catalog::IndicatorCatalog;
pub use directory::Directory;
pub use domain::{
    Assessment, AssessmentId, AssessmentStatus, Attribute, Department, DepartmentId, Employee,
    EmployeeId, EmployeeRelation, EmployeeRole, FinalScore, FinalScoreId, Indicator,
    IndicatorDraft, IndicatorId, IndicatorKind, NewDepartment, NewEmployee, NewProject, Period,
    Project, ProjectId, RelationId, RelationRole, ScoreSheet,
};
pub use error::ReviewError;
pub use leaders::LeaderSet;
pub use memory::InMemoryReviewStore;
pub use ranking::{
    weighted_final, FinalScoreAggregator, DEPARTMENT_LEADER_WEIGHT, PROJECT_LEADER_WEIGHT,
    SELF_WEIGHT,
};
pub use relations::{
    parse_relation_records, read_relation_csv, ImportRecord, ImportReport, ImportRequest,
    RelationCsvError, RelationGraph, RelationInput, RelationPatch, RelationStatistics,
    RelationView, RoleChange, TransitionMode,
};
pub use repository::{
    AssessmentStore, DirectoryStore, FinalScoreStore, IndicatorStore, RelationStore,
    RepositoryError, ReviewRepository,
};
pub use router::review_router;
pub use scoring::{
    AssessmentScorer, AssessmentService, AssessmentSubmission, ScoreComponent, ScoreOutcome,
    WriteMode,
};
pub use seed::{standard_indicators, SyntheticDataset};
pub use service::PerformanceReviewService;
pub use statistics::{ScoreBand, ScoreBucket, ScoreDistribution};
