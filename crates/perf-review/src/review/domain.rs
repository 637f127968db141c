use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::ReviewError;
use super::leaders::LeaderSet;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " #{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a department.
    DepartmentId,
    "department"
);
id_type!(
    /// Identifier of an employee; also the deterministic tie-break key between raters.
    EmployeeId,
    "employee"
);
id_type!(ProjectId, "project");
id_type!(IndicatorId, "indicator");
id_type!(RelationId, "relation");
id_type!(AssessmentId, "assessment");
id_type!(FinalScoreId, "final score");

/// Evaluation cycle in `YYYYMM` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    pub fn parse(raw: &str) -> Result<Self, ReviewError> {
        let trimmed = raw.trim();
        let malformed = || ReviewError::validation(format!("period '{raw}' must be YYYYMM"));

        if trimmed.len() != 6 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(malformed());
        }

        let year = trimmed[..4].parse::<i32>().map_err(|_| malformed())?;
        let month = trimmed[4..].parse::<u32>().map_err(|_| malformed())?;
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(malformed)?;

        Ok(Self(trimmed.to_string()))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}{:02}", date.year(), date.month()))
    }

    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Period {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = ReviewError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.0
    }
}

/// Global, period-independent role of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    DepartmentLeader,
    ProjectLeader,
    ProjectMember,
    FreePerson,
}

impl EmployeeRole {
    pub const fn label(self) -> &'static str {
        match self {
            EmployeeRole::DepartmentLeader => "department_leader",
            EmployeeRole::ProjectLeader => "project_leader",
            EmployeeRole::ProjectMember => "project_member",
            EmployeeRole::FreePerson => "free_person",
        }
    }

    /// Period-scoped counterpart; department leaders never appear in the relation graph.
    pub const fn relation_role(self) -> Option<RelationRole> {
        match self {
            EmployeeRole::DepartmentLeader => None,
            EmployeeRole::ProjectLeader => Some(RelationRole::ProjectLeader),
            EmployeeRole::ProjectMember => Some(RelationRole::ProjectMember),
            EmployeeRole::FreePerson => Some(RelationRole::FreePerson),
        }
    }
}

/// Period-scoped role held in an `EmployeeRelation`.
///
/// Totally ordered by `rank`: project leader (3) > project member (2) > free person (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationRole {
    ProjectLeader,
    ProjectMember,
    FreePerson,
}

impl RelationRole {
    pub const ALL: [RelationRole; 3] = [
        RelationRole::ProjectLeader,
        RelationRole::ProjectMember,
        RelationRole::FreePerson,
    ];

    pub const fn rank(self) -> u8 {
        match self {
            RelationRole::ProjectLeader => 3,
            RelationRole::ProjectMember => 2,
            RelationRole::FreePerson => 1,
        }
    }

    /// Client-driven edits may only keep or lower the rank.
    pub const fn can_transition_to(self, next: RelationRole) -> bool {
        next.rank() <= self.rank()
    }

    pub const fn label(self) -> &'static str {
        match self {
            RelationRole::ProjectLeader => "project_leader",
            RelationRole::ProjectMember => "project_member",
            RelationRole::FreePerson => "free_person",
        }
    }
}

impl fmt::Display for RelationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RelationRole {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "project_leader" => Ok(Self::ProjectLeader),
            "project_member" => Ok(Self::ProjectMember),
            "free_person" => Ok(Self::FreePerson),
            other => Err(ReviewError::validation(format!(
                "unknown relation role '{other}'"
            ))),
        }
    }
}

/// Tag describing what kind of work an employee does in a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    TechDev,
    ProjectManager,
    Test,
    Design,
    Operation,
    Market,
    Other,
}

impl Attribute {
    pub const fn label(self) -> &'static str {
        match self {
            Attribute::TechDev => "tech_dev",
            Attribute::ProjectManager => "project_manager",
            Attribute::Test => "test",
            Attribute::Design => "design",
            Attribute::Operation => "operation",
            Attribute::Market => "market",
            Attribute::Other => "other",
        }
    }
}

impl FromStr for Attribute {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "tech_dev" => Ok(Self::TechDev),
            "project_manager" => Ok(Self::ProjectManager),
            "test" => Ok(Self::Test),
            "design" => Ok(Self::Design),
            "operation" => Ok(Self::Operation),
            "market" => Ok(Self::Market),
            "other" => Ok(Self::Other),
            other => Err(ReviewError::validation(format!("unknown attribute '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub department_id: DepartmentId,
    pub role: EmployeeRole,
    pub job_type: String,
    pub position: String,
    pub ip_address: Option<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub department_id: DepartmentId,
    pub role: EmployeeRole,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub ip_address: Option<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Contribution class of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Base,
    Bonus,
    Penalty,
}

impl IndicatorKind {
    /// Sign applied to the raw input. Penalty inputs are magnitudes, so they subtract.
    pub const fn sign(self) -> f64 {
        match self {
            IndicatorKind::Base | IndicatorKind::Bonus => 1.0,
            IndicatorKind::Penalty => -1.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            IndicatorKind::Base => "base",
            IndicatorKind::Bonus => "bonus",
            IndicatorKind::Penalty => "penalty",
        }
    }
}

/// Catalog entry as supplied by administrators; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDraft {
    pub department_id: DepartmentId,
    pub sequence: u32,
    pub kind: IndicatorKind,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub default_value: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl IndicatorDraft {
    pub fn validate(&self) -> Result<(), ReviewError> {
        let label = format!("indicator {} ({})", self.sequence, self.kind.label());

        if !(self.min_score.is_finite()
            && self.max_score.is_finite()
            && self.default_value.is_finite())
        {
            return Err(ReviewError::validation(format!(
                "{label} has non-finite bounds"
            )));
        }
        if self.min_score > self.max_score {
            return Err(ReviewError::validation(format!(
                "{label} has min_score {} above max_score {}",
                self.min_score, self.max_score
            )));
        }
        if self.default_value < self.min_score || self.default_value > self.max_score {
            return Err(ReviewError::validation(format!(
                "{label} default {} outside [{}, {}]",
                self.default_value, self.min_score, self.max_score
            )));
        }

        match self.kind {
            IndicatorKind::Bonus if self.min_score != 0.0 => Err(ReviewError::validation(
                format!("{label} must start at 0, found {}", self.min_score),
            )),
            IndicatorKind::Penalty if self.min_score < 0.0 => Err(ReviewError::validation(
                format!("{label} takes non-negative magnitudes, found {}", self.min_score),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    pub department_id: DepartmentId,
    pub sequence: u32,
    pub kind: IndicatorKind,
    pub title: String,
    pub content: String,
    pub detail: String,
    pub default_value: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Indicator {
    pub fn from_draft(id: IndicatorId, draft: IndicatorDraft) -> Self {
        Self {
            id,
            department_id: draft.department_id,
            sequence: draft.sequence,
            kind: draft.kind,
            title: draft.title,
            content: draft.content,
            detail: draft.detail,
            default_value: draft.default_value,
            min_score: draft.min_score,
            max_score: draft.max_score,
        }
    }

    pub fn accepts(&self, raw: f64) -> bool {
        raw >= self.min_score && raw <= self.max_score
    }

    pub fn contribution(&self, raw: f64) -> f64 {
        self.kind.sign() * raw
    }
}

/// Raw rater input keyed by indicator sequence, e.g. `{"1": 80, "6": 5}`.
pub type ScoreSheet = BTreeMap<String, f64>;

/// Period-scoped role record for one employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeRelation {
    /// Assigned by the store on first save.
    pub id: Option<RelationId>,
    pub employee_id: EmployeeId,
    pub period: Period,
    pub role: RelationRole,
    pub leaders: LeaderSet,
    pub project_names: Vec<String>,
    pub attributes: BTreeSet<Attribute>,
}

impl EmployeeRelation {
    pub fn new(employee_id: EmployeeId, period: Period, role: RelationRole) -> Self {
        Self {
            id: None,
            employee_id,
            period,
            role,
            leaders: LeaderSet::new(),
            project_names: Vec::new(),
            attributes: BTreeSet::new(),
        }
    }

    pub fn leader_count(&self) -> usize {
        self.leaders.len()
    }

    /// Restores `free_person <=> no leaders`. A project leader with no leaders is self-assigned;
    /// supplied leader sets are kept as they are.
    pub(crate) fn normalize(&mut self, own_name: &str) {
        match self.role {
            RelationRole::FreePerson => self.leaders.clear(),
            RelationRole::ProjectLeader => {
                if self.leaders.is_empty() {
                    self.leaders.insert(own_name);
                }
            }
            RelationRole::ProjectMember => {
                if self.leaders.is_empty() {
                    self.role = RelationRole::FreePerson;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// One rater's scores for one employee and period.
///
/// `total_score` has no public setter; it is recomputed by the scorer whenever the record is
/// written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub id: Option<AssessmentId>,
    pub employee_id: EmployeeId,
    pub evaluator_id: EmployeeId,
    pub period: Period,
    pub status: AssessmentStatus,
    pub scores: ScoreSheet,
    pub comment: Option<String>,
    total_score: f64,
}

impl Assessment {
    pub fn new(employee_id: EmployeeId, evaluator_id: EmployeeId, period: Period) -> Self {
        Self {
            id: None,
            employee_id,
            evaluator_id,
            period,
            status: AssessmentStatus::default(),
            scores: ScoreSheet::new(),
            comment: None,
            total_score: 0.0,
        }
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn is_self_assessment(&self) -> bool {
        self.employee_id == self.evaluator_id
    }

    pub(crate) fn set_total_score(&mut self, total: f64) {
        self.total_score = total;
    }
}

/// Weighted period result for one employee. Produced only by the aggregator and ranker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalScore {
    pub id: Option<FinalScoreId>,
    pub employee_id: EmployeeId,
    pub department_id: DepartmentId,
    pub period: Period,
    pub department_leader_score: f64,
    pub project_leader_score: f64,
    pub self_score: f64,
    final_score: f64,
    rank: u32,
}

impl FinalScore {
    pub(crate) fn new(
        employee_id: EmployeeId,
        department_id: DepartmentId,
        period: Period,
        department_leader_score: f64,
        project_leader_score: f64,
        self_score: f64,
        final_score: f64,
    ) -> Self {
        Self {
            id: None,
            employee_id,
            department_id,
            period,
            department_leader_score,
            project_leader_score,
            self_score,
            final_score,
            rank: 0,
        }
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    /// 1-based position within the department and period; 0 until the first rerank.
    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub(crate) fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}
