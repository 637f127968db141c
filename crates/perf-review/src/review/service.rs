use std::sync::Arc;

use super::catalog::IndicatorCatalog;
use super::directory::Directory;
use super::domain::{Indicator, IndicatorDraft, Period};
use super::error::ReviewError;
use super::ranking::FinalScoreAggregator;
use super::relations::RelationGraph;
use super::repository::ReviewRepository;
use super::scoring::AssessmentService;
use super::seed::{self, SyntheticDataset};
use super::statistics::ScoreDistribution;

/// Entry point composing the directory, catalog, relation graph, scorer and ranker over one
/// shared repository.
pub struct PerformanceReviewService<R> {
    directory: Directory<R>,
    catalog: IndicatorCatalog<R>,
    relations: RelationGraph<R>,
    assessments: AssessmentService<R>,
    ranking: FinalScoreAggregator<R>,
}

impl<R> PerformanceReviewService<R>
where
    R: ReviewRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            directory: Directory::new(Arc::clone(&repository)),
            catalog: IndicatorCatalog::new(Arc::clone(&repository)),
            relations: RelationGraph::new(Arc::clone(&repository)),
            assessments: AssessmentService::new(Arc::clone(&repository)),
            ranking: FinalScoreAggregator::new(repository),
        }
    }

    pub fn directory(&self) -> &Directory<R> {
        &self.directory
    }

    pub fn catalog(&self) -> &IndicatorCatalog<R> {
        &self.catalog
    }

    pub fn relations(&self) -> &RelationGraph<R> {
        &self.relations
    }

    pub fn assessments(&self) -> &AssessmentService<R> {
        &self.assessments
    }

    pub fn ranking(&self) -> &FinalScoreAggregator<R> {
        &self.ranking
    }

    /// Stores the indicator and re-derives every assessment total of its department.
    pub fn upsert_indicator(&self, draft: IndicatorDraft) -> Result<Indicator, ReviewError> {
        let indicator = self.catalog.upsert(draft)?;
        self.assessments.rescore_department(indicator.department_id)?;
        Ok(indicator)
    }

    pub fn score_distribution(&self, period: &Period) -> Result<ScoreDistribution, ReviewError> {
        let scores = self.ranking.final_scores_for_period(period)?;
        Ok(ScoreDistribution::from_scores(period.clone(), &scores))
    }

    pub fn seed_synthetic(&self, period: &Period) -> Result<SyntheticDataset, ReviewError> {
        seed::seed(self, period)
    }
}
