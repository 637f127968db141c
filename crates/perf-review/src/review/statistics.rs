use serde::Serialize;

use super::domain::{EmployeeId, FinalScore, Period};

/// Ten-point bands over final scores. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ScoreBand {
    #[serde(rename = "below_40")]
    Below40,
    #[serde(rename = "40_to_50")]
    From40To50,
    #[serde(rename = "50_to_60")]
    From50To60,
    #[serde(rename = "60_to_70")]
    From60To70,
    #[serde(rename = "70_to_80")]
    From70To80,
    #[serde(rename = "80_to_90")]
    From80To90,
    #[serde(rename = "above_90")]
    Above90,
}

impl ScoreBand {
    pub const ALL: [ScoreBand; 7] = [
        ScoreBand::Below40,
        ScoreBand::From40To50,
        ScoreBand::From50To60,
        ScoreBand::From60To70,
        ScoreBand::From70To80,
        ScoreBand::From80To90,
        ScoreBand::Above90,
    ];

    pub fn of(score: f64) -> Self {
        match score {
            s if s < 40.0 => ScoreBand::Below40,
            s if s < 50.0 => ScoreBand::From40To50,
            s if s < 60.0 => ScoreBand::From50To60,
            s if s < 70.0 => ScoreBand::From60To70,
            s if s < 80.0 => ScoreBand::From70To80,
            s if s < 90.0 => ScoreBand::From80To90,
            _ => ScoreBand::Above90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBucket {
    pub band: ScoreBand,
    pub employee_ids: Vec<EmployeeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    pub period: Period,
    pub total: usize,
    pub buckets: Vec<ScoreBucket>,
}

impl ScoreDistribution {
    /// Every band is present, empty ones included.
    pub fn from_scores(period: Period, scores: &[FinalScore]) -> Self {
        let mut buckets: Vec<ScoreBucket> = ScoreBand::ALL
            .iter()
            .map(|band| ScoreBucket {
                band: *band,
                employee_ids: Vec::new(),
            })
            .collect();

        for score in scores {
            let band = ScoreBand::of(score.final_score());
            if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.band == band) {
                bucket.employee_ids.push(score.employee_id);
            }
        }

        Self {
            period,
            total: scores.len(),
            buckets,
        }
    }

    pub fn count(&self, band: ScoreBand) -> usize {
        self.buckets
            .iter()
            .find(|bucket| bucket.band == band)
            .map_or(0, |bucket| bucket.employee_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::domain::DepartmentId;

    #[test]
    fn band_edges_are_lower_inclusive() {
        assert_eq!(ScoreBand::of(39.99), ScoreBand::Below40);
        assert_eq!(ScoreBand::of(40.0), ScoreBand::From40To50);
        assert_eq!(ScoreBand::of(89.9), ScoreBand::From80To90);
        assert_eq!(ScoreBand::of(90.0), ScoreBand::Above90);
    }

    #[test]
    fn distribution_lists_employees_per_band() {
        let period = Period::parse("202403").expect("period");
        let scores: Vec<FinalScore> = [(1, 79.0), (2, 92.5), (3, 71.0)]
            .into_iter()
            .map(|(id, value)| {
                FinalScore::new(
                    EmployeeId(id),
                    DepartmentId(1),
                    period.clone(),
                    0.0,
                    0.0,
                    0.0,
                    value,
                )
            })
            .collect();

        let distribution = ScoreDistribution::from_scores(period, &scores);
        assert_eq!(distribution.total, 3);
        assert_eq!(distribution.buckets.len(), 7);
        assert_eq!(distribution.count(ScoreBand::From70To80), 2);
        assert_eq!(distribution.count(ScoreBand::Above90), 1);
        assert_eq!(distribution.count(ScoreBand::Below40), 0);

        let json = serde_json::to_value(&distribution).expect("serializes");
        assert_eq!(json["buckets"][4]["band"], "70_to_80");
    }
}
