use super::common::*;
use crate::review::domain::{Employee, EmployeeRole};
use crate::review::repository::RelationStore;
use crate::review::statistics::ScoreBand;
use crate::review::{FinalScore, ReviewError};

fn ranks(rows: &[FinalScore]) -> Vec<(u64, u32)> {
    rows.iter()
        .map(|row| (row.employee_id.0, row.rank()))
        .collect()
}

/// Department leader, project leader and self ratings for one employee.
fn rate_three_ways(
    service: &MemoryService,
    employee: &Employee,
    boss: &Employee,
    lead: &Employee,
    scores: (f64, f64, f64),
) {
    rate(service, employee, boss, scores.0);
    rate(service, employee, lead, scores.1);
    rate(service, employee, employee, scores.2);
}

#[test]
fn weighted_final_combines_three_categories() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let lead = hire(&service, &dept, "Lead", EmployeeRole::ProjectLeader);
    let dev = hire(&service, &dept, "Dev", EmployeeRole::ProjectMember);
    rate_three_ways(&service, &dev, &boss, &lead, (80.0, 70.0, 90.0));

    let score = service
        .ranking()
        .aggregate(dev.id, &period())
        .expect("aggregated");

    assert_eq!(score.department_leader_score, 80.0);
    assert_eq!(score.project_leader_score, 70.0);
    assert_eq!(score.self_score, 90.0);
    assert!((score.final_score() - 79.0).abs() < 1e-9);
    assert_eq!(score.rank(), 0);
}

#[test]
fn missing_categories_count_as_zero() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let dev = hire(&service, &dept, "Dev", EmployeeRole::ProjectMember);
    rate(&service, &dev, &boss, 80.0);

    let score = service
        .ranking()
        .aggregate(dev.id, &period())
        .expect("aggregated");
    assert!((score.final_score() - 40.0).abs() < 1e-9);
}

#[test]
fn department_leaders_are_not_aggregated() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);

    let result = service.ranking().aggregate(boss.id, &period());
    assert!(matches!(result, Err(ReviewError::Validation(_))));
}

#[test]
fn ranks_are_scoped_to_department() {
    let (service, _) = build_service();
    let mut expected = Vec::new();
    for (name, scores) in [("North", [90.0, 80.0]), ("South", [95.0, 85.0])] {
        let dept = department(&service, name);
        install_catalog(&service, &dept);
        let boss = hire(
            &service,
            &dept,
            &format!("{name} Boss"),
            EmployeeRole::DepartmentLeader,
        );
        for (index, score) in scores.iter().enumerate() {
            let dev = hire(
                &service,
                &dept,
                &format!("{name} Dev {index}"),
                EmployeeRole::ProjectMember,
            );
            rate(&service, &dev, &boss, *score);
            service
                .ranking()
                .aggregate(dev.id, &period())
                .expect("aggregated");
        }
        expected.push(dept);
    }

    for dept in &expected {
        let ranked = service.ranking().rerank(dept.id, &period()).expect("reranked");
        let positions: Vec<u32> = ranked.iter().map(FinalScore::rank).collect();
        assert_eq!(positions, vec![1, 2]);
        assert!(ranked[0].final_score() > ranked[1].final_score());
    }
}

#[test]
fn rerank_is_idempotent_and_ties_follow_employee_id() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let first = hire(&service, &dept, "First", EmployeeRole::ProjectMember);
    let second = hire(&service, &dept, "Second", EmployeeRole::ProjectMember);
    let third = hire(&service, &dept, "Third", EmployeeRole::ProjectMember);
    for (employee, score) in [(&third, 90.0), (&second, 70.0), (&first, 70.0)] {
        rate(&service, employee, &boss, score);
        service
            .ranking()
            .aggregate(employee.id, &period())
            .expect("aggregated");
    }

    let once = ranks(&service.ranking().rerank(dept.id, &period()).expect("rerank"));
    let twice = ranks(&service.ranking().rerank(dept.id, &period()).expect("rerank"));

    assert_eq!(once, vec![(third.id.0, 1), (first.id.0, 2), (second.id.0, 3)]);
    assert_eq!(once, twice);
}

#[test]
fn aggregate_keeps_rank_until_next_rerank() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let top = hire(&service, &dept, "Top", EmployeeRole::ProjectMember);
    let low = hire(&service, &dept, "Low", EmployeeRole::ProjectMember);
    rate(&service, &top, &boss, 90.0);
    rate(&service, &low, &boss, 60.0);
    service.ranking().aggregate_period(&period()).expect("period");

    rate(&service, &low, &boss, 100.0);
    let refreshed = service
        .ranking()
        .aggregate(low.id, &period())
        .expect("aggregated");
    assert_eq!(refreshed.rank(), 2);

    let ranked = service.ranking().rerank(dept.id, &period()).expect("rerank");
    assert_eq!(ranks(&ranked), vec![(low.id.0, 1), (top.id.0, 2)]);
}

#[test]
fn aggregate_ranked_leaves_the_department_densely_ranked() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let top = hire(&service, &dept, "Top", EmployeeRole::ProjectMember);
    let low = hire(&service, &dept, "Low", EmployeeRole::ProjectMember);
    rate(&service, &top, &boss, 90.0);
    rate(&service, &low, &boss, 60.0);

    let first = service
        .ranking()
        .aggregate_ranked(low.id, &period())
        .expect("aggregated");
    assert_eq!(first.rank(), 1);

    let second = service
        .ranking()
        .aggregate_ranked(top.id, &period())
        .expect("aggregated");
    assert_eq!(second.rank(), 1);

    let listed = service
        .ranking()
        .final_scores(dept.id, &period())
        .expect("listed");
    assert_eq!(ranks(&listed), vec![(top.id.0, 1), (low.id.0, 2)]);
}

#[test]
fn aggregate_period_skips_department_leaders() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let dev = hire(&service, &dept, "Dev", EmployeeRole::ProjectMember);
    rate(&service, &dev, &boss, 75.0);
    rate(&service, &boss, &boss, 99.0);

    let rows = service.ranking().aggregate_period(&period()).expect("period");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].employee_id, dev.id);
    assert_eq!(rows[0].rank(), 1);
}

#[test]
fn distribution_buckets_final_scores() {
    let (service, _) = build_service();
    let dept = department(&service, "Platform");
    install_catalog(&service, &dept);
    let boss = hire(&service, &dept, "Boss", EmployeeRole::DepartmentLeader);
    let lead = hire(&service, &dept, "Lead", EmployeeRole::ProjectLeader);
    let strong = hire(&service, &dept, "Strong", EmployeeRole::ProjectMember);
    let weak = hire(&service, &dept, "Weak", EmployeeRole::ProjectMember);
    rate_three_ways(&service, &strong, &boss, &lead, (95.0, 92.0, 90.0));
    rate(&service, &weak, &boss, 50.0);
    service.ranking().aggregate_period(&period()).expect("period");

    let distribution = service.score_distribution(&period()).expect("distribution");
    assert_eq!(distribution.total, 2);
    assert_eq!(distribution.count(ScoreBand::Above90), 1);
    assert_eq!(distribution.count(ScoreBand::Below40), 1);
}

#[test]
fn synthetic_dataset_is_consistent() {
    let (service, store) = build_service();
    let dataset = service.seed_synthetic(&period()).expect("seeded");

    assert_eq!(dataset.departments.len(), 3);
    assert_eq!(dataset.employees.len(), 18);
    assert!(dataset.assessment_count > 0);
    assert!(dataset
        .final_scores
        .iter()
        .all(|score| score.rank() > 0 && score.final_score() > 0.0));

    assert_relation_invariant(&store.relations_in(&period()).expect("relations"));

    for dept in &dataset.departments {
        let ranked = service.ranking().final_scores(dept.id, &period()).expect("scores");
        let positions: Vec<u32> = ranked.iter().map(FinalScore::rank).collect();
        assert_eq!(positions, (1..=ranked.len() as u32).collect::<Vec<_>>());
    }
}
