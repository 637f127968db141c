use crate::infra::{in_memory_service, parse_period, MemoryReviewService};
use clap::Args;
use perf_review::error::AppError;
use perf_review::review::{
    read_relation_csv, Employee, EmployeeId, ImportReport, ImportRequest, Period,
    RelationStatistics, ScoreBand, SyntheticDataset,
};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Review period (YYYYMM). Defaults to the current month.
    #[arg(long, value_parser = parse_period)]
    pub(crate) period: Option<Period>,
    /// Optional relation sheet applied after seeding, then re-aggregated.
    #[arg(long)]
    pub(crate) relations_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct RelationImportArgs {
    /// Relation sheet with employee_name, role, leader_names, project_names and attributes columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Review period (YYYYMM) whose relations are replaced
    #[arg(long, value_parser = parse_period)]
    pub(crate) period: Period,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        period,
        relations_csv,
    } = args;
    let period = period.unwrap_or_else(Period::current);

    println!("Performance review demo for {period}");
    let service = in_memory_service();
    let dataset = service.seed_synthetic(&period)?;
    render_dataset(&service, &dataset)?;

    if let Some(path) = relations_csv {
        let report = import_sheet(&service, &period, path)?;
        render_import_report(&report);
        render_statistics(&service.relations().statistics(&period)?);

        service.ranking().aggregate_period(&period)?;
        println!("\nRankings after the relation import");
        render_rankings(&service, &dataset)?;
    }

    render_distribution(&service, &period)?;
    Ok(())
}

pub(crate) fn run_relation_import(args: RelationImportArgs) -> Result<(), AppError> {
    let RelationImportArgs { csv, period } = args;

    // Names resolve against the synthetic directory; the store does not outlive the command.
    let service = in_memory_service();
    service.seed_synthetic(&period)?;

    let report = import_sheet(&service, &period, csv)?;
    render_import_report(&report);
    render_statistics(&service.relations().statistics(&period)?);
    Ok(())
}

fn import_sheet(
    service: &MemoryReviewService,
    period: &Period,
    path: PathBuf,
) -> Result<ImportReport, AppError> {
    let records = read_relation_csv(&path)?;
    println!(
        "\nImporting {} relation rows from {}",
        records.len(),
        path.display()
    );
    let report = service.relations().bulk_replace(ImportRequest {
        period: period.to_string(),
        relations: records,
    })?;
    Ok(report)
}

fn render_dataset(
    service: &MemoryReviewService,
    dataset: &SyntheticDataset,
) -> Result<(), AppError> {
    println!(
        "Seeded {} departments, {} employees, {} projects and {} assessments",
        dataset.departments.len(),
        dataset.employees.len(),
        dataset.projects.len(),
        dataset.assessment_count
    );
    render_statistics(&service.relations().statistics(&dataset.period)?);
    println!("\nRankings");
    render_rankings(service, dataset)
}

fn render_rankings(
    service: &MemoryReviewService,
    dataset: &SyntheticDataset,
) -> Result<(), AppError> {
    let names: HashMap<EmployeeId, &Employee> = dataset
        .employees
        .iter()
        .map(|employee| (employee.id, employee))
        .collect();

    for department in &dataset.departments {
        println!("  {}", department.name);
        let rows = service
            .ranking()
            .final_scores(department.id, &dataset.period)?;
        if rows.is_empty() {
            println!("    (no final scores)");
            continue;
        }
        for row in rows {
            let name = names
                .get(&row.employee_id)
                .map_or("unknown", |employee| employee.name.as_str());
            println!(
                "    #{:<2} {:<18} final {:>6.2} (dept {:>6.2}, project {:>6.2}, self {:>6.2})",
                row.rank(),
                name,
                row.final_score(),
                row.department_leader_score,
                row.project_leader_score,
                row.self_score
            );
        }
    }
    Ok(())
}

fn render_statistics(stats: &RelationStatistics) {
    println!(
        "Relations for {}: {} total ({} project leaders, {} project members, {} free)",
        stats.period,
        stats.total_count,
        stats.project_leader_count,
        stats.project_member_count,
        stats.free_person_count
    );
}

fn render_import_report(report: &ImportReport) {
    println!(
        "Import finished: {} relations created, {} rows rejected",
        report.created_count,
        report.errors.len()
    );
    for error in &report.errors {
        println!("  - {error}");
    }
}

fn render_distribution(service: &MemoryReviewService, period: &Period) -> Result<(), AppError> {
    let distribution = service.score_distribution(period)?;
    println!("\nScore distribution ({} employees)", distribution.total);
    for band in ScoreBand::ALL {
        println!("  {:<10} {}", band_label(band), distribution.count(band));
    }
    Ok(())
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Below40 => "below 40",
        ScoreBand::From40To50 => "40-50",
        ScoreBand::From50To60 => "50-60",
        ScoreBand::From60To70 => "60-70",
        ScoreBand::From70To80 => "70-80",
        ScoreBand::From80To90 => "80-90",
        ScoreBand::Above90 => "90+",
    }
}
