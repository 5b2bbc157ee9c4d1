use crate::cli::ReportCommand;
use crate::infra::{seeded_memory_store, Backend};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, ValueEnum};
use realty_analytics::analytics::{
    write_csv, AgentPerformance, AnalyticsService, LeaderboardEntry, LeaderboardMetric, Period,
    PeriodQuery, PeriodRequest, PipelineVelocity, TeamOverview,
};
use realty_analytics::config::{AnalyticsConfig, AppConfig};
use realty_analytics::error::AppError;
use realty_analytics::ledger::CommissionLedger;
use realty_analytics::store::CrmStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Csv,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Reporting period: month, quarter, year, all (anything else means month to date)
    #[arg(long, default_value = "month")]
    pub(crate) period: String,
    /// Custom range start (YYYY-MM-DD); requires --end
    #[arg(long, value_parser = crate::infra::parse_date, requires = "end")]
    pub(crate) start: Option<NaiveDate>,
    /// Custom range end (YYYY-MM-DD); requires --start
    #[arg(long, value_parser = crate::infra::parse_date, requires = "start")]
    pub(crate) end: Option<NaiveDate>,
    /// Leaderboard metric: revenue, deals or conversion
    #[arg(long)]
    pub(crate) metric: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
    /// SQLite database file; a seeded in-memory team is used when absent
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the sample team (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run_report(command: ReportCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let args = match &command {
        ReportCommand::Agents(args)
        | ReportCommand::Leaderboard(args)
        | ReportCommand::Team(args) => args,
    };
    let database = args.database.clone().or(config.store.database_path.clone());
    let now = Local::now().naive_local();

    match Backend::open(database.as_deref(), now)? {
        Backend::Sqlite(store) => report_with(store, config.analytics, &command, now).await,
        Backend::Memory(store) => report_with(store, config.analytics, &command, now).await,
    }
}

async fn report_with<S>(
    store: Arc<S>,
    analytics: AnalyticsConfig,
    command: &ReportCommand,
    now: NaiveDateTime,
) -> Result<(), AppError>
where
    S: CrmStore + 'static,
{
    let service = AnalyticsService::new(store, analytics);
    match command {
        ReportCommand::Agents(args) => {
            let range = service.resolve(&period_request(args)?, now);
            let rows = service.agent_performance(range).await?;
            match args.format {
                OutputFormat::Text => print_agents(&rows),
                OutputFormat::Csv => write_csv(std::io::stdout().lock(), &rows)?,
            }
        }
        ReportCommand::Leaderboard(args) => {
            let range = service.resolve(&period_request(args)?, now);
            let metric = query_of(args).metric()?;
            let entries = service.leaderboard(metric, range).await?;
            match args.format {
                OutputFormat::Text => print_leaderboard(metric, &entries),
                OutputFormat::Csv => write_csv(std::io::stdout().lock(), &entries)?,
            }
        }
        ReportCommand::Team(args) => {
            let range = service.resolve(&period_request(args)?, now);
            let overview = service.team_overview(range).await?;
            match args.format {
                OutputFormat::Text => print_team(&overview),
                OutputFormat::Csv => write_csv(std::io::stdout().lock(), &[overview])?,
            }
        }
    }
    Ok(())
}

fn query_of(args: &ReportArgs) -> PeriodQuery {
    PeriodQuery {
        period: Some(args.period.clone()),
        start: None,
        end: None,
        metric: args.metric.clone(),
    }
}

fn period_request(args: &ReportArgs) -> Result<PeriodRequest, AppError> {
    let mut request = query_of(args).request(Period::Month)?;
    request.start = args.start;
    request.end = args.end;
    request.validate()?;
    Ok(request)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = match args.today {
        Some(day) => day.and_hms_opt(12, 0, 0).unwrap_or(day.and_time(NaiveTime::MIN)),
        None => Local::now().naive_local(),
    };
    let store = seeded_memory_store(now)?;
    let service = AnalyticsService::new(Arc::clone(&store), AnalyticsConfig::default());
    let range = service.resolve(&PeriodRequest::new(Period::Month), now);

    println!("Team analytics demo ({} to {})", range.start.date(), range.end.date());

    print_team(&service.team_overview(range).await?);
    print_agents(&service.agent_performance(range).await?);
    for metric in LeaderboardMetric::ordered() {
        print_leaderboard(metric, &service.leaderboard(metric, range).await?);
    }
    print_velocity(&service.pipeline_velocity(range).await?);

    println!("\nLead sources");
    for row in service.source_performance(range).await? {
        println!(
            "- {}: {} leads | {} closed | {}% conversion | {} commission",
            row.label, row.leads, row.closed, row.conversion_rate, row.revenue
        );
    }

    let ledger = CommissionLedger::new(store);
    let summary = ledger.summary(None).await?;
    println!("\nCommission ledger");
    println!(
        "- pending {} | approved {} | paid {} | total {} | {} earned deals",
        summary.pending, summary.approved, summary.paid, summary.total, summary.closed_deals
    );

    Ok(())
}

fn print_team(overview: &TeamOverview) {
    println!("\nTeam overview");
    println!(
        "- {} leads | {} closed | {:.1}% conversion | {} new this period",
        overview.total_leads,
        overview.total_closed,
        overview.team_conversion_rate,
        overview.new_leads_this_period
    );
    println!(
        "- revenue {} | commission {} | {} active deals | {} days avg to close",
        overview.total_revenue,
        overview.total_commission,
        overview.active_deals,
        overview.avg_days_to_close
    );
}

fn print_agents(rows: &[AgentPerformance]) {
    println!("\nAgent performance");
    for row in rows {
        println!(
            "- {}: {} leads | {} closed | {:.1}% conversion | revenue {} | commission {} | {} activities | {} appointments",
            row.agent_name,
            row.total_leads,
            row.closed_deals,
            row.conversion_rate,
            row.total_revenue,
            row.total_commission,
            row.activities_count,
            row.appointments_count
        );
    }
}

fn print_leaderboard(metric: LeaderboardMetric, entries: &[LeaderboardEntry]) {
    println!("\nLeaderboard by {metric}");
    if entries.is_empty() {
        println!("  (no eligible agents)");
    }
    for entry in entries {
        println!("  {}. {} ({})", entry.rank, entry.agent_name, entry.value);
    }
}

fn print_velocity(rows: &[PipelineVelocity]) {
    println!("\nPipeline velocity (days per stage)");
    for row in rows {
        println!(
            "- {}: new {} | contacted {} | viewing {} | negotiation {} | total {} ({} measured, {} estimated)",
            row.agent_name,
            row.avg_days_in_new,
            row.avg_days_in_contacted,
            row.avg_days_in_viewing,
            row.avg_days_in_negotiation,
            row.total_avg_days,
            row.measured_leads,
            row.estimated_leads
        );
    }
}
