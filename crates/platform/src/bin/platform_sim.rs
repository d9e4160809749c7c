use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use competition::coefficients::SinclairCoefficients;
use competition::models::RankingType;
use competition::ordering::{self, ScoreContext};
use competition::roster::{Roster, RosterValidator};
use platform::{
    ClockListener, ClockReason, DecisionListener, DecisionSet, FieldOfPlay, LoggingSignalSink,
    PlatformConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "platform-sim")]
#[command(about = "Weightlifting competition platform simulator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a session roster in one of the standard orders
    Order {
        #[arg(long)]
        roster: PathBuf,

        #[arg(long, value_enum, default_value = "lifting")]
        mode: OrderMode,

        #[arg(long, default_value = "total")]
        ranking: RankingType,
    },
    /// Check a roster file and report problems
    Validate {
        #[arg(long)]
        roster: PathBuf,
    },
    /// Run a whole session with random referee decisions
    Simulate {
        #[arg(long)]
        roster: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        /// Time each lifter takes before the referees vote
        #[arg(long, default_value_t = 500)]
        lift_ms: u64,

        /// Chance that a referee gives a good lift
        #[arg(long, default_value_t = 0.75)]
        good_rate: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderMode {
    Lifting,
    Display,
    Registration,
    WeighIn,
    Start,
    Results,
}

#[derive(Serialize)]
struct OrderRow<'a> {
    position: usize,
    name: String,
    lot_number: Option<u32>,
    category: Option<&'a str>,
    next_request: Option<i32>,
    best_snatch: i32,
    best_clean_jerk: i32,
    total: i32,
    rank: i32,
}

struct EventLog;

impl ClockListener for EventLog {
    fn start(&self, remaining_ms: u64) -> anyhow::Result<()> {
        tracing::debug!(remaining_ms, "clock start");
        Ok(())
    }

    fn initial_warning(&self, remaining_ms: u64) -> anyhow::Result<()> {
        tracing::info!(remaining_ms, "90 seconds");
        Ok(())
    }

    fn final_warning(&self, remaining_ms: u64) -> anyhow::Result<()> {
        tracing::info!(remaining_ms, "30 seconds");
        Ok(())
    }

    fn no_time_left(&self, _remaining_ms: u64) -> anyhow::Result<()> {
        tracing::warn!("time over");
        Ok(())
    }

    fn stop(&self, remaining_ms: u64, reason: ClockReason) -> anyhow::Result<()> {
        tracing::debug!(remaining_ms, ?reason, "clock stop");
        Ok(())
    }
}

impl DecisionListener for EventLog {
    fn on_down(&self, decisions: &DecisionSet) -> anyhow::Result<()> {
        tracing::debug!(pros = decisions.pros, cons = decisions.cons, "down");
        Ok(())
    }

    fn on_show(&self, decisions: &DecisionSet) -> anyhow::Result<()> {
        tracing::debug!(snapshot = %serde_json::to_string(decisions)?, "decision shown");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "platform={},platform_sim={},competition={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PlatformConfig::from_env()?;

    match cli.command {
        Commands::Order {
            roster,
            mode,
            ranking,
        } => handle_order(&roster, mode, ranking, &config).await,
        Commands::Validate { roster } => handle_validate(&roster).await.map(|_| ()),
        Commands::Simulate {
            roster,
            seed,
            lift_ms,
            good_rate,
        } => handle_simulate(&roster, seed, lift_ms, good_rate, &config).await,
    }
}

async fn load_roster(path: &Path) -> Result<Roster> {
    tracing::info!("Loading roster from: {}", path.display());
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let roster = Roster::from_json(&json).context("Invalid roster file")?;
    tracing::info!(
        "Loaded session {} ({} lifters)",
        roster.session.name,
        roster.lifters.len()
    );
    Ok(roster)
}

async fn handle_validate(path: &Path) -> Result<Roster> {
    let roster = load_roster(path).await?;
    let report = RosterValidator::validate(&roster)?;
    report.log_warnings();
    tracing::info!("✓ Validation successful ({} warning(s))", report.warnings.len());
    Ok(roster)
}

async fn handle_order(
    path: &Path,
    mode: OrderMode,
    ranking: RankingType,
    config: &PlatformConfig,
) -> Result<()> {
    let mut roster = load_roster(path).await?;
    let ranking_config = config.ranking_config(None);
    let table = SinclairCoefficients::cycle_2020();
    let lifters = &mut roster.lifters;

    match mode {
        OrderMode::Lifting => ordering::lifting_order(lifters),
        OrderMode::Display => ordering::display_order(lifters, &ranking_config),
        OrderMode::Registration => ordering::registration_order(lifters, &ranking_config),
        OrderMode::WeighIn => ordering::weigh_in_order(lifters),
        OrderMode::Start => ordering::start_order(lifters),
        OrderMode::Results => {
            let ctx = ScoreContext::new(&ranking_config).with_coefficients(&table);
            ordering::assign_ranks(lifters, ranking, ctx);
        }
    }

    let rows: Vec<OrderRow> = lifters
        .iter()
        .enumerate()
        .map(|(idx, l)| OrderRow {
            position: idx + 1,
            name: l.full_name(),
            lot_number: l.lot_number,
            category: l.category.as_ref().map(|c| c.code.as_str()),
            next_request: l.next_attempt_requested_weight(),
            best_snatch: l.best_snatch(),
            best_clean_jerk: l.best_clean_jerk(),
            total: l.total(),
            rank: l.ranks.get(ranking),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn handle_simulate(
    path: &Path,
    seed: Option<u64>,
    lift_ms: u64,
    good_rate: f64,
    config: &PlatformConfig,
) -> Result<()> {
    let mut roster = handle_validate(path).await?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if roster.lifters.iter().any(|l| l.lot_number.is_none()) {
        ordering::draw_lots(&mut roster.lifters, &mut rng);
    }
    ordering::assign_start_numbers(&mut roster.lifters);

    let mut fop = FieldOfPlay::new(roster, config, Arc::new(LoggingSignalSink));
    let log = Arc::new(EventLog);
    fop.clock().add_listener(log.clone());
    fop.referees().add_listener(log);

    let good_rate = good_rate.clamp(0.0, 1.0);
    let mut attempts = 0;
    loop {
        let votes: [bool; 3] = std::array::from_fn(|_| rng.gen_bool(good_rate));
        match fop
            .run_attempt(votes, Duration::from_millis(lift_ms))
            .await?
        {
            Some(outcome) => {
                attempts += 1;
                println!("{}", serde_json::to_string(&outcome)?);
            }
            None => break,
        }
    }
    fop.end_session();

    tracing::info!("Session {} finished after {} attempts", fop.name(), attempts);
    let table = SinclairCoefficients::cycle_2020();
    for lifter in fop.results(Some(&table)) {
        tracing::info!(
            "{:>3}  {:<28} {:>4} {:>4} {:>5}",
            lifter.ranks.total,
            lifter.full_name(),
            lifter.best_snatch(),
            lifter.best_clean_jerk(),
            lifter.total()
        );
    }
    Ok(())
}
