use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use time::{OffsetDateTime, format_description};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mazebot::game::{ControlMode, Game, GameSettings};
use mazebot::infra::DefaultObserver;
use mazebot::planners::{EngineConfig, EvaluationStrategy, EvaluationWeights, Evaluator};
use mazebot::state::GridWorld;

const DEFAULT_LAYOUT: &str = "
%%%%%%%%%%%%%%%%%%%%
%o...%........%...G%
%.%%.%.%%%%%%.%.%%.%
%.%........P.....%.%
%.%%.%%%% %%%%.%%%.%
%......%G   %......%
%%%%.%.%%%%%%.%.%%%%
%o...............o.%
%%%%%%%%%%%%%%%%%%%%
";

fn get_env_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mazebot=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn run_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_else(|| now.unix_timestamp().to_string())
}

fn load_layout() -> Result<GridWorld, Box<dyn std::error::Error>> {
    let text = match env::var("MAZEBOT_LAYOUT") {
        Ok(path) => {
            tracing::info!("Loading layout from {}", path);
            fs::read_to_string(&path)?
        }
        Err(_) => DEFAULT_LAYOUT.to_string(),
    };
    Ok(GridWorld::parse(&text)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let mode = match env::var("MAZEBOT_MODE") {
        Ok(value) => value.parse::<ControlMode>()?,
        Err(_) => ControlMode::default(),
    };
    let strategy = match env::var("MAZEBOT_EVALUATION") {
        Ok(value) => value.parse::<EvaluationStrategy>()?,
        Err(_) => EvaluationStrategy::default(),
    };

    let mut settings = GameSettings {
        mode,
        evaluator: Evaluator::new(strategy, EvaluationWeights::default()),
        ..GameSettings::default()
    };
    if let Some(seed) = get_env_var::<u64>("MAZEBOT_SEED") {
        settings.seed = seed;
    }
    if let Some(max_ticks) = get_env_var::<u32>("MAZEBOT_MAX_TICKS") {
        settings.max_ticks = max_ticks;
    }
    if let Some(limit) = get_env_var::<u64>("MAZEBOT_TIME_LIMIT_MS") {
        settings.engine = EngineConfig {
            time_limit: Duration::from_millis(limit),
            ..settings.engine
        };
    }

    tracing::info!("Run started at {}", run_timestamp());
    tracing::info!("Mode: {}, evaluation: {:?}, seed: {}", mode, strategy, settings.seed);

    let world = load_layout()?;
    let mut game = Game::new(settings, DefaultObserver);
    let summary = game.run(world);

    tracing::info!(
        "Run finished at {}: {:?} after {} ticks with score {}",
        run_timestamp(),
        summary.status,
        summary.ticks,
        summary.score
    );

    Ok(())
}
