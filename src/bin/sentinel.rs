use std::time::Duration;

use clap::Parser;
use container_monitoring::{
    checker::HealthChecker, config::Config, mailer::SmtpMailer, runner,
};
use tracing::{level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Env file with the credentials and mail settings
    #[arg(short, long, default_value = ".env")]
    env_file: String,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("container_monitoring", LevelFilter::TRACE),
        ("sentinel", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = Config::load(&args.env_file)?;
    let checker = HealthChecker::new(Duration::from_secs(args.timeout));

    runner::run(&config, &checker, &SmtpMailer).await?;

    Ok(())
}
