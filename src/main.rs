// ABOUTME: CLI entrypoint for maktab command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use maktab::{
    auth::Credentials,
    cli::{Cli, Commands},
    config::{Config, Overrides},
    logging::init_logging,
    onboarding::discover_students,
    registry::{ClientSettings, Registry},
    sensor::render_all,
    Error, Result,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("maktab: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = cli.overrides();

    match cli.command() {
        Commands::Diary { date } => {
            let registry = build_registry(&cli, &overrides)?;

            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message(format!(
                "Fetching diaries for {} student(s)...",
                registry.students().len()
            ));
            spinner.enable_steady_tick(Duration::from_millis(100));

            let report = registry.update_all(date).await;
            spinner.finish_and_clear();

            let summaries: Vec<_> = registry
                .students()
                .iter()
                .filter_map(|s| s.latest())
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);

            if report.updated == 0 {
                if let Some(failure) = report.failures.into_iter().next() {
                    return Err(failure.error);
                }
            }
        }
        Commands::Students => {
            let client = account_client(&cli, &overrides)?;
            let students = discover_students(&client).await?;
            println!("{}", serde_json::to_string_pretty(&students)?);
        }
        Commands::Student { id } => {
            let client = account_client(&cli, &overrides)?;
            let student = client.get_student(id).await?;
            println!("{}", serde_json::to_string_pretty(&student)?);
        }
        Commands::Watch { interval_secs } => {
            let registry = build_registry(&cli, &overrides)?;
            watch(registry, Duration::from_secs(interval_secs.max(1))).await?;
        }
    }

    Ok(())
}

fn settings_for(cli: &Cli, config: &Config) -> ClientSettings {
    let mut settings = ClientSettings::from_config(config);
    settings.throttle_ms = cli.throttle();
    settings
}

fn build_registry(cli: &Cli, overrides: &Overrides) -> Result<Registry> {
    let config = Config::resolve(overrides)?;
    let mut registry = Registry::new(settings_for(cli, &config));
    for entry in config.students {
        registry.register(entry)?;
    }
    Ok(registry)
}

fn account_client(cli: &Cli, overrides: &Overrides) -> Result<maktab::api::ApiClient> {
    let config = Config::resolve_connection(overrides)?;
    let (username, password) = config.login(overrides)?;
    settings_for(cli, &config).build(Credentials::new(username, password))
}

async fn watch(registry: Registry, interval: Duration) -> Result<()> {
    let trigger = registry
        .update_trigger()
        .ok_or_else(|| Error::Config("no students registered".into()))?;

    // Each line on stdin acts as the "update all" button
    let stdin_trigger = trigger.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            stdin_trigger.press();
        }
    });

    for student in registry.students() {
        let student_id = student.entry.student_id;
        let Some(mut rx) = registry.subscribe(student_id) else {
            continue;
        };
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let summary = rx.borrow_and_update().clone();
                let states = render_all(student_id, summary.as_ref());
                match serde_json::to_string(&states) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!(error = %e, "failed to render sensors"),
                }
            }
        });
    }

    registry
        .run_until(interval, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    Ok(())
}
