use anyhow::Context;
use clap::{Parser, Subcommand};
use ratiorisk_core::config::Settings;
use ratiorisk_core::domain::assessment::RiskLevel;
use ratiorisk_core::domain::benchmark::DEFAULT_COMPARISON_INDUSTRY;
use ratiorisk_core::domain::ratios::INDUSTRY_PRESETS;
use ratiorisk_core::llm::gateway::GatewayClient;
use ratiorisk_core::session::FileSessionStore;
use ratiorisk_core::storage::history::{HistoryStore, PgHistoryStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod assess;
mod ratio_input;

#[derive(Debug, Parser)]
#[command(name = "ratiorisk")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a ratio set and save the result under the local session.
    Assess {
        /// Industry benchmark to start from (see `presets`). Defaults to the form defaults.
        #[arg(long)]
        preset: Option<String>,

        /// Start from a sample company instead: low, medium or high.
        #[arg(long, value_parser = ratio_input::parse_sample, conflicts_with = "preset")]
        sample: Option<RiskLevel>,

        /// Industry to compare category scores against. Defaults to `--preset`,
        /// then technology.
        #[arg(long)]
        compare: Option<String>,

        /// Override one ratio, e.g. `--set debtToEquity=4.5`. Repeatable.
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = ratio_input::parse_override)]
        overrides: Vec<(String, String)>,

        #[arg(long)]
        company_name: Option<String>,

        /// Do everything except writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Saved assessments of the local session.
    #[command(subcommand)]
    History(HistoryCommand),

    /// Print the local session id, creating it on first use.
    Session,

    /// List industry presets.
    Presets,
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    /// The 10 most recent assessments, newest first.
    List,
    /// Delete one assessment owned by the local session.
    Delete { id: uuid::Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let sessions = FileSessionStore::new(settings.session_file());

    match args.command {
        Command::Assess {
            preset,
            sample,
            compare,
            overrides,
            company_name,
            dry_run,
        } => {
            let ratios = ratio_input::build_ratios(preset.as_deref(), sample, &overrides)?;
            let compare_key = compare
                .or(preset)
                .unwrap_or_else(|| DEFAULT_COMPARISON_INDUSTRY.to_string());
            let compare_with = ratio_input::require_preset(&compare_key)?;
            let session_id = sessions.get_or_create_session_id()?;

            let llm = GatewayClient::from_settings(&settings)?;

            let store = if dry_run {
                tracing::info!(dry_run = true, "skipping history save");
                None
            } else {
                match connect_history(&settings).await {
                    Ok(store) => Some(store),
                    Err(e) => {
                        sentry_anyhow::capture_anyhow(&e);
                        tracing::warn!(error = %e, "history unavailable, assessment will not be saved");
                        None
                    }
                }
            };

            let input = assess::AssessInput {
                session_id,
                company_name,
                ratios,
                compare_with: Some(compare_with),
            };
            let mut stdout = std::io::stdout();
            assess::run_assessment(
                &llm,
                store.as_ref().map(|s| s as &dyn HistoryStore),
                input,
                &mut stdout,
            )
            .await?;
        }
        Command::History(HistoryCommand::List) => {
            let session_id = sessions.get_or_create_session_id()?;
            let store = connect_history(&settings).await?;
            let records = store
                .list(&session_id)
                .await
                .context("failed to load history")?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::History(HistoryCommand::Delete { id }) => {
            let session_id = sessions.get_or_create_session_id()?;
            let store = connect_history(&settings).await?;
            let deleted = store.delete(id, &session_id).await?;
            tracing::info!(%id, deleted, "history delete");
        }
        Command::Session => {
            println!("{}", sessions.get_or_create_session_id()?);
        }
        Command::Presets => {
            for preset in INDUSTRY_PRESETS.iter() {
                println!("{:<14} {:<14} {}", preset.key, preset.name, preset.description);
            }
        }
    }

    Ok(())
}

async fn connect_history(settings: &Settings) -> anyhow::Result<PgHistoryStore> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    ratiorisk_core::storage::migrate(&pool).await?;
    Ok(PgHistoryStore::new(pool))
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
