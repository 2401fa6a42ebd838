use clap::{Parser, Subcommand};
use hl_core::error::NotifyError;
use hl_core::notify::{self, ActorRef, Notifier, NotifyAction};
use hl_core::types::EventBody;
use hl_core::{Helpline, HelplineConfig, RequestContext};
use hl_db::store::DbStore;
use hl_events::bus::EventBus;
use hl_events::types::EventSource;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hl")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic timeout sweeper and notification dispatcher.
    Run,
    /// Run a single sweeper pass and print the report.
    Sweep,
    /// Create or migrate the database and exit.
    Migrate,
}

/// Stand-in transport: logs what each channel would deliver. The real
/// messenger bots implement `Notifier` in their own process.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(
        &self,
        target: &ActorRef,
        text: &str,
        actions: &[NotifyAction],
    ) -> Result<(), NotifyError> {
        tracing::info!(
            role = ?target.role,
            chat_id = target.id,
            actions = actions.len(),
            "outbound: {text}"
        );
        Ok(())
    }
}

fn db_path() -> String {
    std::env::var("HELPLINE_DB_PATH").unwrap_or_else(|_| ".helpline/helpline.db".to_string())
}

fn build_helpline(
    path: &str,
    event_bus: EventBus,
    config: HelplineConfig,
) -> Result<Helpline<DbStore>, String> {
    let conn = hl_db::schema::open_and_migrate(path).map_err(|err| err.to_string())?;
    Ok(Helpline::new(DbStore::new(conn), event_bus, config))
}

async fn run_dispatcher(event_bus: EventBus, notifier: Arc<dyn Notifier>) {
    let mut receiver = event_bus.subscribe();
    loop {
        match receiver.recv().await {
            Ok(record) => {
                let body = match serde_json::from_value::<EventBody>(record.body.clone()) {
                    Ok(body) => body,
                    Err(err) => {
                        tracing::warn!(event = %record.id, error = %err, "undecodable event body");
                        continue;
                    }
                };
                for notification in notify::notifications_for(&body) {
                    notify::dispatch(notifier.as_ref(), &notification);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "dispatcher lagged behind the event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn run_sweeper(path: String, event_bus: EventBus, config: HelplineConfig) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
    loop {
        interval.tick().await;
        let helpline = match build_helpline(&path, event_bus.clone(), config.clone()) {
            Ok(helpline) => helpline,
            Err(err) => {
                tracing::error!(error = %err, "sweeper could not open the store");
                continue;
            }
        };
        let ctx = RequestContext::new(EventSource::Sweeper, None);
        match helpline.sweep().run(&ctx) {
            Ok(report) => {
                if report.resolved() > 0 || report.failed > 0 {
                    tracing::info!(
                        completed = report.completed,
                        reassigned = report.reassigned,
                        offers_expired = report.offers_expired,
                        revisited = report.revisited,
                        failed = report.failed,
                        "sweep finished"
                    );
                }
            }
            Err(err) => tracing::error!(error = %err, "sweep pass failed"),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let path = db_path();
    if let Some(parent) = Path::new(&path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let config = HelplineConfig::from_env();

    match cli.command {
        Command::Run => {
            let event_bus = EventBus::new(1024);
            let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
            let dispatcher_bus = event_bus.clone();
            tokio::spawn(async move { run_dispatcher(dispatcher_bus, notifier).await });
            run_sweeper(path, event_bus, config).await;
        }
        Command::Sweep => {
            let event_bus = EventBus::new(1024);
            match build_helpline(&path, event_bus, config) {
                Ok(helpline) => {
                    let ctx = RequestContext::new(EventSource::Cli, None);
                    match helpline.sweep().run(&ctx) {
                        Ok(report) => println!(
                            "resolved {} conversations ({} completed, {} reassigned), {} offers expired, {} requests revisited, {} sessions expired, {} failed",
                            report.resolved(),
                            report.completed,
                            report.reassigned,
                            report.offers_expired,
                            report.revisited,
                            report.sessions_expired,
                            report.failed
                        ),
                        Err(err) => eprintln!("sweep error: {err}"),
                    }
                }
                Err(err) => eprintln!("store error: {err}"),
            }
        }
        Command::Migrate => match hl_db::schema::open_and_migrate(&path) {
            Ok(_) => println!("database ready at {path}"),
            Err(err) => eprintln!("migrate error: {err}"),
        },
    }
}
