//! Notification Hub CLI
//!
//! Sends, tracks, and reports on notifications stored in a local SQLite file.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};

use notification_hub::config::Settings;
use notification_hub::metrics::{self, encode_metrics};
use notification_hub::notification::{Channel, Notification, NotificationRequest, NotificationStatus};
use notification_hub::telemetry::init_tracing;
use notification_hub::template::Template;
use notification_hub::{HubError, NotificationHub};

#[derive(Parser)]
#[command(name = "notification-hub")]
#[command(about = "Multi-channel notification hub with delivery tracking")]
#[command(version)]
struct Cli {
    /// SQLite database file (overrides NOTIFICATION_HUB_DB and config files)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Hub(HubCommand),
    /// Print process metrics in Prometheus text format
    Metrics,
}

/// Commands that operate on the notification database
#[derive(Subcommand)]
enum HubCommand {
    /// Send a single notification
    Send {
        recipient: String,
        subject: String,
        body: String,
        #[arg(long, default_value = "email")]
        channel: String,
        /// Notification type
        #[arg(long = "type", default_value = "general")]
        kind: String,
        /// JSON object stored with the notification
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Send every notification in a JSON array file
    BatchSend { file: PathBuf },
    /// Mark a notification as read
    Read { id: String },
    /// List unread notifications for a recipient
    Unread { recipient: String },
    /// Show one notification
    Show { id: String },
    /// Show delivery attempts for a notification
    Log { id: String },
    /// Show delivery statistics
    Stats {
        #[arg(long)]
        channel: Option<String>,
    },
    /// Render a stored template against a JSON context
    TemplateRender { name: String, context: String },
    /// Create or replace a template
    TemplateSave {
        name: String,
        #[arg(value_parser = ["email", "slack", "webhook", "push"])]
        channel: String,
        subject: String,
        body: String,
    },
    /// Render a stored template and send it
    TemplateSend {
        name: String,
        recipient: String,
        context: String,
        #[arg(long = "type", default_value = "general")]
        kind: String,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// List stored templates
    ListTemplates,
    /// Re-send every failed notification
    Retry,
}

#[derive(Serialize)]
struct SendSummary<'a> {
    id: &'a str,
    success: bool,
    status: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::new().context("Failed to load configuration")?;
    if let Some(path) = cli.db.clone() {
        settings = settings.with_database_path(path);
    }
    init_tracing(&settings.logging);
    metrics::init();

    if let Err(e) = run(cli.command, &settings).await {
        if let Some(hub_err) = e.downcast_ref::<HubError>() {
            tracing::debug!(code = hub_err.code(), "Command failed");
        }
        eprintln!("Error: {e:#}");
    }
    Ok(())
}

async fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        // Metrics are process-local and need no database
        Commands::Metrics => {
            print!("{}", encode_metrics()?);
            Ok(())
        }
        Commands::Hub(command) => run_hub_command(command, settings).await,
    }
}

async fn run_hub_command(command: HubCommand, settings: &Settings) -> Result<()> {
    let hub = NotificationHub::open(&settings.database).await?;
    tracing::debug!(db = %settings.database.path.display(), "Database opened");

    match command {
        HubCommand::Send {
            recipient,
            subject,
            body,
            channel,
            kind,
            metadata,
        } => {
            let mut notification = Notification::builder(recipient)
                .kind(kind)
                .subject(subject)
                .body(body)
                .raw_channel(channel)
                .metadata(parse_metadata(metadata.as_deref())?)
                .build();
            let success = hub.send(&mut notification).await?;
            print_send_summary(&notification, success)?;
        }
        HubCommand::BatchSend { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let requests: Vec<NotificationRequest> = serde_json::from_str(&raw)
                .context("Batch file must be a JSON array of notifications")?;
            let mut notifications: Vec<Notification> = requests
                .into_iter()
                .map(NotificationRequest::into_notification)
                .collect();
            let results = hub.batch_send(&mut notifications).await?;
            print_json(&results)?;
        }
        HubCommand::Read { id } => {
            if hub.mark_read(&id).await? {
                println!("Marked as read.");
            } else {
                println!("Not found or already read.");
            }
        }
        HubCommand::Unread { recipient } => {
            print_json(&hub.get_unread(&recipient).await?)?;
        }
        HubCommand::Show { id } => match hub.get_notification(&id).await? {
            Some(notification) => print_json(&notification)?,
            None => println!("Notification not found: {id}"),
        },
        HubCommand::Log { id } => {
            print_json(&hub.delivery_log(&id).await?)?;
        }
        HubCommand::Stats { channel } => {
            print_json(&hub.stats(channel.as_deref()).await?)?;
        }
        HubCommand::TemplateRender { name, context } => {
            let context = parse_context(&context)?;
            print_json(&hub.render_template(&name, &context).await?)?;
        }
        HubCommand::TemplateSave {
            name,
            channel,
            subject,
            body,
        } => {
            let channel: Channel = channel.parse()?;
            hub.save_template(&Template::new(name.clone(), channel, subject, body))
                .await?;
            println!("Template '{name}' saved.");
        }
        HubCommand::TemplateSend {
            name,
            recipient,
            context,
            kind,
            metadata,
        } => {
            let context = parse_context(&context)?;
            let metadata = parse_metadata(metadata.as_deref())?;
            let notification = hub
                .send_templated(&name, &context, &recipient, &kind, metadata)
                .await?;
            let success = notification.status == NotificationStatus::Sent;
            print_send_summary(&notification, success)?;
        }
        HubCommand::ListTemplates => {
            print_json(&hub.list_templates().await?)?;
        }
        HubCommand::Retry => {
            let recovered = hub.retry_failed().await?;
            println!("Retried {recovered} failed notification(s).");
        }
    }

    Ok(())
}

fn parse_context(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("Context must be valid JSON")
}

fn parse_metadata(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str(raw).context("Metadata must be valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("Metadata must be a JSON object, got {other}"),
    }
}

fn print_send_summary(notification: &Notification, success: bool) -> Result<()> {
    print_json(&SendSummary {
        id: &notification.id,
        success,
        status: notification.status.as_str(),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
