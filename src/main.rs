use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use std::sync::Arc;
use tabledash::config::{ClientConfig, DEFAULT_REFRESH_SECS, ServerConfig, refresh_interval};
use tabledash::{AirtableClient, AutoRefresh, Dashboard, DatasetProfile, HttpProxyClient, Record, proxy};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CELL_WIDTH: usize = 28;

#[derive(Parser)]
#[command(name = "tabledash")]
#[command(about = "tabledash - Dashboard and CRUD proxy for a remote tabular-data API")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    #[command(flatten)]
    client: ClientConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proxy endpoint and webhook receiver
    Serve(ServerConfig),

    /// Show the table and refresh it periodically until interrupted
    Watch {
        /// Only show records containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Seconds between refreshes
        #[arg(long, default_value_t = DEFAULT_REFRESH_SECS)]
        interval: u64,
    },

    /// Fetch and print the table once
    List {
        /// Only show records containing this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a record from FIELD=VALUE pairs
    Add {
        #[arg(value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Change one field of one record
    Edit { id: String, field: String, value: String },

    /// Delete a record
    Delete { id: String },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(config) => serve(config).await,
        command => run_dashboard(&cli.client, command).await,
    }
}

async fn run_dashboard(config: &ClientConfig, command: Commands) -> Result<()> {
    let profile = DatasetProfile::resolve(&config.profile, config.profile_file.as_deref())?;
    let api = Arc::new(HttpProxyClient::new(config.proxy_url.clone()));
    let mut view = Dashboard::new(profile);

    match command {
        Commands::Serve(_) => {}
        Commands::Watch { search, interval } => {
            if let Some(term) = search {
                view.set_search(&term);
            }
            let view = Arc::new(Mutex::new(view));
            let refresher = AutoRefresh::spawn_with(view, api, refresh_interval(interval), |v| {
                print!("\x1b[2J\x1b[H");
                render(v);
            });
            tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
            refresher.shutdown().await;
        }
        Commands::List { search } => {
            if let Some(term) = search {
                view.set_search(&term);
            }
            let _ = view.refresh(api.as_ref()).await;
            render(&view);
        }
        Commands::Add { fields } => {
            view.open_create_form();
            for (field, value) in fields {
                view.set_draft_input(field, &value);
            }
            view.submit_draft(api.as_ref())
                .await
                .context("Failed to create record")?;
            println!("Record created");
            render(&view);
        }
        Commands::Edit { id, field, value } => {
            view.refresh(api.as_ref()).await.context("Failed to fetch records")?;
            view.begin_edit(&id, &field)?;
            view.set_edit_input(&value);
            view.save_edit(api.as_ref())
                .await
                .with_context(|| format!("Failed to update {} of {}", field, id))?;
            println!("Updated {} of {}", field, id);
            render(&view);
        }
        Commands::Delete { id } => {
            view.delete_record(api.as_ref(), &id)
                .await
                .with_context(|| format!("Failed to delete {}", id))?;
            println!("Deleted {}", id);
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> Result<()> {
    let backend = AirtableClient::new(&config.remote).context("Failed to set up table client")?;
    info!(resource = %backend.resource(), "Proxying remote table");

    let app = proxy::router(Arc::new(backend));
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!("Proxy listening on http://{}{}", config.listen, proxy::PROXY_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

fn render(view: &Dashboard) {
    let profile = view.profile();
    let stats = view.stats();

    let mut summary = format!("Total {}", stats.total.to_string().bold());
    for (key, count) in &stats.buckets {
        summary.push_str(&format!("  {} {}", key, count.to_string().bold()));
    }
    summary.push_str(&format!("  this week {}", stats.this_week.to_string().bold()));
    println!("{}", summary);

    if view.search().is_empty() {
        println!();
    } else {
        println!("Search: {}\n", view.search().cyan());
    }

    let rows = view.filtered();
    if rows.is_empty() {
        println!("{}", view.empty_message().dimmed());
    } else {
        let header: Vec<String> = std::iter::once("ID")
            .chain(profile.columns.iter().map(String::as_str))
            .map(pad)
            .collect();
        println!("{}", header.join(" ").bold());

        for record in rows {
            println!("{}", render_row(view, record));
        }
    }

    if let Some(e) = view.last_error() {
        eprintln!("{} {}", "last request failed:".red(), e);
    }
}

fn render_row(view: &Dashboard, record: &Record) -> String {
    let profile = view.profile();
    let mut cells = vec![pad(&record.id).dimmed().to_string()];
    for column in &profile.columns {
        let text = record.get(column).map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        let cell = pad(&text);
        if *column == profile.status_field {
            cells.push(cell.color(view.status_color(record)).to_string());
        } else {
            cells.push(cell);
        }
    }
    cells.join(" ")
}

fn pad(text: &str) -> String {
    let truncated: String = if text.chars().count() > CELL_WIDTH {
        text.chars().take(CELL_WIDTH - 1).chain(std::iter::once('…')).collect()
    } else {
        text.to_string()
    };
    format!("{:<width$}", truncated, width = CELL_WIDTH)
}
