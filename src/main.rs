use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use runmatch::config::ConfigManager;
use runmatch::models::{format_distance, format_pace};
use runmatch::{generate_embedding, MatchingService, ProfileEvent, SupabaseStore};
use std::sync::Arc;

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser)]
#[command(name = "runmatch", version, about = "Runner profile embeddings and run matching")]
struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the embedding of a piece of text (no store access)
    Embed {
        /// Text to embed
        text: String,
    },
    /// Show the text a user's embedding is computed from
    Describe {
        user_id: i64,
    },
    /// Recompute and store a user's embedding
    UpdateEmbedding {
        user_id: i64,
    },
    /// Refresh a user's embedding after a profile or run change
    Refresh {
        /// What changed
        #[arg(value_enum)]
        event: EventKind,
        user_id: i64,
    },
    /// List ranked candidates for one of the user's runs
    Matches {
        user_id: i64,
        run_id: i64,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write store connection settings
    Init {
        /// Store base URL
        url: String,
        /// Public API key
        api_key: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EventKind {
    SignedUp,
    ProfileEdited,
    RunCreated,
    RunUpdated,
}

impl EventKind {
    fn for_user(self, user_id: i64) -> ProfileEvent {
        match self {
            EventKind::SignedUp => ProfileEvent::SignedUp { user_id },
            EventKind::ProfileEdited => ProfileEvent::ProfileEdited { user_id },
            EventKind::RunCreated => ProfileEvent::RunCreated { user_id },
            EventKind::RunUpdated => ProfileEvent::RunUpdated { user_id },
        }
    }
}

/// JSON envelope for non-interactive output
fn json_output(success: bool, data: serde_json::Value, error: Option<&str>) -> String {
    serde_json::json!({
        "success": success,
        "data": data,
        "error": error,
    })
    .to_string()
}

fn build_service(manager: &ConfigManager) -> Result<MatchingService> {
    let config = manager.get();
    let store = Arc::new(SupabaseStore::new(&config.store)?);
    Ok(MatchingService::new(store.clone(), store)
        .with_refresh_on_events(config.matching.refresh_on_events))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Check for --json flag before initializing logging
    let json_mode = std::env::args().any(|arg| arg == "--json");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("runmatch=info"));

    if json_mode {
        // keep stdout clean for the JSON envelope
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    } else if std::env::var("RUNMATCH_LOG_JSON").is_ok() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }

    let cli = Cli::parse();

    if let Err(e) = run_command(cli.command, cli.json).await {
        if cli.json {
            println!("{}", json_output(false, serde_json::Value::Null, Some(&e.to_string())));
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run_command(command: Commands, json_mode: bool) -> Result<()> {
    match command {
        Commands::Embed { text } => {
            let embedding = generate_embedding(&text);
            if json_mode {
                println!("{}", json_output(true, serde_json::json!({
                    "dimensions": embedding.len(),
                    "embedding": embedding,
                }), None));
            } else {
                println!("{}", serde_json::to_string(&embedding)?);
            }
        }
        Commands::Describe { user_id } => {
            let manager = ConfigManager::new()?;
            let service = build_service(&manager)?;
            let text = service.describe_user(user_id).await?;
            if json_mode {
                println!("{}", json_output(true, serde_json::json!({
                    "user_id": user_id,
                    "text": text,
                }), None));
            } else {
                println!("{}", text);
            }
        }
        Commands::UpdateEmbedding { user_id } => {
            let manager = ConfigManager::new()?;
            let service = build_service(&manager)?;
            let embedding = service.update_user_embedding(user_id).await?;
            if json_mode {
                println!("{}", json_output(true, serde_json::json!({
                    "user_id": user_id,
                    "zero_vector": embedding.is_zero(),
                }), None));
            } else {
                println!("Embedding updated for user {}", user_id);
            }
        }
        Commands::Refresh { event, user_id } => {
            let manager = ConfigManager::new()?;
            let service = build_service(&manager)?;
            let event = event.for_user(user_id);
            let refreshed = service.on_profile_event(event).await?;
            if json_mode {
                println!("{}", json_output(true, serde_json::json!({
                    "event": event.name(),
                    "user_id": user_id,
                    "refreshed": refreshed.is_some(),
                }), None));
            } else if refreshed.is_some() {
                println!("Embedding refreshed for user {} ({})", user_id, event.name());
            } else {
                println!("Embedding refresh is disabled (matching.refresh_on_events = false)");
            }
        }
        Commands::Matches { user_id, run_id } => {
            let manager = ConfigManager::new()?;
            let service = build_service(&manager)?;
            let matches = service.get_run_matches(user_id, run_id).await?;
            if json_mode {
                println!("{}", json_output(true, serde_json::to_value(&matches)?, None));
            } else if matches.is_empty() {
                println!("No matches for run {}", run_id);
            } else {
                for (rank, m) in matches.iter().enumerate() {
                    println!(
                        "{:>3}. {} (user {}, run {})  similarity {:.3}",
                        rank + 1,
                        m.display_name.as_deref().unwrap_or("Anonymous runner"),
                        m.user_id,
                        m.run_id,
                        m.similarity,
                    );
                    println!(
                        "     {} @ {}  {}",
                        m.target_distance.map(format_distance).unwrap_or_else(|| "?".into()),
                        m.target_pace.map(format_pace).unwrap_or_else(|| "?".into()),
                        m.location.as_deref().unwrap_or("location TBD"),
                    );
                }
            }
        }
        Commands::Config { action } => {
            // `init` writes the file back, so it must not see env overrides
            let mut manager = match action {
                ConfigAction::Init { .. } => ConfigManager::for_editing()?,
                _ => ConfigManager::new()?,
            };
            match action {
                ConfigAction::Show => {
                    let mut config = manager.get().clone();
                    // never echo credentials
                    if !config.store.api_key.is_empty() {
                        config.store.api_key = "********".into();
                    }
                    if config.store.access_token.is_some() {
                        config.store.access_token = Some("********".into());
                    }
                    if json_mode {
                        println!("{}", json_output(true, serde_json::to_value(&config)?, None));
                    } else {
                        println!("{}", toml::to_string_pretty(&config)?);
                    }
                }
                ConfigAction::Path => {
                    let path = manager.config_path().display().to_string();
                    if json_mode {
                        println!("{}", json_output(true, serde_json::json!({ "path": path }), None));
                    } else {
                        println!("{}", path);
                    }
                }
                ConfigAction::Init { url, api_key } => {
                    manager.get_mut().store.url = url;
                    manager.get_mut().store.api_key = api_key;
                    manager.get().store.validate()?;
                    manager.save()?;
                    if json_mode {
                        println!("{}", json_output(true, serde_json::json!({
                            "path": manager.config_path().display().to_string(),
                        }), None));
                    } else {
                        println!("Configuration saved to {}", manager.config_path().display());
                    }
                }
            }
        }
    }

    Ok(())
}
