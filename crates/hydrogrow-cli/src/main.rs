//! HydroGrow CLI - sign in to the HydroGrow backend and view plant data.
//!
//! Usage: `hydrogrow <login|register|logout|whoami|items|status|config|help>`

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use hydrogrow_core::auth::validation;
use hydrogrow_core::{
    ApiError, Config, FileStore, KeyringStore, SessionManager, SessionStorage,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Selects the session backend: `file` (default) or `keyring`
const STORE_ENV: &str = "HYDROGROW_STORE";

const USAGE: &str = "\
Usage: hydrogrow <command>

Commands:
  login [email]   Sign in and remember the session
  register        Create an account
  logout          Forget the saved session
  whoami          Show the signed-in account (from the server)
  items           List your plants
  status          Show the saved session without contacting the server
  config set-url <url>
                  Save the backend base URL to the config file
  help            Show this message

Environment:
  HYDROGROW_API_URL   Backend base URL (default http://localhost:8000)
  HYDROGROW_STORE     Session storage: file or keyring (default file)
  RUST_LOG            Log filter (default warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

fn open_storage(config: &Config) -> Result<Arc<dyn SessionStorage>> {
    match std::env::var(STORE_ENV).as_deref() {
        Ok("keyring") => Ok(Arc::new(KeyringStore::new())),
        Ok("file") | Err(_) => Ok(Arc::new(FileStore::new(config.data_dir()?))),
        Ok(other) => Err(anyhow::anyhow!("Unknown {} value: {}", STORE_ENV, other)),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label).context("Failed to read password")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    if matches!(command, "help" | "--help" | "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    if command == "config" {
        return configure(&args[2..]);
    }

    let config = Config::load()?;
    let storage = open_storage(&config)?;
    let sessions = SessionManager::from_config(&config, storage)
        .context("Failed to create API client")?;
    sessions.initialize().await;
    info!(command = command, base_url = %config.base_url(), "HydroGrow CLI starting");

    match command {
        "login" => login(&sessions, args.get(2).cloned()).await,
        "register" => register(&sessions).await,
        "logout" => {
            sessions.logout().await;
            println!("Signed out.");
            Ok(())
        }
        "whoami" => whoami(&sessions).await,
        "items" => items(&sessions).await,
        "status" => status(&sessions, &config).await,
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }
}

async fn login(sessions: &SessionManager, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = prompt_password("Password: ")?;

    let profile = sessions
        .login(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;

    println!("Welcome {}!", profile.display_name());
    if !sessions.is_session_durable().await {
        println!("Note: the session could not be saved; you will need to log in again next time.");
    }
    Ok(())
}

async fn register(sessions: &SessionManager) -> Result<()> {
    let fullname = prompt("Full name: ")?;
    let email = prompt("Email: ")?;
    let password = prompt_password("Password: ")?;
    let confirm = prompt_password("Confirm password: ")?;

    validation::validate_registration_form(&fullname, &email, &password, &confirm)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let confirmation = sessions
        .register(&email, &password, &fullname)
        .await
        .map_err(|e| anyhow::anyhow!("Registration failed: {}", e))?;

    if !confirmation.message.is_empty() {
        println!("{}", confirmation.message);
    }
    println!("Account created! Please log in with your credentials.");
    Ok(())
}

/// Unauthorized reads end the session, like an expired token would
async fn handle_read_error(sessions: &SessionManager, err: ApiError) -> anyhow::Error {
    if err.is_unauthorized() {
        sessions.logout().await;
        return anyhow::anyhow!("Your session has expired. Please log in again.");
    }
    if err.is_connectivity() {
        return anyhow::anyhow!("{}", hydrogrow_core::auth::error::CONNECTIVITY_MESSAGE);
    }
    match err.detail() {
        Some(detail) => anyhow::anyhow!("{}", detail),
        None => anyhow::Error::new(err),
    }
}

async fn require_login(sessions: &SessionManager) -> Result<()> {
    if sessions.is_logged_in().await {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Not signed in. Run `hydrogrow login` first."))
    }
}

async fn whoami(sessions: &SessionManager) -> Result<()> {
    require_login(sessions).await?;
    let account = match sessions.refresh_profile().await {
        Ok(account) => account,
        Err(e) => return Err(handle_read_error(sessions, e).await),
    };

    println!("{} <{}>", account.fullname, account.email);
    println!("Active: {}", if account.is_active { "yes" } else { "no" });
    Ok(())
}

async fn items(sessions: &SessionManager) -> Result<()> {
    require_login(sessions).await?;
    let resp = match sessions.api().fetch_items().await {
        Ok(resp) => resp,
        Err(e) => return Err(handle_read_error(sessions, e).await),
    };

    if resp.items.is_empty() {
        println!("No plants yet.");
        return Ok(());
    }
    for item in &resp.items {
        let flag = if item.ph_in_range() { "" } else { "  (check pH)" };
        println!(
            "{:>3}  {:<24} {:<10} {}{}",
            item.id,
            item.name,
            item.status.label(),
            item.ph_display(),
            flag
        );
    }
    Ok(())
}

/// Edit the config file directly; env overrides are not written back
fn configure(args: &[String]) -> Result<()> {
    match args {
        [action, url] if action == "set-url" => {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!("Base URL must start with http:// or https://"));
            }
            let path = Config::config_path()?;
            let mut config = Config::load_from(&path)?;
            config.api_base_url = url.to_string();
            config.save_to(&path)?;
            println!("Backend set to {} ({})", config.base_url(), path.display());
            Ok(())
        }
        _ => Err(anyhow::anyhow!("Usage: hydrogrow config set-url <url>")),
    }
}

async fn status(sessions: &SessionManager, config: &Config) -> Result<()> {
    println!("Backend: {}", sessions.api().base_url());
    match sessions.current_session().await {
        Some(session) => {
            println!(
                "Signed in as {} <{}>",
                session.profile.display_name(),
                session.profile.email
            );
            println!("Since: {}", session.age_display());
        }
        None => println!("Not signed in."),
    }
    if let Ok(json) = serde_json::to_string(&config) {
        info!(config = %json, "Active configuration");
    }
    Ok(())
}
