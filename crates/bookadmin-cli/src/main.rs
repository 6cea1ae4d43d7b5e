//! bookadmin - command-line shell for the booking platform admin API.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password is prompted, or read from BOOKADMIN_PASSWORD)
//! bookadmin login --phone 9876543210
//!
//! # Show who is logged in and when the token expires
//! bookadmin status
//!
//! # Raw API calls, printed as pretty JSON
//! bookadmin get /admin/users -q page=1 -q limit=10
//! bookadmin put /admin/services/8/availability --data '{"is_available":false}'
//! bookadmin upload /admin/vendors/3/shop/profile-image --method put \
//!     --field image=@logo.png --field type=profile
//!
//! bookadmin logout
//! ```
//!
//! Set `RUST_LOG=debug` to see each request, and `BOOKADMIN_LOG_DIR` to
//! also write logs to a daily rolling file.

mod args;

use std::io;

use anyhow::{bail, Context, Result};
use bookadmin_core::api::{FileUpload, Method, MultipartForm, Request};
use bookadmin_core::{ApiClient, ClientEvent, Config, SessionStore};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{parse_field, parse_pair, FieldArg};

/// Directory for rolling log files (optional)
const LOG_DIR_ENV: &str = "BOOKADMIN_LOG_DIR";

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "bookadmin.log";

/// Password source for non-interactive logins
const PASSWORD_ENV: &str = "BOOKADMIN_PASSWORD";

#[derive(Parser)]
#[command(name = "bookadmin")]
#[command(author, version, about = "Admin shell for the booking platform API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        /// Phone number (defaults to the last one used)
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Clear the session
    Logout,
    /// Show the current session
    Status,
    /// GET a path, with optional query parameters
    Get {
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// PATCH a JSON body
    Patch {
        path: String,
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// DELETE a path
    Delete { path: String },
    /// Send a multipart form
    Upload {
        path: String,
        /// Form field as name=value, or name=@file to attach a file (repeatable)
        #[arg(short, long = "field", value_parser = parse_field, required = true)]
        fields: Vec<FieldArg>,
        #[arg(short, long, value_enum, default_value_t = UploadMethod::Post)]
        method: UploadMethod,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UploadMethod {
    Post,
    Put,
}

impl From<UploadMethod> for Method {
    fn from(method: UploadMethod) -> Self {
        match method {
            UploadMethod::Post => Method::Post,
            UploadMethod::Put => Method::Put,
        }
    }
}

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the file writer on drop.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();

    let mut config = Config::load()?;
    let client = ApiClient::from_config(&config)?;
    let store = SessionStore::new(client.clone(), config.session_storage()?);
    store.initialize();

    let mut events = client.subscribe();
    let notify_expiry = reports_session_expiry(&cli.command);
    let result = run(cli.command, &store, &mut config).await;

    if notify_expiry {
        if let Ok(ClientEvent::SessionInvalidated) = events.try_recv() {
            eprintln!("Session expired. Run `bookadmin login` to sign in again.");
        }
    }

    result
}

/// A 401 during login means bad credentials, not an expired session
fn reports_session_expiry(command: &Commands) -> bool {
    !matches!(command, Commands::Login { .. })
}

async fn run(command: Commands, store: &SessionStore, config: &mut Config) -> Result<()> {
    match command {
        Commands::Login { phone } => login(store, config, phone).await,
        Commands::Logout => {
            store.logout();
            eprintln!("Logged out.");
            Ok(())
        }
        Commands::Status => {
            status(store, config);
            Ok(())
        }
        Commands::Get { path, query } => {
            let request = Request::new(Method::Get, path).query(query);
            call(store, request).await
        }
        Commands::Post { path, data } => call(store, json_request(Method::Post, path, &data)?).await,
        Commands::Put { path, data } => call(store, json_request(Method::Put, path, &data)?).await,
        Commands::Patch { path, data } => {
            call(store, json_request(Method::Patch, path, &data)?).await
        }
        Commands::Delete { path } => call(store, Request::new(Method::Delete, path)).await,
        Commands::Upload {
            path,
            fields,
            method,
        } => {
            let form = build_form(fields).await?;
            call(store, Request::new(method.into(), path).multipart(form)).await
        }
    }
}

async fn login(store: &SessionStore, config: &mut Config, phone: Option<String>) -> Result<()> {
    let phone = match phone.or_else(|| config.last_phone_number.clone()) {
        Some(phone) => phone,
        None => bail!("No phone number given. Use `bookadmin login --phone <number>`."),
    };

    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password(format!("Password for {}: ", phone))
            .context("Failed to read password")?,
    };

    let user = store.login(&phone, &password).await?;
    eprintln!("Logged in as {} ({}).", user.display_name(), user.user_type);

    if config.last_phone_number.as_deref() != Some(phone.as_str()) {
        config.last_phone_number = Some(phone);
        config.save()?;
    }
    Ok(())
}

fn status(store: &SessionStore, config: &Config) {
    let state = store.state();
    println!("API:           {}", config.api_base_url());
    match state.user {
        Some(user) if state.is_authenticated => {
            println!("User:          {} (id {})", user.display_name(), user.user_id);
            println!("Type:          {}", user.user_type);
            match store.minutes_until_expiry() {
                Some(0) => println!("Token:         expired"),
                Some(minutes) => println!("Token:         expires in {}m", minutes),
                None => println!("Token:         no readable expiry"),
            }
        }
        _ => println!("User:          not logged in"),
    }
}

fn json_request(method: Method, path: String, data: &str) -> Result<Request> {
    let body: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
    Ok(Request::new(method, path).json(body))
}

async fn build_form(fields: Vec<FieldArg>) -> Result<MultipartForm> {
    let mut form = MultipartForm::new();
    for field in fields {
        form = match field {
            FieldArg::Text { name, value } => form.text(name, value),
            FieldArg::File { name, path } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| name.clone());
                let content_type = mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string();
                form.file(name, FileUpload::new(file_name, content_type, bytes))
            }
        };
    }
    Ok(form)
}

async fn call(store: &SessionStore, request: Request) -> Result<()> {
    if !store.refresh_session() {
        bail!("Not logged in or session expired. Run `bookadmin login` first.");
    }

    info!(method = %request.method, path = %request.path, "Calling API");
    let response = store.client().request(request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
