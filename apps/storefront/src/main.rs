mod config;
mod render;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{registration::RegistrationForm, Credential, StorefrontClient};
use shared::domain::{Identity, RecordId, Role};
use table_core::{
    resolve_columns, resolve_for_identity, PagingMode, TableController, TableDriver, TableOptions,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Storefront order table client")]
struct Cli {
    /// Settings file. Defaults to `storefront.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    token: Option<String>,
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of the order table for the current credential.
    Orders {
        /// Zero-based page index.
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long)]
        paging: Option<PagingMode>,
        /// Open the detail of this order after the list loads.
        #[arg(long)]
        select: Option<RecordId>,
        /// Print the view model as JSON instead of a text table.
        #[arg(long)]
        json: bool,
    },
    /// Fetch a single order's detail.
    Detail { id: RecordId },
    Products,
    /// List the columns a role sees. Defaults to the credential's role.
    Columns {
        #[arg(long)]
        role: Option<String>,
    },
    /// Validate a registration form stored as JSON.
    ValidateRegistration { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let mut settings = load_settings(config_path).with_context(|| {
        let shown = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        format!("loading settings from {}", shown.display())
    })?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(token) = cli.token {
        settings.token = Some(token);
    }
    if let Some(token_file) = cli.token_file {
        settings.token = None;
        settings.token_file = Some(token_file);
    }

    match cli.command {
        Command::Orders {
            page,
            page_size,
            paging,
            select,
            json,
        } => {
            let options = TableOptions {
                paging: paging.unwrap_or(settings.paging),
                page_size: page_size.unwrap_or(settings.page_size),
            };
            orders(&settings, options, page, select, json).await
        }
        Command::Detail { id } => {
            let client = build_client(&settings)?;
            let detail = client
                .order_detail(id)
                .await
                .with_context(|| format!("fetching order {id}"))?;
            println!("{}", serde_json::to_string_pretty(&detail.payload)?);
            Ok(())
        }
        Command::Products => {
            let client = build_client(&settings)?;
            let products = client.list_products().await.context("fetching products")?;
            print!("{}", render::products(&products));
            Ok(())
        }
        Command::Columns { role } => {
            let columns = match role {
                Some(raw) => resolve_columns(Role::from_claim(&raw)),
                None => resolve_for_identity(&identity(&settings)?),
            };
            print!("{}", render::columns(&columns));
            Ok(())
        }
        Command::ValidateRegistration { file } => validate_registration(&file),
    }
}

async fn orders(
    settings: &Settings,
    options: TableOptions,
    page: usize,
    select: Option<RecordId>,
    json: bool,
) -> Result<()> {
    let client = build_client(settings)?;
    let identity = client
        .credential()
        .map(Credential::identity)
        .unwrap_or_default();
    info!(
        role = ?identity.role(),
        paging = %options.paging,
        page_size = options.page_size,
        "opening order table"
    );

    let controller = TableController::new(identity, options).context("invalid page size")?;
    let mut driver = TableDriver::new(Arc::new(client), controller);
    driver.start();
    driver.settle().await;

    if page > 0 {
        driver.change_page(page);
        driver.settle().await;
    }
    if let Some(id) = select {
        driver.select_row(id);
        driver.settle().await;
    }

    let view = driver.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::table(&view));
        print!("{}", render::detail(&view.detail)?);
    }

    if let Some(err) = &view.list_error {
        if err.requires_reauth() {
            warn!("credential rejected by the backend; sign in again");
        }
        bail!("order list unavailable: {err}");
    }
    Ok(())
}

fn build_client(settings: &Settings) -> Result<StorefrontClient> {
    let base_url = settings.api_base()?;
    let credential = settings.read_token()?.and_then(Credential::new);
    if credential.is_none() {
        warn!("no credential configured; requests go out without Authorization");
    }
    Ok(StorefrontClient::new(base_url, credential))
}

fn identity(settings: &Settings) -> Result<Identity> {
    Ok(settings
        .read_token()?
        .and_then(Credential::new)
        .map(|credential| credential.identity())
        .unwrap_or_default())
}

fn validate_registration(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let form: RegistrationForm = serde_json::from_str(&raw)
        .with_context(|| format!("parsing registration form {}", file.display()))?;

    match form.validate() {
        Ok(()) => {
            println!("registration form is valid");
            Ok(())
        }
        Err(errors) => {
            for (field, messages) in errors.iter() {
                for message in messages {
                    println!("{field}: {message}");
                }
            }
            bail!("registration form has invalid fields");
        }
    }
}
