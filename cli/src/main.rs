use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use storefront::api::ProductQuery;
use storefront::api::types::{ReportKind, TimeRange};
use storefront::auth::{AdminCredentials, AuthError, setup};
use storefront::cart::CartItem;
use storefront::config::{ClientConfig, ConfigError, normalize_base_url};
use storefront::guard::{Access, check_access};
use storefront::health;
use storefront::http::ApiError;
use storefront::storage::StorageError;
use storefront::{ErrorCode, Storefront, StorefrontError};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("{0}")]
    AccessDenied(&'static str),
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("admin setup failed: {0}")]
    SetupFailed(String),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storefront(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Api(e) => e.error_code(),
            Self::Auth(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::NotLoggedIn => "E_NOT_LOGGED_IN",
            Self::AccessDenied(_) => "E_ACCESS_DENIED",
            Self::Unreachable(_) => "E_UNREACHABLE",
            Self::SetupFailed(_) => "E_ADMIN_SETUP",
            Self::Write { .. } => "E_WRITE",
            Self::InvalidJson(_) => "E_JSON",
        }
    }
}

impl CliError {
    fn needs_login(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn
                | Self::Api(ApiError::Unauthorized { .. })
                | Self::Auth(AuthError::Api(ApiError::Unauthorized { .. }))
                | Self::Storefront(StorefrontError::Api(ApiError::Unauthorized { .. }))
        )
    }
}

#[derive(Parser, Debug)]
#[command(name = "storefront-cli", about = "Storefront and admin dashboard CLI")]
struct Cli {
    #[arg(long, env = "STOREFRONT_API_URL")]
    base_url: Option<String>,

    #[arg(long, env = "STOREFRONT_STORAGE_PATH")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the backend `/health` endpoint.
    Ping,
    Login(Credentials),
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Verify the stored session against `/auth/me`.
    Whoami,
    Products(ProductsCommand),
    Orders(OrdersCommand),
    Newsletter(NewsletterCommand),
    Cart(CartCommand),
    Admin(AdminCommand),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Login(_) => "login",
            Self::Register { .. } => "register",
            Self::Logout => "logout",
            Self::Whoami => "whoami",
            Self::Products(_) => "products",
            Self::Orders(_) => "orders",
            Self::Newsletter(_) => "newsletter",
            Self::Cart(_) => "cart",
            Self::Admin(_) => "admin",
        }
    }
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProductsSubcommand {
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    Get {
        product_id: String,
    },
}

#[derive(Args, Debug)]
struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Subcommand, Debug)]
enum OrdersSubcommand {
    List,
    Get { order_id: String },
    Stats,
}

#[derive(Args, Debug)]
struct NewsletterCommand {
    #[command(subcommand)]
    command: NewsletterSubcommand,
}

#[derive(Subcommand, Debug)]
enum NewsletterSubcommand {
    Subscribe { email: String },
}

#[derive(Args, Debug)]
struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Subcommand, Debug)]
enum CartSubcommand {
    Add {
        product_id: String,
        #[arg(long, default_value = "")]
        size: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    Remove {
        product_id: String,
        #[arg(long, default_value = "")]
        size: String,
    },
    Show,
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    /// Admin login; falls back to local credentials when enabled and the backend is down.
    Login(Credentials),
    /// Ensure an admin account exists on the backend.
    ///
    /// Does not log in. If the backend rejects the credentials with 401, the
    /// stored session is cleared.
    Setup {
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "STOREFRONT_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    #[command(flatten)]
    Query(AdminQuery),
}

/// Admin commands that need an admin session.
#[derive(Subcommand, Debug)]
enum AdminQuery {
    Stats,
    Products,
    Orders,
    Users,
    Analytics {
        #[arg(long, default_value = "30days")]
        range: TimeRange,
    },
    Reports {
        #[arg(long, default_value = "sales")]
        kind: ReportKind,
        #[arg(long, default_value = "30days")]
        range: TimeRange,
    },
    /// Download a report as CSV into `--out`.
    Export {
        #[arg(long, default_value = "sales")]
        kind: ReportKind,
        #[arg(long, default_value = "30days")]
        range: TimeRange,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    Settings,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(code = error.error_code(), %error, "command failed");
            eprintln!("error [{}]: {error}", error.error_code());
            if error.needs_login() {
                eprintln!("hint: run `storefront-cli login` (or `storefront-cli admin login`) first");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = normalize_base_url(&base_url);
    }
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }
    let app = Storefront::open(config)?;
    tracing::debug!(command = cli.command.name(), base_url = %app.config().base_url, "dispatching command");

    match cli.command {
        Command::Ping => run_ping(&app).await,
        Command::Login(creds) => print_json(&app.auth().login(&creds.email, &creds.password, false).await?),
        Command::Register { name, email, password } => print_json(&app.auth().register(&name, &email, &password).await?),
        Command::Logout => {
            app.auth().logout();
            print_json(&json!({ "loggedOut": true }))
        }
        Command::Whoami => match app.auth().check_auth().await {
            Some(user) => print_json(&user),
            None => Err(CliError::NotLoggedIn),
        },
        Command::Products(products) => run_products(&app, products).await,
        Command::Orders(orders) => run_orders(&app, orders).await,
        Command::Newsletter(NewsletterCommand { command: NewsletterSubcommand::Subscribe { email } }) => {
            print_json(&app.store().subscribe_newsletter(&email).await?)
        }
        Command::Cart(cart) => run_cart(&app, cart).await,
        Command::Admin(admin) => run_admin(&app, admin).await,
    }
}

async fn run_ping(app: &Storefront) -> Result<(), CliError> {
    let report = health::probe(app.api(), app.config().timeouts.health).await;
    print_json(&report)?;
    if report.reachable {
        Ok(())
    } else {
        Err(CliError::Unreachable(report.error.unwrap_or_default()))
    }
}

async fn run_products(app: &Storefront, products: ProductsCommand) -> Result<(), CliError> {
    let store = app.store();
    match products.command {
        ProductsSubcommand::List { category, limit } => {
            print_json(&store.list_products(&ProductQuery { category, limit }).await?)
        }
        ProductsSubcommand::Get { product_id } => print_json(&store.get_product(&product_id).await?),
    }
}

async fn run_orders(app: &Storefront, orders: OrdersCommand) -> Result<(), CliError> {
    require(app, false)?;
    let store = app.store();
    match orders.command {
        OrdersSubcommand::List => print_json(&store.list_orders().await?),
        OrdersSubcommand::Get { order_id } => print_json(&store.get_order(&order_id).await?),
        OrdersSubcommand::Stats => print_json(&store.user_stats().await?),
    }
}

async fn run_cart(app: &Storefront, cart: CartCommand) -> Result<(), CliError> {
    match cart.command {
        CartSubcommand::Add { product_id, size, quantity } => {
            let product = app.store().get_product(&product_id).await?;
            app.cart().add(CartItem::from_product(&product, &size, quantity))?;
        }
        CartSubcommand::Remove { product_id, size } => app.cart().remove(&product_id, &size)?,
        CartSubcommand::Show => {}
    }
    print_json(&json!({
        "items": app.cart().items(),
        "totalItems": app.cart().total_items(),
        "totalPrice": app.cart().total_price(),
    }))
}

async fn run_admin(app: &Storefront, admin: AdminCommand) -> Result<(), CliError> {
    match admin.command {
        AdminSubcommand::Login(creds) => print_json(&app.auth().admin_login(&creds.email, &creds.password).await?),
        AdminSubcommand::Setup { email, password, name } => {
            let defaults = AdminCredentials::default();
            let credentials = AdminCredentials {
                email: email.unwrap_or(defaults.email),
                password: password.unwrap_or(defaults.password),
                name: name.unwrap_or(defaults.name),
            };
            let outcome = setup::setup_admin_user(app.api(), &credentials).await?;
            print_json(&outcome)?;
            if outcome.success {
                Ok(())
            } else {
                Err(CliError::SetupFailed(outcome.error.unwrap_or_default()))
            }
        }
        AdminSubcommand::Query(query) => {
            require(app, true)?;
            run_admin_query(app, query).await
        }
    }
}

async fn run_admin_query(app: &Storefront, query: AdminQuery) -> Result<(), CliError> {
    let api = app.admin();
    match query {
        AdminQuery::Stats => print_json(&api.dashboard_stats().await?),
        AdminQuery::Products => print_json(&api.list_products().await?),
        AdminQuery::Orders => print_json(&api.list_orders().await?),
        AdminQuery::Users => print_json(&api.list_users().await?),
        AdminQuery::Analytics { range } => print_json(&api.analytics(range).await?),
        AdminQuery::Reports { kind, range } => print_json(&api.reports(kind, range).await?),
        AdminQuery::Export { kind, range, out } => {
            let report = api.export_report(kind, range).await?;
            let path = out.join(&report.file_name);
            std::fs::write(&path, &report.bytes).map_err(|source| CliError::Write { path: path.clone(), source })?;
            print_json(&json!({ "file": path.display().to_string(), "bytes": report.bytes.len() }))
        }
        AdminQuery::Settings => print_json(&api.settings().await?),
    }
}

/// Gate a command on the stored session, as a protected route would.
fn require(app: &Storefront, admin: bool) -> Result<(), CliError> {
    match check_access(&app.auth_state(), admin) {
        Access::Allow => Ok(()),
        Access::RedirectLogin => Err(CliError::NotLoggedIn),
        denied => Err(CliError::AccessDenied(denied.message().unwrap_or("access denied"))),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
