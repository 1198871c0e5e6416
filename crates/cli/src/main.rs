//! Stone Art CLI - storefront and admin from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! stoneart products --search ganesha --category 2 --pages 2
//! stoneart product 14
//!
//! # Sign in with the URL the OAuth provider redirected to
//! stoneart login --jwt-url "http://localhost:5173/?jwt=eyJ..."
//!
//! # Shop
//! stoneart cart add 14
//! stoneart checkout
//!
//! # Administer the catalog
//! stoneart login admin -e admin@example.com -p secret
//! stoneart admin create-product --name "Marble Ganesha" --price 15000 \
//!     --category 2 --image front.jpg --image side.jpg
//! ```
//!
//! # Environment Variables
//!
//! - `STONEART_API_URL` - backend base URL (required)
//! - `STONEART_STATE_DIR` - where the session and cart are kept
//! - `RUST_LOG` - log filter, defaults to `stoneart=info`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stoneart_core::{CategoryId, Price, ProductId, ProductStatus};
use stoneart_storefront::config::StorefrontConfig;
use stoneart_storefront::state::Storefront;
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "stoneart")]
#[command(author, version, about = "Stone Art storefront and admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog products
    Products {
        /// Search by name
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by category id (repeatable)
        #[arg(short, long)]
        category: Vec<CategoryId>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one product
    Product { id: ProductId },
    /// List categories
    Categories,
    /// Sign in
    Login(LoginArgs),
    /// Sign out and clear the cart
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout,
    /// Show the profile and order history
    Profile,
    /// Navigate to a path and print where the route guards land
    Visit { path: String },
    /// Administer the catalog
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true)]
struct LoginArgs {
    #[command(subcommand)]
    mode: Option<LoginMode>,

    /// URL the OAuth provider redirected back to (carries `jwt`)
    #[arg(long)]
    jwt_url: Option<Url>,
}

#[derive(Subcommand)]
enum LoginMode {
    /// Sign in with admin credentials
    Admin {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add one unit of a product
    Add { id: ProductId },
    /// Remove one unit of a product
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show dashboard counters
    Stats,
    /// List products
    Products {
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one product
    Product { id: ProductId },
    /// Create a product
    CreateProduct {
        #[command(flatten)]
        fields: ProductFieldArgs,

        /// Image file (1 to 4)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
    },
    /// Update a product
    UpdateProduct {
        id: ProductId,

        #[command(flatten)]
        fields: ProductFieldOverrides,

        /// Existing image URL to drop (repeatable)
        #[arg(long = "drop-image")]
        drop_images: Vec<String>,

        /// New image file (repeatable)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
    },
    /// Create a category
    CreateCategory {
        #[arg(short, long)]
        name: String,
    },
    /// Register another admin
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Change your admin password
    ResetPassword {
        #[arg(long)]
        current: String,

        #[arg(long = "new")]
        new_password: String,

        #[arg(long)]
        confirm: String,
    },
}

#[derive(Args)]
struct ProductFieldArgs {
    #[arg(long)]
    name: String,

    /// Description HTML
    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, value_parser = Price::parse)]
    price: Price,

    #[arg(long)]
    category: CategoryId,

    #[arg(long, default_value = "active")]
    status: ProductStatus,
}

#[derive(Args)]
struct ProductFieldOverrides {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long, value_parser = Price::parse)]
    price: Option<Price>,

    #[arg(long)]
    category: Option<CategoryId>,

    #[arg(long)]
    status: Option<ProductStatus>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "stoneart=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let storefront = Storefront::new(config)?;
    storefront.start().await;

    let outcome = dispatch(&storefront, cli.command).await;

    storefront.settle().await;
    render::notices(&storefront.notices().drain());
    outcome?;
    Ok(())
}

async fn dispatch(storefront: &Storefront, command: Commands) -> Result<(), commands::CliError> {
    match command {
        Commands::Products {
            search,
            category,
            pages,
        } => commands::catalog::products(storefront, search.as_deref(), &category, pages).await,
        Commands::Product { id } => commands::catalog::product(storefront, id).await,
        Commands::Categories => commands::catalog::categories(storefront).await,
        Commands::Login(LoginArgs { mode, jwt_url }) => match (mode, jwt_url) {
            (Some(LoginMode::Admin { email, password }), _) => {
                commands::account::admin_login(storefront, &email, password).await
            }
            (None, Some(url)) => commands::account::complete_oauth(storefront, &url),
            (None, None) => commands::account::begin_oauth(storefront),
        },
        Commands::Logout => {
            commands::account::logout(storefront);
            Ok(())
        }
        Commands::Whoami => {
            commands::account::whoami(storefront);
            Ok(())
        }
        Commands::Cart { action } => match action {
            CartAction::Show => {
                commands::cart::show(storefront);
                Ok(())
            }
            CartAction::Add { id } => commands::cart::add(storefront, id).await,
            CartAction::Remove { id } => commands::cart::remove(storefront, id),
            CartAction::Clear => commands::cart::clear(storefront),
        },
        Commands::Checkout => commands::cart::checkout(storefront).await,
        Commands::Profile => {
            commands::account::profile(storefront).await;
            Ok(())
        }
        Commands::Visit { path } => {
            commands::account::visit(storefront, &path);
            Ok(())
        }
        Commands::Admin { action } => commands::admin::run(storefront, action).await,
    }
}
