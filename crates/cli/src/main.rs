//! Lima Rose CLI - Operator tools for the catalog API.
//!
//! # Usage
//!
//! ```bash
//! # Hash the admin password for ADMIN_PASSWORD_HASH
//! lr-cli hash-password 'limarose2025'
//!
//! # Mint a token signed with ADMIN_TOKEN_SECRET
//! lr-cli token issue --username auditor --role viewer
//!
//! # Validate a seed file
//! lr-cli catalog check seed.json
//!
//! # Read a running API
//! lr-cli catalog list --api-url http://localhost:3000/api
//! lr-cli catalog stats --api-url http://localhost:3000/api
//! ```
//!
//! # Commands
//!
//! - `hash-password` - Print an Argon2 hash
//! - `token issue` - Print a signed admin token
//! - `catalog` - Check seed files and read a running API

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use lima_rose_core::AdminRole;

mod commands;

const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Parser)]
#[command(name = "lr-cli")]
#[command(author, version, about = "Lima Rose CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Argon2 hash of a password
    HashPassword {
        /// Password to hash
        password: SecretString,
    },
    /// Manage admin tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Inspect catalogs
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Sign a token with ADMIN_TOKEN_SECRET
    Issue {
        /// Username carried in the token
        #[arg(short, long)]
        username: String,

        /// Token role (`admin`, `viewer`)
        #[arg(short, long, default_value = "viewer")]
        role: AdminRole,

        /// Lifetime in seconds
        #[arg(long, default_value_t = 86_400)]
        ttl_secs: u64,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a seed file and print its stats
    Check {
        /// Path to the JSON seed file
        file: PathBuf,
    },
    /// List products from a running API
    List {
        /// API root
        #[arg(long, env = "STOREFRONT_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
    /// Print stats from a running API
    Stats {
        /// API root
        #[arg(long, env = "STOREFRONT_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output can be piped
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Pick up ADMIN_TOKEN_SECRET and STOREFRONT_API_URL from .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::HashPassword { password } => {
            println!("{}", commands::auth::hash(&password)?);
        }
        Commands::Token { action } => match action {
            TokenAction::Issue {
                username,
                role,
                ttl_secs,
            } => {
                println!("{}", commands::auth::issue_token(&username, role, ttl_secs)?);
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Check { file } => {
                let stats = commands::catalog::check(&file).await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            CatalogAction::List { api_url } => {
                for line in commands::catalog::list(&api_url).await? {
                    println!("{line}");
                }
            }
            CatalogAction::Stats { api_url } => {
                let stats = commands::catalog::stats(&api_url).await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        },
    }
    Ok(())
}
