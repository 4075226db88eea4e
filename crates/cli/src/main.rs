//! Voltshop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! voltshop-cli migrate
//!
//! # Create a verified admin account (bypasses the OTP flow)
//! voltshop-cli admin create -e admin@example.com -n "Admin Name" -p "phone" -w "password"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "voltshop-cli")]
#[command(author, version, about = "Voltshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin phone number
        #[arg(short, long)]
        phone: String,

        /// Admin password
        #[arg(short = 'w', long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                phone,
                password,
            } => {
                commands::admin::create_user(&email, &name, &phone, &password).await?;
            }
        },
    }
    Ok(())
}
