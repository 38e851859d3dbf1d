mod client;
mod commands;
mod config;
mod platform;
mod session_file;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    App, ListView, cmd_auth_logout, cmd_auth_status, cmd_auth_token, cmd_config_show, cmd_create,
    cmd_delete, cmd_fav, cmd_list, cmd_share, cmd_show, cmd_stats,
};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "larder",
    version,
    about = "Browse, save and share recipes from your recipe service"
)]
struct Cli {
    /// Log requests and store updates to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes, yours first
    List {
        /// Only recipes you created
        #[arg(long, conflicts_with = "favorites")]
        mine: bool,
        /// Only your favorites
        #[arg(long)]
        favorites: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with its ingredients
    Show {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a recipe
    Create {
        /// Recipe title
        #[arg(short, long)]
        title: String,
        /// Cuisine (defaults to "Unknown" on the service)
        #[arg(short, long)]
        cuisine: Option<String>,
        /// Ingredient as NAME=QTY, repeatable (e.g. --ingredient flour=200g)
        #[arg(short, long = "ingredient", value_name = "NAME=QTY")]
        ingredients: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one of your recipes
    Delete {
        /// Recipe ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a recipe to favorites, or remove it if already there
    Fav {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Share a link to a recipe
    Share {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show counts and your latest activity
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the stored API token
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Verify and store a bearer token (read from stdin if omitted)
    Token {
        token: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show who is logged in
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the stored token
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print resolved settings and where each came from
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Token { token, json } => cmd_auth_token(&config, token, json).await,
            AuthCommands::Status { json } => cmd_auth_status(&config, json),
            AuthCommands::Logout { json } => cmd_auth_logout(&config, json),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => cmd_config_show(&config, json),
        },
        Commands::List {
            mine,
            favorites,
            json,
        } => {
            let view = if mine {
                ListView::Mine
            } else if favorites {
                ListView::Favorites
            } else {
                ListView::All
            };
            cmd_list(&App::open(&config)?, view, json).await
        }
        Commands::Show { id, json } => cmd_show(&App::open(&config)?, &id, json).await,
        Commands::Create {
            title,
            cuisine,
            ingredients,
            json,
        } => cmd_create(&App::open(&config)?, &title, cuisine, &ingredients, json).await,
        Commands::Delete { id, yes, json } => {
            cmd_delete(&App::open(&config)?, &id, yes, json).await
        }
        Commands::Fav { id, json } => cmd_fav(&App::open(&config)?, &id, json).await,
        Commands::Share { id, json } => cmd_share(&App::open(&config)?, &id, json).await,
        Commands::Stats { json } => cmd_stats(&App::open(&config)?, json).await,
    }
}
