// CLI module - command-line argument parsing and config handlers
//
// Running with no subcommand starts the TUI. Backend subcommands are
// dispatched to `commands`; configuration management is handled here:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --edit: Open config file in $EDITOR
// - config --update: Merge new defaults into existing config

use crate::catalog::{Category, SortOrder, UseCase};
use crate::config::{Config, VERSION};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::net::SocketAddr;
use std::process::Command;

/// uconf - PC build configurator
#[derive(Parser, Debug)]
#[command(name = "uconf")]
#[command(version = VERSION)]
#[command(about = "Pick compatible PC parts, compare prices, track price drops", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides UCONF_API_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive configurator (default)
    Tui,

    /// List components in a category
    Components {
        #[arg(long)]
        category: Category,
        #[arg(long)]
        usecase: Option<UseCase>,
        #[arg(long)]
        brand: Option<String>,
        /// Case-insensitive name filter
        #[arg(long, default_value = "")]
        search: String,
        /// Sort by minimum price: asc, desc
        #[arg(long)]
        sort: Option<SortOrder>,
    },

    /// Components compatible with a set of already-chosen parts
    Compatible {
        #[arg(long)]
        category: Category,
        /// Component id of a chosen part (repeatable)
        #[arg(long = "with")]
        with: Vec<String>,
        #[arg(long)]
        usecase: Option<UseCase>,
        #[arg(long)]
        brand: Option<String>,
    },

    /// Brands available in a category
    Brands {
        #[arg(long)]
        category: Category,
    },

    /// Known use cases
    Usecases,

    /// Curated builds for a use case
    Usecase { tag: String },

    /// Shop offers for a component (requires login)
    Offers { id: String },

    /// Lowest offer price for a component
    Price { id: String },

    /// Log in and store the token
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Saved builds
    Builds {
        #[command(subcommand)]
        action: BuildsAction,
    },

    /// Get notified when a component's price changes
    Subscribe { id: String },

    /// Stop price alerts for a component
    Unsubscribe { id: String },

    /// Subscription status for components
    Subscriptions {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Price-change notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationsAction,
    },

    /// Ramp virtual users against the catalog endpoints and check thresholds
    Loadtest {
        #[arg(long)]
        base_url: Option<String>,
        /// Multiplier for every stage duration (0.01 for a smoke run)
        #[arg(long, default_value_t = 1.0)]
        time_scale: f64,
    },

    /// Serve the in-memory demo backend
    DemoServer {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Update config with new defaults (preserves user values)
        #[arg(long)]
        update: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BuildsAction {
    /// Your saved builds
    List,
    /// Save the given components as a build
    Save {
        name: String,
        #[arg(long = "with", required = true)]
        with: Vec<String>,
    },
    /// Rename a build and replace its components
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long = "with", required = true)]
        with: Vec<String>,
    },
    /// Delete a saved build
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum NotificationsAction {
    /// All notifications, newest first
    List,
    /// Unread count
    Count,
    /// Mark a notification as read
    Read { id: String },
    /// Poll the unread count until Ctrl-C
    Watch,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config subcommand
// ─────────────────────────────────────────────────────────────────────────────

pub fn handle_config(show: bool, reset: bool, edit: bool, update: bool, path: bool) -> Result<()> {
    if path {
        handle_config_path()
    } else if show {
        handle_config_show();
        Ok(())
    } else if reset {
        handle_config_reset()
    } else if edit {
        handle_config_edit()
    } else if update {
        handle_config_update()
    } else {
        println!("Usage: uconf config [--show|--reset|--edit|--update|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --edit    Open config file in $EDITOR");
        println!("  --update  Update config with new defaults (preserves user values)");
        println!("  --path    Show config file path");
        Ok(())
    }
}

fn config_path() -> Result<std::path::PathBuf> {
    Config::config_path().context("Could not determine config path")
}

fn handle_config_path() -> Result<()> {
    println!("{}", config_path()?.display());
    Ok(())
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() -> Result<()> {
    let path = config_path()?;

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Error creating directory")?;
    }

    std::fs::write(&path, Config::default().to_toml()).context("Error writing config")?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

fn handle_config_edit() -> Result<()> {
    let path = config_path()?;

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening {} with {}", path.display(), editor);

    let status = Command::new(&editor).arg(&path).status().with_context(|| {
        format!("Failed to launch editor '{editor}'. Set $EDITOR to your preferred editor")
    })?;
    if !status.success() {
        bail!("Editor exited with status: {}", status);
    }
    Ok(())
}

fn handle_config_update() -> Result<()> {
    let path = config_path()?;

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
        return Ok(());
    }

    // Regenerate from the effective config so user values survive
    let existing = Config::from_env();
    let updated = existing.to_toml();

    let backup_path = path.with_extension("toml.bak");
    match std::fs::copy(&path, &backup_path) {
        Ok(_) => println!("Backup created: {}", backup_path.display()),
        Err(e) => eprintln!("Warning: Could not create backup: {}", e),
    }

    std::fs::write(&path, updated).context("Error writing config")?;

    println!("Config updated with latest structure: {}", path.display());
    println!("Your values have been preserved.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["uconf"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn components_parses_typed_filters() {
        let cli = Cli::try_parse_from([
            "uconf",
            "components",
            "--category",
            "CPU",
            "--usecase",
            "gaming",
            "--sort",
            "desc",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Components {
                category,
                usecase,
                sort,
                ..
            }) => {
                assert_eq!(category, Category::Cpu);
                assert_eq!(usecase, Some(UseCase::Gaming));
                assert_eq!(sort, Some(SortOrder::PriceDesc));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(Cli::try_parse_from(["uconf", "brands", "--category", "tpu"]).is_err());
    }

    #[test]
    fn compatible_collects_repeated_with() {
        let cli = Cli::try_parse_from([
            "uconf",
            "compatible",
            "--category",
            "motherboard",
            "--with",
            "cpu-1",
            "--with",
            "ram-1",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Compatible { with, .. }) => assert_eq!(with, vec!["cpu-1", "ram-1"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn global_api_url_after_subcommand() {
        let cli =
            Cli::try_parse_from(["uconf", "usecases", "--api-url", "http://x:1"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x:1"));
    }

    #[test]
    fn builds_save_requires_components() {
        assert!(Cli::try_parse_from(["uconf", "builds", "save", "Box"]).is_err());
    }
}
