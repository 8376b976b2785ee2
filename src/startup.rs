// Startup module - banner and configuration summary
//
// Printed before the demo backend starts serving, and mirrored into the
// log strip when the TUI starts.

use crate::config::{Config, VERSION};
use std::net::SocketAddr;

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const MAGENTA: &str = "\x1b[35m";
}

/// One line of the settings summary
struct Setting {
    name: &'static str,
    value: String,
}

fn settings(config: &Config) -> Vec<Setting> {
    vec![
        Setting {
            name: "backend",
            value: config.api_url.clone(),
        },
        Setting {
            name: "timeout",
            value: format!("{}s", config.request_timeout_secs),
        },
        Setting {
            name: "poll",
            value: format!("every {}s", config.poll_interval_secs),
        },
        Setting {
            name: "log files",
            value: match &config.logging.file {
                Some(file) => format!("{} ({})", file.dir.display(), file.rotation.name()),
                None => "off".to_string(),
            },
        },
    ]
}

/// Print the banner for the demo backend
pub fn print_demo_banner(config: &Config, addr: SocketAddr) {
    use colors::*;

    println!();
    println!("  {BOLD}{CYAN}uconf demo backend{RESET} {DIM}v{VERSION}{RESET}");
    println!("  {DIM}In-memory catalog, accounts and price alerts{RESET}");
    println!();

    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("  {DIM}Config:{RESET} {GREEN}✓{RESET} {}", path.display());
        } else {
            println!("  {DIM}Config:{RESET} {DIM}(using defaults){RESET}");
        }
    }
    println!(
        "  {DIM}Demo login:{RESET} {} / {}",
        crate::demo::DEMO_EMAIL,
        crate::demo::DEMO_PASSWORD
    );
    println!();
    println!("  {MAGENTA}▸{RESET} Listening on {BOLD}http://{addr}{RESET}");
    println!("  {DIM}Point the client at it with UCONF_API_URL=http://{addr}{RESET}");
    println!();
}

/// Startup summary for the TUI log strip
pub fn log_startup(config: &Config) {
    tracing::info!("uconf v{}", VERSION);
    for setting in settings(config) {
        tracing::info!("  {:<10} {}", setting.name, setting.value);
    }
    tracing::info!("Ready. Press ? for help.");
}
