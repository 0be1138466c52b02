mod bootstrap;
mod brief;
mod chat;
mod install;
mod serve;

use anyhow::Result;
use console::style;
use std::path::PathBuf;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::terminal::{self, GuideSection, print_error};
use crate::logging;

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Assistant")
        .command("serve", "Start the HTTP gateway")
        .command("chat", "Talk to the assistant in this terminal")
        .print();

    GuideSection::new("Briefing")
        .command("brief", "Quote, weather and headlines in one go")
        .command("menu", "Pick one item at a time and hear it")
        .print();

    GuideSection::new("Setup")
        .command("init-db", "Create the task and history databases")
        .command("help", "Show this message")
        .blank()
        .text("--config <path>   Config file (default: ./briefly.toml, or $BRIEFLY_CONFIG)")
        .hint("briefly serve --host 0.0.0.0 --port 8000")
        .hint("briefly brief --city Riga --country lv --no-speech")
        .print();

    println!(
        "\n {} {} <command> [flags]\n",
        style("Usage:").bold(),
        style("briefly").green()
    );
}

/// `--config <path>` may appear anywhere on the command line.
pub(crate) fn parse_config_flag(args: &[String]) -> Option<PathBuf> {
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
        i += 1;
    }
    None
}

pub(crate) fn parse_api_server_flags(
    args: &[String],
    start: usize,
    mut api_host: String,
    mut api_port: u16,
) -> (String, u16) {
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                if i + 1 < args.len() {
                    api_port = args[i + 1].parse().unwrap_or(api_port);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--host" => {
                if i + 1 < args.len() {
                    api_host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    (api_host, api_port)
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = match args.get(1) {
        Some(cmd) => cmd.as_str(),
        None => {
            print_help();
            return Ok(());
        }
    };
    if matches!(cmd, "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let config = AppConfig::load(parse_config_flag(&args).as_deref())?;
    let interactive = matches!(cmd, "chat" | "menu");
    logging::init(&config.logging, interactive)?;
    info!("briefly {} starting: {}", env!("CARGO_PKG_VERSION"), cmd);

    match cmd {
        "serve" => {
            let (api_host, api_port) = parse_api_server_flags(
                &args,
                2,
                config.server.host.clone(),
                config.server.port,
            );
            serve::run_serve(&config, api_host, api_port).await
        }
        "chat" => chat::run_chat(&config).await,
        "brief" => brief::run_brief(&config, brief::parse_brief_flags(&args, 2)).await,
        "menu" => brief::run_menu(&config).await,
        "init-db" => install::run_init_db(&config).await,
        _ => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn api_server_flags_override_defaults() {
        let (host, port) = parse_api_server_flags(
            &args(&["briefly", "serve", "--host", "0.0.0.0", "--port", "9100"]),
            2,
            "127.0.0.1".into(),
            8000,
        );
        assert_eq!(host, "0.0.0.0");
        assert_eq!(port, 9100);
    }

    #[test]
    fn bad_port_keeps_configured_port() {
        let (_, port) = parse_api_server_flags(
            &args(&["briefly", "serve", "--port", "http"]),
            2,
            "127.0.0.1".into(),
            8123,
        );
        assert_eq!(port, 8123);
    }

    #[test]
    fn config_flag_is_found_after_the_command() {
        assert_eq!(
            parse_config_flag(&args(&["briefly", "serve", "--config", "/etc/briefly.toml"])),
            Some(PathBuf::from("/etc/briefly.toml"))
        );
        assert_eq!(parse_config_flag(&args(&["briefly", "serve", "--config"])), None);
    }
}
