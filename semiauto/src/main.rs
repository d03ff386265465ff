mod cli;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use semiauto_core::{
    Session,
    config::{self, Config},
    transport::{ReplyPath, WebSocketTransport},
};
use semiauto_tui::{Theme, Ui};
use std::{path::PathBuf, process::ExitCode, sync::mpsc};

#[derive(Parser)]
#[command(
    version,
    about = "Operator client for semi-automated device certification runs"
)]
struct Cli {
    /// Override path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host of the test runner
    #[arg(long)]
    host: Option<String>,

    /// Port of the test runner
    #[arg(long)]
    port: Option<u16>,

    /// Websocket path on the runner
    #[arg(long)]
    path: Option<String>,

    /// Send each reply over its own short-lived connection
    #[arg(long)]
    per_answer: bool,

    /// Log level for the log file (off, error, warn, info, debug, trace)
    #[arg(long, default_value = logging::DEFAULT_LOG_LEVEL, value_parser = parse_log_level)]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a recorded transcript through a session and print the result
    Replay {
        /// JSON-lines file of runner messages; `> text` answers and `>!`
        /// cancels the open prompt
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_errors = command_wants_json(cli.command.as_ref());

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(mut config) => {
            apply_overrides(&mut config, &cli);
            config
        }
        Err(error) => {
            let cli_error = crate::cli::CliError::system(format!("{error:#}"));
            crate::cli::print_error(&cli_error, json_errors);
            return ExitCode::from(2);
        }
    };

    if let Err(error) = logging::setup_logging(cli.log_level) {
        eprintln!("warning: could not set up logging: {error}");
    }

    let result = match cli.command {
        Some(Commands::Replay { file, json }) => {
            let args = crate::cli::ReplayArgs { file, json };
            crate::cli::cmd_replay(&config, &args)
        }
        None => run_tui(&config).map_err(crate::cli::CliError::from),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(error) => {
            crate::cli::print_error(&error, json_errors);
            let code: u8 = match error.code() {
                1 => 1,
                _ => 2,
            };
            ExitCode::from(code)
        }
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(path) = &cli.path {
        config.server.path.clone_from(path);
    }
    if cli.per_answer {
        config.protocol.reply_path = ReplyPath::PerAnswer;
    }
}

fn run_tui(config: &Config) -> Result<()> {
    let endpoint = config.server.endpoint();
    log::info!("connecting to {endpoint}");

    let (tx, rx) = mpsc::channel();
    let transport = WebSocketTransport::new(endpoint.clone(), config.protocol.reply_path, tx);
    let mut session = Session::new(transport, config.protocol.dialect);

    let theme = Theme::from_config(&config.theme);
    let ui = Ui {
        endpoint: &endpoint,
        theme: &theme,
        keys: &config.keys,
    };

    let mut terminal = if should_disable_alt_screen() {
        // Inline viewport keeps drawing in the primary screen buffer, which makes
        // the output capturable by tmux for automation/debugging.
        ratatui::init_with_options(ratatui::TerminalOptions {
            viewport: ratatui::Viewport::Inline(30),
        })
    } else {
        ratatui::init()
    };
    let result = semiauto_tui::run(&mut terminal, &mut session, &rx, &ui);
    ratatui::restore();
    result
}

fn parse_log_level(value: &str) -> Result<log::LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("unknown log level '{value}'"))
}

fn command_wants_json(command: Option<&Commands>) -> bool {
    match command {
        Some(Commands::Replay { json, .. }) => *json,
        None => false,
    }
}

fn should_disable_alt_screen() -> bool {
    match std::env::var("SEMIAUTO_NO_ALT_SCREEN") {
        Ok(value) => {
            let value = value.trim().to_ascii_lowercase();
            !matches!(value.as_str(), "" | "0" | "false" | "no" | "off")
        }
        Err(_) => false,
    }
}
