//! GitLab CLI - call any GitLab REST endpoint from the terminal.
//!
//! `gitlab <method> [args...] [key:value...]` looks the method up in the
//! endpoint table, fills its path placeholders from the positional arguments
//! and sends the `key:value` pairs as parameters. The JSON result is printed
//! on stdout.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use tracing::debug;

use gl_core::logging::{self, LogFilter};

/// GitLab REST API client.
#[derive(Parser)]
#[command(
    name = "gitlab",
    version,
    about = "GitLab REST API client",
    long_about = "Call any GitLab REST endpoint by name.\n\
                  Example: gitlab get-project-issue group/project 42\n\
                  Example: gitlab create-project-issue 7 title:\"Login broken\" labels:bug"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command. Flags override environment variables,
/// which override the config file.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Path to the configuration file (TOML, or JSON with a .json extension).
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// GitLab instance URL, e.g. https://gitlab.com.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Private token, sent as Private-Token.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// OAuth access token, sent as Authorization: Bearer.
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Perform the call as another user (admin only).
    #[arg(long, global = true)]
    pub sudo: Option<String>,

    /// Retries after a 5xx or 429 response.
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Wait between retries, in milliseconds.
    #[arg(long, global = true)]
    pub retry_wait_ms: Option<u64>,

    /// API version (v3 or v4).
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// YAML endpoint table to use instead of the bundled one.
    #[arg(long, global = true)]
    pub endpoint_table: Option<String>,

    /// Enable verbose logging (debug level, overriding RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Fetch every page of a list endpoint.
    #[arg(short, long, global = true)]
    pub all: bool,

    /// Pretty-print JSON output.
    #[arg(short, long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the endpoints known to the client.
    #[command(alias = "list-endpoints")]
    Endpoints {
        /// Only show endpoints whose name or path contains this text.
        filter: Option<String>,
    },
    /// Call an endpoint: <method> [args...] [key:value...]
    ///
    /// Flags must come before the method name.
    #[command(external_subcommand)]
    Call(Vec<String>),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> gl_core::GlResult<()> {
    let config = commands::load_config(&cli.global)?;

    let filter = if cli.global.verbose {
        LogFilter::Forced("debug")
    } else {
        LogFilter::Default(config.logging.level.as_str())
    };
    let _guard = match config.log_dir() {
        Some(dir) => Some(logging::init_logging(filter, &dir, config.logging.json_output)?),
        None => {
            logging::init_console_logging(filter);
            None
        }
    };

    debug!("GitLab CLI v{}", gl_core::constants::APP_VERSION);

    match cli.command {
        Commands::Endpoints { filter } => {
            commands::endpoints::run(&config, &cli.global, filter.as_deref())
        }
        Commands::Call(tokens) => commands::call::run(&config, &cli.global, &tokens).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_external_method_collects_trailing_tokens() {
        let cli = Cli::try_parse_from([
            "gitlab",
            "--retries",
            "2",
            "get-project-issue",
            "group/proj",
            "42",
        ])
        .unwrap();
        assert_eq!(cli.global.retries, Some(2));
        match cli.command {
            Commands::Call(tokens) => {
                assert_eq!(tokens, vec!["get-project-issue", "group/proj", "42"]);
            }
            Commands::Endpoints { .. } => panic!("parsed as endpoints"),
        }
    }

    #[test]
    fn test_flags_after_method_stay_with_the_call() {
        let cli = Cli::try_parse_from(["gitlab", "get-project", "1", "--pretty"]).unwrap();
        assert!(!cli.global.pretty);
        match cli.command {
            Commands::Call(tokens) => {
                let err = commands::args::parse_invocation(&tokens).unwrap_err();
                assert!(err.to_string().contains("--pretty"));
            }
            Commands::Endpoints { .. } => panic!("parsed as endpoints"),
        }
    }

    #[test]
    fn test_list_endpoints_alias() {
        let cli = Cli::try_parse_from(["gitlab", "list-endpoints", "issue"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Endpoints { filter: Some(ref f) } if f == "issue"
        ));
    }
}
