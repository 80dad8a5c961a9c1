// Copyright 2025 fbarpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # FBA CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Queue flux balance analysis, writing to the given workspace
//! fba runfba iJO1366 -w alice:home --media Carbon-D-Glucose --fva
//!
//! # Queue gap-filling with three solutions
//! fba gapfill iJO1366 -w alice:home --numsolutions 3
//!
//! # Test the reactions of a gap-filling solution
//! fba rxnsensitivity iJO1366 -w alice:home --gapfillsolution gf.0.gfsol.1
//!
//! # Check on a job
//! fba checkjob job.1
//!
//! # Make a raw call (outputs the JSON result)
//! fba call version
//!
//! # Run the server
//! fba serve --bind 0.0.0.0:7036
//! ```
//!
//! ## Environment
//!
//! - `FBA_URL`: service URL when `--url` is not given
//! - `KB_AUTH_TOKEN`: token sent with every call
//! - `FBA_WORKSPACE`: workspace when `-w` is not given
//! - `KB_DEPLOYMENT_CONFIG`, `KB_SERVICE_NAME`: server configuration for `serve`

use anyhow::Result;
use argh::FromArgs;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use fbarpc_cli::scripts::{
    default_workspace, queued_message, status_message, CheckJobArgs, GapfillArgs, RunFbaArgs,
    RxnSensitivityArgs, Script,
};
use fbarpc_client::FbaClient;
use fbarpc_server::config::SERVICE_NAME_ENV;
use fbarpc_server::{FbaModelServices, HttpServer, JobQueue, ServerConfig, ServiceRouter};
use fbarpc_common::protocol::SERVICE_MODULE;

const DEFAULT_URL: &str = "http://127.0.0.1:7036";
const URL_ENV: &str = "FBA_URL";
const TOKEN_ENV: &str = "KB_AUTH_TOKEN";
const WORKSPACE_ENV: &str = "FBA_WORKSPACE";

#[derive(FromArgs)]
/// FBA model service scripts
struct Cli {
    /// service URL (default: FBA_URL, then http://127.0.0.1:7036)
    #[argh(option)]
    url: Option<String>,

    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Runfba(RunFbaArgs),
    Gapfill(GapfillArgs),
    RxnSensitivity(RxnSensitivityArgs),
    CheckJob(CheckJobArgs),
    Call(CallArgs),
    Serve(ServeArgs),
}

/// Arguments for making a single raw call.
///
/// The result is printed as raw JSON so it can be piped to `jq`.
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call a service method and print the raw JSON result
struct CallArgs {
    /// method name, without the module prefix
    #[argh(positional)]
    method: String,

    /// JSON array of positional arguments; a single object is sent as one argument
    #[argh(option, short = 'a', long = "args", default = "\"[]\".into()")]
    args: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// run the JSON-RPC dispatch server
struct ServeArgs {
    /// address to bind, overriding the deployment config
    #[argh(option, short = 'b')]
    bind: Option<String>,

    /// INI deployment config (default: KB_DEPLOYMENT_CONFIG)
    #[argh(option, short = 'c')]
    config: Option<String>,
}

/// Validates that a URL string starts with http://
fn validate_http_url(url: &str) -> Result<()> {
    if url.starts_with("https://") {
        Err(anyhow::anyhow!(
            "Invalid service URL: '{}' uses https, which is not supported; use an http:// endpoint",
            url
        ))
    } else if url.starts_with("http://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid service URL: '{}' must start with http://",
            url
        ))
    }
}

fn resolve_url(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var(URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parses `--args`: a JSON array is spread into positional arguments, any
/// other value becomes the only argument.
fn parse_call_args(raw: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in args: {}", e))?;
    Ok(match value {
        Value::Array(args) => args,
        other => vec![other],
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Scripts keep stdout for their one-line result, so only the server logs.
    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        command => run_script(resolve_url(cli.url), command).await,
    }
}

async fn run_script(url: String, command: Commands) -> Result<()> {
    validate_http_url(&url)?;
    let token = env_var(TOKEN_ENV);
    let workspace = env_var(WORKSPACE_ENV);

    let mut client = FbaClient::new(url)?;
    if let Some(token) = &token {
        client = client.with_token(token.clone());
    }
    let token = token.as_deref();

    let line = match command {
        Commands::Runfba(mut args) => {
            default_workspace(&mut args.workspace, workspace);
            let job = client.queue_runfba(&args.build_params(token)?).await?;
            queued_message(RunFbaArgs::LABEL, &job)
        }
        Commands::Gapfill(mut args) => {
            default_workspace(&mut args.workspace, workspace);
            let job = client.queue_gapfill_model(&args.build_params(token)?).await?;
            queued_message(GapfillArgs::LABEL, &job)
        }
        Commands::RxnSensitivity(mut args) => {
            default_workspace(&mut args.workspace, workspace);
            let params = args.build_params(token)?;
            let job = client.queue_reaction_sensitivity_analysis(&params).await?;
            queued_message(RxnSensitivityArgs::LABEL, &job)
        }
        Commands::CheckJob(args) => {
            let job = client.check_job(&args.build_params(token)?).await?;
            status_message(&job)
        }
        Commands::Call(args) => {
            let result = client.call(&args.method, parse_call_args(&args.args)?).await?;
            serde_json::to_string(&result)?
        }
        Commands::Serve(_) => return Err(anyhow::anyhow!("serve is not a script command")),
    };

    println!("{}", line);
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            let service_name =
                std::env::var(SERVICE_NAME_ENV).unwrap_or_else(|_| SERVICE_MODULE.to_string());
            ServerConfig::load(Some(Path::new(path)), &service_name)?
        }
        None => ServerConfig::from_env()?,
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    // RUST_LOG wins over the deployment config.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let addr = config.bind_addr()?;
    tracing::info!("Starting {} on {}", config.service_name, addr);

    let jobs = Arc::new(JobQueue::with_max_jobs(config.max_jobs));
    let router = ServiceRouter::new().with_module(Arc::new(FbaModelServices::new(jobs)));
    HttpServer::new(router, config).run(addr).await?;

    Ok(())
}

/// CLI argument parsing tests.
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_parse_runfba() {
        let cli: Cli = Cli::from_args(
            &["fba"],
            &["runfba", "iJO1366", "-w", "alice:home", "--media", "Complete", "--fva", "--minimize"],
        )
        .unwrap();
        assert!(cli.url.is_none());
        match cli.command {
            Commands::Runfba(args) => {
                assert_eq!(args.model, "iJO1366");
                assert_eq!(args.workspace.as_deref(), Some("alice:home"));
                assert_eq!(args.media.as_deref(), Some("Complete"));
                assert!(args.fva);
                assert!(args.minimize);
                assert!(!args.simulateko);
            }
            _ => panic!("Expected Runfba command"),
        }
    }

    #[test]
    fn test_cli_parse_url_before_subcommand() {
        let cli: Cli =
            Cli::from_args(&["fba"], &["--url", "http://127.0.0.1:9000", "checkjob", "job.3"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://127.0.0.1:9000"));
        match cli.command {
            Commands::CheckJob(CheckJobArgs { jobid }) => assert_eq!(jobid, "job.3"),
            _ => panic!("Expected CheckJob command"),
        }
    }

    #[test]
    fn test_cli_parse_gapfill() {
        let cli: Cli = Cli::from_args(
            &["fba"],
            &["gapfill", "m", "--numsolutions", "3", "--timelimit", "600", "--integrate"],
        )
        .unwrap();
        match cli.command {
            Commands::Gapfill(args) => {
                assert_eq!(args.num_solutions, Some(3));
                assert_eq!(args.total_time_limit, Some(600));
                assert!(args.integrate);
                assert!(args.workspace.is_none());
            }
            _ => panic!("Expected Gapfill command"),
        }
    }

    #[test]
    fn test_cli_parse_rxnsensitivity() {
        let cli: Cli = Cli::from_args(
            &["fba"],
            &["rxnsensitivity", "m", "--rxnstotest", "rxn00001;rxn00002", "--type", "knockout"],
        )
        .unwrap();
        match cli.command {
            Commands::RxnSensitivity(args) => {
                assert_eq!(args.reactions_to_test.as_deref(), Some("rxn00001;rxn00002"));
                assert_eq!(args.kind.as_deref(), Some("knockout"));
                assert!(!args.delete_noncontributing);
            }
            _ => panic!("Expected RxnSensitivity command"),
        }
    }

    #[test]
    fn test_cli_parse_call_default_args() {
        let cli: Cli = Cli::from_args(&["fba"], &["call", "version"]).unwrap();
        match cli.command {
            Commands::Call(CallArgs { method, args }) => {
                assert_eq!(method, "version");
                assert_eq!(args, "[]");
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_cli_parse_serve() {
        let cli: Cli = Cli::from_args(&["fba"], &["serve", "-b", "127.0.0.1:7100"]).unwrap();
        match cli.command {
            Commands::Serve(ServeArgs { bind, config }) => {
                assert_eq!(bind.as_deref(), Some("127.0.0.1:7100"));
                assert!(config.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_requires_model() {
        assert!(Cli::from_args(&["fba"], &["runfba"]).is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("http://127.0.0.1:7036").is_ok());
        assert!(validate_http_url("127.0.0.1:7036").is_err());
        let err = validate_http_url("https://kbase.us/services/fba").unwrap_err();
        assert!(err.to_string().contains("https"));
    }

    #[test]
    fn test_parse_call_args() {
        assert_eq!(parse_call_args("[]").unwrap(), Vec::<Value>::new());
        assert_eq!(
            parse_call_args(r#"[{"jobid": "job.1"}]"#).unwrap(),
            vec![json!({"jobid": "job.1"})]
        );
        assert_eq!(
            parse_call_args(r#"{"jobid": "job.1"}"#).unwrap(),
            vec![json!({"jobid": "job.1"})]
        );
        assert!(parse_call_args("{oops").is_err());
    }
}
