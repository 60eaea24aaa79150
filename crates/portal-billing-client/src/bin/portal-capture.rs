#![allow(clippy::print_stdout)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use portal_billing_client::{BillingClient, BillingClientConfig};
use portal_client_core::config::{
    ENV_LOG_FILTER, clamp_capture_timeout, resolve_api_base_url, resolve_capture_timeout,
    resolve_log_filter,
};
use portal_client_core::console::{SessionIdentity, console_title};
use portal_client_core::finalization::{FinalizationController, FinalizationStatus};
use portal_client_core::presentation::{ConsoleView, FinalizationView};
use portal_client_core::route::{QueryParams, ShellRoute, TOKEN_QUERY_KEY};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "portal-capture")]
#[command(about = "Operator smoke tests for the portal billing return and console routes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one capture round trip for an order token.
    Finalize(FinalizeArgs),
    /// Parse a shell location and print what the client would render.
    Route(RouteArgs),
}

#[derive(Args)]
struct FinalizeArgs {
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Args)]
struct RouteArgs {
    #[arg(long)]
    path: String,
    #[arg(long, default_value = "")]
    query: String,
}

/// What `route` prints for one location.
#[derive(Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
enum RouteReport {
    Console { title: String, view: ConsoleView },
    CaptureReturn { view: FinalizationView },
    Other { path: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(resolve_log_filter()))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(filter_env = ENV_LOG_FILTER, "logging initialised");

    let cli = Cli::parse();
    match cli.command {
        Commands::Finalize(args) => finalize(args).await,
        Commands::Route(args) => route(&args),
    }
}

async fn finalize(args: FinalizeArgs) -> Result<ExitCode> {
    let base_url = match args.api_base {
        Some(base_url) => base_url,
        None => resolve_api_base_url().context("resolve capture base url")?.0,
    };
    let timeout = match args.timeout_ms {
        Some(timeout_ms) => clamp_capture_timeout(timeout_ms),
        None => resolve_capture_timeout().context("resolve capture timeout")?,
    };
    let mut config = BillingClientConfig::new(base_url);
    config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let client = BillingClient::new(config).context("build billing client")?;

    let query = match args.token.as_deref() {
        Some(token) => format!("{TOKEN_QUERY_KEY}={}", urlencoding::encode(token)),
        None => String::new(),
    };
    let mut controller = FinalizationController::mount(&QueryParams::parse(&query));
    controller.run(&client).await;

    let view = controller.view();
    println!(
        "{}",
        serde_json::to_string_pretty(&view).context("encode finalization view")?
    );
    Ok(if view.status == FinalizationStatus::Success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn route(args: &RouteArgs) -> Result<ExitCode> {
    let report = route_report(&args.path, &args.query);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("encode route view")?
    );
    Ok(ExitCode::SUCCESS)
}

fn route_report(path: &str, query: &str) -> RouteReport {
    let query = QueryParams::parse(query);
    match &ShellRoute::from_path(path) {
        ShellRoute::Console { session_id } => {
            let identity = SessionIdentity::from_route(session_id.as_deref(), &query);
            RouteReport::Console {
                title: console_title(identity.label.as_deref()),
                view: identity.console_view(),
            }
        }
        ShellRoute::CaptureReturn => RouteReport::CaptureReturn {
            view: FinalizationController::mount(&query).view(),
        },
        other => RouteReport::Other {
            path: other.to_path(),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn report_json(path: &str, query: &str) -> Value {
        serde_json::to_value(route_report(path, query)).expect("serialize report")
    }

    #[test]
    fn console_report_carries_title_and_binding() {
        let report = report_json("/console/sess-7", "label=build%20box");

        assert_eq!(report["route"], "console");
        assert_eq!(report["title"], "build box \u{b7} SSH Console");
        assert_eq!(report["view"]["kind"], "active");
        assert_eq!(report["view"]["binding"]["session_id"], "sess-7");
    }

    #[test]
    fn capture_report_without_token_is_an_error_view() {
        let report = report_json("/billing/return", "");

        assert_eq!(report["route"], "capture_return");
        assert_eq!(report["view"]["status"], "error");
    }

    #[test]
    fn other_routes_report_their_path() {
        assert_eq!(
            report_json("/dashboard", ""),
            json!({ "route": "other", "path": "/dashboard" })
        );
    }
}
