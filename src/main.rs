// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! ajax-intercept CLI
//!
//! Issues a request through a wired interceptor and prints the record the
//! dashboard would receive.

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use ajax_intercept::{Dashboard, DashboardConfig, RequestLogger, SendArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ajax_intercept=info".parse().unwrap()),
        )
        .init();

    let (args, config_path) = match parse_args(env::args().skip(1)) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            return ExitCode::from(1);
        }
    };
    let config_path = config_path.as_deref();

    if args.is_empty() {
        print_usage();
        return ExitCode::from(1);
    }

    match args[0].as_str() {
        "fetch" => {
            if args.len() < 2 {
                eprintln!("Usage: ajax-intercept fetch <url> [--config <file>]");
                return ExitCode::from(1);
            }
            run_request(config_path, "GET", &args[1], None).await
        }
        "post" => {
            if args.len() < 3 {
                eprintln!("Usage: ajax-intercept post <url> <body> [--config <file>]");
                return ExitCode::from(1);
            }
            run_request(config_path, "POST", &args[1], Some(args[2].clone())).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("ajax-intercept {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"ajax-intercept - Transparent XHR traffic interception

USAGE:
    ajax-intercept <COMMAND> [OPTIONS]

COMMANDS:
    fetch <url>           GET a URL through the interceptor
    post <url> <body>     POST a body through the interceptor
    help                  Show this help message
    version               Show version information

OPTIONS:
    --config <file>       Dashboard config.json (interceptor and http sections)
    --                    Treat everything after this as positional

EXAMPLES:
    ajax-intercept fetch https://example.com/api/status
    ajax-intercept post https://example.com/api/items '{{"name":"widget"}}'
    ajax-intercept --config config.json post https://example.com/echo -- --config
    RUST_LOG=ajax_intercept=debug ajax-intercept fetch https://example.com --config config.json
"#
    );
}

/// Split argv into positional arguments and the `--config` path. The
/// option may appear anywhere before a `--` separator.
fn parse_args<I>(args: I) -> Result<(Vec<String>, Option<String>), String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut positional = Vec::new();
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--" => {
                positional.extend(args.by_ref());
                break;
            }
            "--config" => match args.next() {
                Some(path) => config = Some(path),
                None => return Err("--config requires a file path".to_string()),
            },
            _ => positional.push(arg),
        }
    }

    Ok((positional, config))
}

async fn run_request(
    config_path: Option<&str>,
    method: &str,
    url: &str,
    body: Option<String>,
) -> ExitCode {
    let config = match config_path {
        Some(path) => match DashboardConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::from(1);
            }
        },
        None => DashboardConfig::default(),
    };
    let wait = Duration::from_secs(config.http.timeout_secs.saturating_add(5));

    let mut dashboard = match Dashboard::from_config(&config) {
        Ok(d) => d.with_logging(RequestLogger::default()),
        Err(e) => {
            eprintln!("Failed to start interceptor: {}", e);
            return ExitCode::from(1);
        }
    };

    let xhr = dashboard.new_request();
    if let Err(e) = xhr.open(method, url) {
        eprintln!("Failed to open request: {}", e);
        return ExitCode::from(1);
    }

    let args = match body {
        Some(body) => SendArgs::with_body(body),
        None => SendArgs::empty(),
    };
    if let Err(e) = xhr.send(args) {
        eprintln!("Failed to send request: {}", e);
        return ExitCode::from(1);
    }

    let record = match tokio::time::timeout(wait, dashboard.next_record()).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            eprintln!("Record channel closed before the request completed");
            return ExitCode::from(1);
        }
        Err(_) => {
            eprintln!("Timed out after {}s waiting for {}", wait.as_secs(), url);
            return ExitCode::from(1);
        }
    };

    match serde_json::to_string_pretty(&record) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to encode record: {}", e);
            return ExitCode::from(1);
        }
    }

    if let Err(e) = dashboard.shutdown() {
        eprintln!("Failed to detach observers: {}", e);
    }

    if let Some(error) = xhr.error() {
        eprintln!("Request failed: {}", error);
        return ExitCode::from(2);
    }

    if record.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
