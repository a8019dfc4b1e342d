// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Agency CLI - Stateful HTTP Agent
//!
//! Example usage and demonstration of the agency library.

use std::env;
use std::process::ExitCode;

use agency::{Agent, AgentConfig};
use reqwest::Method;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agency=info".parse().expect("static directive")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "fetch" => match FetchArgs::parse(&args[2..]) {
            Ok(fetch) => fetch_urls(fetch).await,
            Err(msg) => {
                eprintln!("{}", msg);
                eprintln!("Usage: agency fetch <url>... [--method M] [--redirects N]");
                ExitCode::from(1)
            }
        },
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("agency {}", agency::VERSION);
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
        r#"Agency - Stateful HTTP Agent

USAGE:
    agency <COMMAND> [OPTIONS]

COMMANDS:
    fetch <url>...  Fetch URLs in order with one agent, sharing its cookies
    help            Show this help message
    version         Show version information

OPTIONS (fetch):
    --method <M>     HTTP method for every request (default GET)
    --redirects <N>  Redirect budget per request (default 5, 0 = never follow)

EXAMPLES:
    agency fetch http://localhost:3000/
    agency fetch http://localhost:3000/signin http://localhost:3000/dashboard --method POST
    agency fetch http://localhost:3000/ --redirects 0
"#
    );
}

struct FetchArgs {
    urls: Vec<String>,
    method: Method,
    redirects: Option<u32>,
}

impl FetchArgs {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut fetch = FetchArgs {
            urls: Vec::new(),
            method: Method::GET,
            redirects: None,
        };

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--method" => {
                    let value = iter.next().ok_or("--method needs a value")?;
                    fetch.method = Method::from_bytes(value.to_uppercase().as_bytes())
                        .map_err(|_| format!("Invalid method: {}", value))?;
                }
                "--redirects" => {
                    let value = iter.next().ok_or("--redirects needs a value")?;
                    fetch.redirects = Some(
                        value
                            .parse()
                            .map_err(|_| format!("Invalid redirect budget: {}", value))?,
                    );
                }
                url => fetch.urls.push(url.to_string()),
            }
        }

        if fetch.urls.is_empty() {
            return Err("No URL given".to_string());
        }
        Ok(fetch)
    }
}

async fn fetch_urls(fetch: FetchArgs) -> ExitCode {
    let mut config = AgentConfig::default();
    if let Some(max) = fetch.redirects {
        config = config.max_redirects(max);
    }

    let agent = match Agent::with_config(config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to create agent: {}", e);
            return ExitCode::from(1);
        }
    };

    for url in &fetch.urls {
        println!("{} {}", fetch.method, url);

        let response = match agent.request(fetch.method.clone(), url).send().await {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Request failed: {}", e);
                return ExitCode::from(1);
            }
        };

        println!("  Status: {}", response.status);
        for hop in response.redirects() {
            println!("  Redirected to: {}", hop);
        }
        if let Some(location) = response.location() {
            println!("  Location (not followed): {}", location);
        }
        println!("  Body: {} bytes ({} ms)", response.body.len(), response.response_time_ms);
    }

    println!("\nCookie jar:");
    for cookie in agent.jar().cookies() {
        println!(
            "  {}={} (domain={}{}, path={}{}{})",
            cookie.name,
            cookie.value,
            cookie.domain,
            if cookie.host_only { ", host-only" } else { "" },
            cookie.path,
            if cookie.secure { ", secure" } else { "" },
            if cookie.http_only { ", httponly" } else { "" },
        );
    }

    ExitCode::SUCCESS
}
