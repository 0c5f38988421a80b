mod control;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use common::command::parse_command;
use common::config::AppConfig;
use common::error_inject::Provider;
use common::models::InjectionState;
use proxy::provider::UpstreamHosts;
use proxy::ProxyState;
use std::time::Duration;

#[derive(Parser, Clone)]
#[command(
    name = "provider-error-proxy",
    about = "Proxy to LLM providers that can inject provider-shaped errors on demand"
)]
pub struct Args {
    #[arg(long, default_value = "8888")]
    pub port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Initial error mode command (e.g. "c 3", "r 30%", "u *", "n").
    #[arg(long)]
    pub mode: Option<String>,

    /// Disable the stdin control channel (background/automated mode).
    #[arg(long)]
    pub no_stdin: bool,

    #[arg(long, default_value = "error-proxy.toml")]
    pub config: String,
}

fn print_banner(args: &Args) {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("Provider Error Proxy");
    println!("{}", rule);
    println!("Port: {}", args.port);
    println!();
    println!("To route a client through the proxy, set these environment variables:");
    for provider in Provider::ALL {
        println!(
            "  export {}=http://localhost:{}",
            provider.client_host_env(),
            args.port
        );
    }
    println!("{}", rule);
}

fn print_initial_mode(state: &InjectionState) {
    println!();
    println!("Initial mode set from command-line arguments:");
    println!("  Mode: {}", state.mode);
    if state.percentage > 0.0 {
        println!("  Percentage: {:.0}%", state.percentage * 100.0);
    } else if state.remaining > 0 {
        println!("  Count: {}", state.remaining);
    }
    println!();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    let initial = match args.mode.as_deref() {
        Some(command) => parse_command(command).with_context(|| {
            format!(
                "Error parsing --mode argument '{}' (example usage: --mode \"c 3\" or --mode \"r 30%\")",
                command
            )
        })?,
        None => InjectionState::default(),
    };

    print_banner(&args);
    if args.mode.is_some() {
        print_initial_mode(&initial);
    }

    let hosts = UpstreamHosts::from_env(&config.real_hosts);
    for provider in Provider::ALL {
        if let Some(host) = hosts.get(provider) {
            log::info!("{} upstream: {}", provider, host);
        }
    }

    let state = web::Data::new(ProxyState::new(initial, hosts));
    let client = web::Data::new(proxy::build_client(Duration::from_secs(
        config.request_timeout_secs,
    ))?);

    let state_data = state.clone();
    let client_data = client.clone();
    let max_body_bytes = config.max_body_bytes;
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .app_data(state_data.clone())
            .app_data(client_data.clone())
            .default_service(web::to(proxy::proxy_handler))
    })
    .shutdown_timeout(config.shutdown_timeout_secs)
    .bind((args.host.as_str(), args.port))
    .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?
    .run();

    if args.no_stdin {
        println!("Running in no-stdin mode (background/automated)");
        println!("Use SIGINT (Ctrl+C) or SIGTERM to stop the proxy");
        println!();
    } else {
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        control::spawn_stdin_reader(state.clone().into_inner(), shutdown_tx)
            .context("Failed to start stdin reader")?;
        let handle = server.handle();
        actix_web::rt::spawn(async move {
            if shutdown_rx.await.is_ok() {
                handle.stop(true).await;
            }
        });
    }

    log::info!("Proxy running on http://{}:{}", args.host, args.port);
    server.await?;

    drop(client);
    log::info!("Upstream client closed");
    Ok(())
}
