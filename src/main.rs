use std::env;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "feedrag=info".into()))
        .init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = feedrag::api::run_http_server(port).await {
            tracing::error!(error = %e, "server error");
            std::process::exit(1);
        }
        return;
    }

    match feedrag::api::run_cli(raw_args) {
        Ok(report) => print!("{report}"),
        Err(feedrag::api::CliError::Args(e)) => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: feedrag serve [port] | feedrag [--starting-capital N] [--annual-return PCT] [--years N] [--annual-fee PCT] [--locale en-US|it-IT]");
            std::process::exit(1);
        }
    }
}
