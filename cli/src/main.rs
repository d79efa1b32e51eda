//! slotup - A/B partition OS updater

use clap::Parser;
use tracing_subscriber::EnvFilter;

use slotup_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,slotup_cli=info,slotup_common=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(e) = cli.run().await {
        match slotup_cli::output::json::format_error(&e) {
            Ok(text) if json => eprintln!("{text}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
