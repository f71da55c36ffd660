use clap::Parser;
use tracing_subscriber::EnvFilter;

use holdem_client::controller::GameConfig;

mod client;
mod tui;

#[derive(Parser)]
#[command(name = "holdem")]
#[command(about = "Connect to a holdem table", long_about = None)]
struct Cli {
    /// WebSocket server URL
    #[arg(short, long, default_value = "ws://127.0.0.1:5000")]
    server: String,

    /// Player display name
    #[arg(short, long)]
    name: String,

    /// Game code to join
    #[arg(short, long, conflicts_with = "create")]
    code: Option<String>,

    /// Create a new game instead of joining one
    #[arg(long)]
    create: bool,

    /// Total seats when creating (humans + bots)
    #[arg(long, default_value_t = 4)]
    players: u32,

    /// Human seats when creating
    #[arg(long, default_value_t = 1)]
    humans: u32,

    /// Starting chips per player when creating
    #[arg(long, default_value_t = 1000)]
    chips: u32,

    /// Bet limit when creating
    #[arg(long, default_value_t = 100)]
    bet_limit: u32,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Respects RUST_LOG; quiet by default so the TUI stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let entry = if cli.create {
        client::Entry::Create(GameConfig {
            player_count: cli.players,
            human_count: cli.humans,
            chips_per_player: cli.chips,
            bet_limit: cli.bet_limit,
        })
    } else if let Some(code) = cli.code.clone() {
        client::Entry::Join(code)
    } else {
        eprintln!("Specify --code <CODE> to join a game, or --create to host one.");
        std::process::exit(2);
    };

    if let Err(e) = client::start_client(&cli.server, &cli.name, entry).await {
        eprintln!("Error: {}", e);
    }
}
