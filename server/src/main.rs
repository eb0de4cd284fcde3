use clap::Parser;
use log::info;
use server::network::Server;
use server::responder::QueryResponder;
use server::state::SharedQueryState;
use shared::QueryState;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the query socket to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on for queries
    #[arg(short, long, default_value = "7779")]
    port: u16,

    /// Number of datagram worker tasks
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Advertised server name
    #[arg(long, default_value = "sqp-server")]
    name: String,

    /// Advertised game type
    #[arg(long, default_value = "deathmatch")]
    game_type: String,

    /// Advertised map name
    #[arg(long, default_value = "lobby")]
    map: String,

    /// Advertised player capacity
    #[arg(long, default_value = "16")]
    max_players: i32,

    /// Advertised game port (defaults to the query port)
    #[arg(long)]
    game_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let state = Arc::new(SharedQueryState::new(QueryState {
        current_players: 0,
        max_players: args.max_players,
        server_name: args.name.clone(),
        game_type: args.game_type.clone(),
        map_name: args.map.clone(),
        port: args.game_port.unwrap_or(args.port),
    }));

    let responder = Arc::new(QueryResponder::new(Arc::clone(&state)));
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, responder).await?;

    info!(
        "Advertising \"{}\" ({}, map {}, {} slots)",
        args.name, args.game_type, args.map, args.max_players
    );

    tokio::select! {
        _ = server.run(args.workers) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
