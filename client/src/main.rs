use clap::Parser;
use client::network::Client;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to query
    #[arg(short = 's', long, default_value = "127.0.0.1:7779")]
    server: String,

    /// Only validate the handshake, skip the server info chunk
    #[arg(long)]
    no_server_info: bool,

    /// Receive timeout in milliseconds
    #[arg(short, long, default_value = "1000")]
    timeout: u64,

    /// Print the server info as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Querying {}", args.server);
    let client = Client::connect(&args.server, Duration::from_millis(args.timeout)).await?;
    let result = client.query(!args.no_server_info).await?;

    match result.server_info {
        Some(info) if args.json => println!("{}", serde_json::to_string_pretty(&info)?),
        Some(info) => {
            println!("{} [{}] on {}", info.server_name, info.game_type, info.map_name);
            println!("players: {}/{}", info.current_players, info.max_players);
            println!("port: {}", info.port);
        }
        None => println!("handshake ok (challenge {:#010x})", result.challenge),
    }

    Ok(())
}
