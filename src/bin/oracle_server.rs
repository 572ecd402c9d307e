use padding_oracle::{server, OracleService};

use clap::Parser;
use tokio::net::TcpListener;

use std::net::SocketAddr;

#[derive(Parser)]
#[command(
    name = "oracle_server",
    about = "Serve a padding oracle over HTTP under a fresh random key"
)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "PADDING_ORACLE_ADDR", default_value = "127.0.0.1:9000")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let listener = TcpListener::bind(cli.addr).await?;
    server::serve(listener, OracleService::from_entropy()).await
}
