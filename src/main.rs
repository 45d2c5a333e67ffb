use clap::{Parser, Subcommand};
use powerbi_mcp::constants::network::DEFAULT_PORT;
use powerbi_mcp::mcp::server::McpServer;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "powerbi-mcp", version, about = "Power BI MCP relay")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP relay (default).
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Speak newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server = match McpServer::from_env() {
        Ok(server) => Arc::new(server),
        Err(err) => {
            eprintln!("powerbi-mcp: {}", err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Command::Stdio) => server.run_stdio().await,
        Some(Command::Serve { host, port }) => serve(server, SocketAddr::new(host, port)).await,
        None => {
            let port = std::env::var("PORT")
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT);
            serve(server, SocketAddr::from(([0, 0, 0, 0], port))).await
        }
    };
    if let Err(err) = result {
        eprintln!("powerbi-mcp: {}", err);
        std::process::exit(1);
    }
}

async fn serve(
    server: Arc<McpServer>,
    addr: SocketAddr,
) -> Result<(), powerbi_mcp::errors::McpError> {
    let app = server.app();
    app.logger.info(
        "Starting Power BI MCP relay",
        Some(&app.settings.environment_check()),
    );
    app.probe_token().await;
    powerbi_mcp::http::serve(server, addr).await
}
