mod health;
mod login;
mod seed;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(about = "recipebox CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the server's health report (exits non-zero when degraded or unhealthy)
    Health {
        /// Server URL (default: http://localhost:3000)
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,
    },
    /// Request a magic sign-in link by email
    Login {
        /// Server URL (default: http://localhost:3000)
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,
        /// Address to send the link to
        #[arg(long)]
        email: String,
    },
    /// Create sample recipes for a signed-in user
    Seed {
        /// Server URL (default: http://localhost:3000)
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,
        /// Access token from the auth callback's recipebox-access-token cookie
        #[arg(long, env = "RECIPEBOX_TOKEN")]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Health { server } => {
            let healthy = health::health(&server).await?;
            if !healthy {
                std::process::exit(1);
            }
        }
        Commands::Login { server, email } => {
            login::login(&server, &email).await?;
        }
        Commands::Seed { server, token } => {
            seed::seed(&server, &token).await?;
        }
    }

    Ok(())
}
