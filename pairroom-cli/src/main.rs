mod join;
mod relay;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pairroom")]
#[command(about = "Collaborative coding rooms with a built-in video call")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay {
        #[arg(long, env = "PAIRROOM_BIND", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,

        #[arg(long, env = "PAIRROOM_DEFAULT_LANGUAGE", default_value = "javascript")]
        default_language: String,

        /// Accepted token as TOKEN:USER_ID:USERNAME. Repeatable. Without any,
        /// every token is accepted as its own username.
        #[arg(long = "user", value_name = "TOKEN:ID:NAME")]
        users: Vec<String>,
    },

    /// Join a room headless with synthetic media; stdin drives the session.
    Join {
        #[arg(long, env = "PAIRROOM_RELAY", default_value = "ws://127.0.0.1:5000/ws")]
        relay: String,

        #[arg(long, env = "PAIRROOM_TOKEN")]
        token: String,

        #[arg(long)]
        room: String,

        #[arg(long, env = "PAIRROOM_API", default_value = "http://127.0.0.1:5000")]
        api: String,

        /// Do not offer to participants that join after us.
        #[arg(long)]
        no_auto_call: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay {
            bind,
            default_language,
            users,
        } => relay::run(bind, default_language, &users).await,
        Commands::Join {
            relay,
            token,
            room,
            api,
            no_auto_call,
        } => {
            join::run(join::JoinArgs {
                relay,
                token,
                room,
                api,
                auto_call: !no_auto_call,
            })
            .await
        }
    }
}
