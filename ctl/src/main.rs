use anyhow::Context;
use clap::{Parser, Subcommand};
use murmur_db::storage;
use tracing_subscriber::EnvFilter;

use crate::commands::{CreateUserParams, EdgeParams, PostParams, TimelineParams};

mod commands;

#[derive(Parser)]
pub struct Args {
    #[clap(subcommand)]
    command: Command,

    /// `memory://` gives a throwaway in-process store.
    #[clap(
        short = 'D',
        long,
        env = "MURMUR_API_DATABASE_URL",
        default_value = "postgres://localhost:5432/murmur"
    )]
    db_url: String,
}

#[derive(Clone, Subcommand)]
pub enum Command {
    #[command(name = "create-user")]
    CreateUser(CreateUserParams),

    /// Make one user follow another.
    Follow(EdgeParams),

    /// Remove a follow edge.
    Unfollow(EdgeParams),

    /// Publish a post on behalf of a user.
    Post(PostParams),

    /// Print a user's followed timeline.
    Timeline(TimelineParams),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or("warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let stg = storage::connect(&args.db_url)
        .await
        .context("Failed to connect to the store")?;

    let output = match args.command {
        Command::CreateUser(params) => commands::create_user(&*stg, params).await,
        Command::Follow(params) => commands::follow(&*stg, params).await,
        Command::Unfollow(params) => commands::unfollow(&*stg, params).await,
        Command::Post(params) => commands::post(&*stg, params).await,
        Command::Timeline(params) => commands::timeline(&*stg, params).await,
    }?;

    println!("{}", output);
    Ok(())
}
