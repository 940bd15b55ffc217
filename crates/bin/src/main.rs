use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, filter::Directive};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, SessionCommands, StoreCommands};

#[tokio::main]
async fn main() -> ExitCode {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "scholar_sync=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(hint) = err
                .downcast_ref::<scholar_sync::Error>()
                .and_then(scholar_sync::Error::suggestion)
            {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let format = cli.format;
    let workspace = commands::open_workspace(&cli.config).await?;

    match cli.command {
        Commands::Login(args) => commands::users::login(&workspace, &args, format).await,
        Commands::Users => commands::users::list(&workspace, format).await,
        Commands::RemoveUser(args) => commands::users::remove(&workspace, &args, format).await,
        Commands::Clean(args) => commands::users::clean(&workspace, &args, format).await,
        Commands::Project(args) => commands::projects::select(&workspace, &args, format).await,
        Commands::Projects(args) => commands::projects::list(&workspace, &args, format).await,
        Commands::Augmentation(args) => {
            commands::augmentations::select(&workspace, &args, format).await
        }
        Commands::Augmentations(args) => {
            commands::augmentations::list(&workspace, &args, format).await
        }
        Commands::DownloadQr(args) => {
            commands::transfer::download_qr(&workspace, &args, format).await
        }
        Commands::Download(args) => commands::transfer::download(&workspace, &args, format).await,
        Commands::Upload(args) => commands::transfer::upload(&workspace, &args, format).await,
        Commands::Store(store_cmd) => match store_cmd {
            StoreCommands::TargetImage(args) => {
                commands::transfer::store_target_image(&workspace, &args, format).await
            }
            StoreCommands::Model(args) => {
                commands::transfer::store_model(&workspace, &args, format).await
            }
            StoreCommands::Qr(args) => commands::transfer::store_qr(&workspace, &args, format).await,
            StoreCommands::All(args) => {
                commands::transfer::store_all(&workspace, &args, format).await
            }
        },
        Commands::Session(session_cmd) => match session_cmd {
            SessionCommands::Save(args) => commands::session::save(&workspace, &args, format).await,
            SessionCommands::Open(args) => commands::session::open(&workspace, &args, format).await,
        },
    }
}
