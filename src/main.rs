use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    imgbed_gallery::logging::init().context("init logging")?;

    let cli = imgbed_gallery::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        imgbed_gallery::cli::Command::Generate(args) => {
            imgbed_gallery::generate::run(args)
                .await
                .context("generate")?;
        }
        imgbed_gallery::cli::Command::Directories(args) => {
            imgbed_gallery::generate::directories(args)
                .await
                .context("directories")?;
        }
    }

    Ok(())
}
