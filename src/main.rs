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
    let cli = talkfeed::cli::Cli::parse();
    talkfeed::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        talkfeed::cli::Command::Build(args) => {
            talkfeed::build::run(args).context("build")?;
        }
        talkfeed::cli::Command::Add(args) => {
            talkfeed::add::run(args).await.context("add")?;
        }
        talkfeed::cli::Command::Rate(args) => {
            talkfeed::rate::run(args).context("rate")?;
        }
        talkfeed::cli::Command::NewEvent(args) => {
            talkfeed::new_event::run(args).await.context("new-event")?;
        }
        talkfeed::cli::Command::ListByRating(args) => {
            talkfeed::list::run(args).context("list-by-rating")?;
        }
    }

    Ok(())
}
