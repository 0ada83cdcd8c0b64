//! nft-publish CLI entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Command, VerifyArgs};
use nft_publish::{
    AssetBundle, HttpFetcher, PublishConfig, PublishLocators, PublishVerifier,
    VerificationMode, VerificationOutcome,
};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("nft-publish v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Digest { path } => {
            let bundle = AssetBundle::from_file(&path)?;
            println!("{}  {}", bundle.digest(), path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify(args) => verify(args, &config).await,
    }
}

async fn verify(args: VerifyArgs, config: &PublishConfig) -> color_eyre::Result<ExitCode> {
    let fetcher = HttpFetcher::new(config.verify.fetch_timeout())?;
    let verifier = PublishVerifier::new(fetcher, &config.verify);
    let image = args.image;
    let locators = PublishLocators::new(args.metadata_uri, args.image_uri);

    let run = async {
        match &image {
            Some(path) => {
                let bundle = AssetBundle::from_file(path)?;
                Ok::<_, nft_publish::Error>(
                    verifier
                        .verify(&locators, bundle.digest(), VerificationMode::MetadataAndImage)
                        .await,
                )
            }
            None => Ok(verifier.verify_metadata(&locators).await),
        }
    };

    let outcome = tokio::select! {
        outcome = run => outcome?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl-C received, abandoning verification");
            report_abandoned(&locators);
            return Ok(ExitCode::from(130));
        }
    };

    match outcome {
        VerificationOutcome::Verified {
            locators,
            attempts,
            total_wait,
        } => {
            println!(
                "verified after {attempts} attempt(s), {}s waiting",
                total_wait.as_secs()
            );
            print_locators(&locators);
            Ok(ExitCode::SUCCESS)
        }
        VerificationOutcome::Failed {
            locators,
            attempts_exhausted,
            total_wait,
        } => {
            println!(
                "NOT verified after {attempts_exhausted} attempt(s), {}s waiting",
                total_wait.as_secs()
            );
            print_locators(&locators);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_locators(locators: &PublishLocators) {
    println!("  metadata: {}", locators.metadata_uri);
    if let Some(image) = &locators.image_uri {
        println!("  image:    {image}");
    }
}

fn report_abandoned(locators: &PublishLocators) {
    println!("verification abandoned");
    print_locators(locators);
}
