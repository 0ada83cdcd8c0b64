//! Command-line interface definition.

use clap::{Args, Parser, Subcommand, ValueEnum};
use nft_publish::config::{default_config_path, ImageMatchRule, PublishConfig};
use std::path::PathBuf;

/// Confirm that published NFT metadata and images are live before minting.
#[derive(Parser, Debug)]
#[command(name = "nft-publish")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(long, short, global = true, env = "NFT_PUBLISH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level.
    #[arg(long, short = 'l', global = true, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the content digest of a local file.
    Digest {
        /// File to digest.
        path: PathBuf,
    },
    /// Poll a gateway until uploaded artifacts are live and correct.
    Verify(VerifyArgs),
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Metadata locator returned by the upload.
    #[arg(long, short = 'u', env = "NFT_PUBLISH_METADATA_URI")]
    pub metadata_uri: String,

    /// Image locator returned by the upload.
    #[arg(long, requires = "image")]
    pub image_uri: Option<String>,

    /// Local copy of the uploaded image; its digest is the expected value.
    #[arg(long, short = 'p', requires = "image_uri")]
    pub image: Option<PathBuf>,

    /// First backoff delay in milliseconds.
    #[arg(long, env = "NFT_PUBLISH_BASE_DELAY_MS")]
    pub base_delay_ms: Option<u64>,

    /// Attempt ceiling for the selected mode.
    #[arg(long, env = "NFT_PUBLISH_CEILING")]
    pub ceiling: Option<u32>,

    /// Wall-clock limit for the whole run, in seconds.
    #[arg(long, env = "NFT_PUBLISH_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// How `image` in the metadata is matched against `--image-uri`.
    #[arg(long, value_enum, env = "NFT_PUBLISH_IMAGE_MATCH")]
    pub image_match: Option<CliImageMatch>,
}

/// Image match rule CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliImageMatch {
    /// Exact string equality.
    Exact,
    /// Equality after stripping 12 and 8 leading bytes.
    PrefixSkew,
}

impl From<CliImageMatch> for ImageMatchRule {
    fn from(m: CliImageMatch) -> Self {
        match m {
            CliImageMatch::Exact => Self::Exact,
            CliImageMatch::PrefixSkew => Self::default(),
        }
    }
}

impl Cli {
    /// Load configuration from `--config`, the default location, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn load_config(&self) -> color_eyre::Result<PublishConfig> {
        let mut config = match &self.config {
            Some(path) => PublishConfig::from_file(path)?,
            None => {
                let path = default_config_path();
                if path.is_file() {
                    PublishConfig::from_file(&path)?
                } else {
                    PublishConfig::default()
                }
            }
        };

        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }

        if let Command::Verify(args) = &self.command {
            args.apply(&mut config);
        }

        config.validate()?;
        Ok(config)
    }
}

impl VerifyArgs {
    /// Override configuration values given on the command line.
    fn apply(&self, config: &mut PublishConfig) {
        if let Some(ms) = self.base_delay_ms {
            config.verify.base_delay_ms = ms;
        }
        if let Some(ceiling) = self.ceiling {
            if self.image.is_some() {
                config.verify.full_ceiling = ceiling;
            } else {
                config.verify.metadata_only_ceiling = ceiling;
            }
        }
        if let Some(secs) = self.timeout_secs {
            config.verify.overall_timeout_secs = Some(secs);
        }
        if let Some(rule) = self.image_match {
            config.verify.image_match = rule.into();
        }
    }
}
