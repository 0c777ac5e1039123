//! CLI definitions and entry point

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use image_updater::adapters::{FileAuditStore, GitHubClient, GitHubClientConfig, PromptTags, prompt_required};
use image_updater::config::RunConfig;
use image_updater::core::ports::{FixedTag, TagSource};
use image_updater::core::services::Orchestrator;
use image_updater::output::OutputMode;

/// Branch name used for dry runs, where no branch is created
const DRY_RUN_BRANCH: &str = "dry-run";

/// image-updater - Replace deprecated CI machine images across an organization
#[derive(Parser, Debug)]
#[command(
    name = "image-updater",
    version,
    about = "Replace deprecated CI machine images across a GitHub organization",
    long_about = "Scan every repository of an organization for deprecated machine images.\n\n\
                  Each CircleCI config that uses one is patched, saved locally as <repo>.yml,\n\
                  committed to a new branch and proposed in a pull request."
)]
pub struct Cli {
    /// Organization to scan
    #[arg(short, long, env = "IMAGE_UPDATER_ORG")]
    pub org: Option<String>,

    /// Personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Branch to create in every repository (must not exist yet)
    #[arg(short, long, env = "IMAGE_UPDATER_BRANCH")]
    pub branch: Option<String>,

    /// Config file (default: ./image-updater.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API root URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// CI config path inside each repository
    #[arg(long)]
    pub config_path: Option<String>,

    /// Directory for the patched copies
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Additional deprecated image (family:version), repeatable
    #[arg(long = "deprecated", value_name = "IMAGE")]
    pub deprecated: Vec<String>,

    /// Replacement tag for every deprecated image instead of asking (empty: default)
    #[arg(long)]
    pub tag: Option<String>,

    /// Patch and save locally without creating branches, commits or pull requests
    #[arg(long)]
    pub dry_run: bool,

    /// Output the run report in JSON format (machine-readable)
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Merge flags over the loaded config
    fn apply(&self, config: &mut RunConfig) {
        if let Some(org) = &self.org {
            config.organization = Some(org.clone());
        }
        if let Some(branch) = &self.branch {
            config.branch = Some(branch.clone());
        }
        if let Some(api_url) = &self.api_url {
            config.api_url.clone_from(api_url);
        }
        if let Some(path) = &self.config_path {
            config.config_path.clone_from(path);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        config.deprecated_images.extend(self.deprecated.iter().cloned());
    }
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let mut config = RunConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut prompt = io::stderr();

    let organization = match config.organization.clone() {
        Some(org) if !org.trim().is_empty() => org,
        _ => prompt_required(
            &mut input,
            &mut prompt,
            "Organization you wish to scan for repos: ",
            "organization",
        )?,
    };
    let token = match cli.token.clone() {
        Some(token) if !token.trim().is_empty() => token,
        _ => prompt_required(&mut input, &mut prompt, "Personal Access Token: ", "token")?,
    };
    let branch = match config.branch.clone() {
        Some(branch) if !branch.trim().is_empty() => branch,
        _ if cli.dry_run => DRY_RUN_BRANCH.to_string(),
        _ => prompt_required(
            &mut input,
            &mut prompt,
            "New branch name. Ensure it is unique: ",
            "branch name",
        )?,
    };
    drop(input);

    let client = GitHubClient::new(&GitHubClientConfig {
        api_url: config.api_url.clone(),
        token,
        timeout_secs: config.timeout_secs,
    })?;
    let registry = config.registry();
    let settings = config.publish_settings(&branch);
    let audit = FileAuditStore::new(config.output_dir.clone());

    info!(
        "scanning {organization} for {} deprecated image(s); branch '{branch}'{}",
        registry.len(),
        if cli.dry_run { " (dry run)" } else { "" }
    );

    let mut tags: Box<dyn TagSource> = match cli.tag {
        Some(tag) => Box::new(FixedTag::new(tag)),
        None => Box::new(PromptTags::stdio()),
    };

    let report = Orchestrator::new(&client, &audit, &registry, &settings)
        .dry_run(cli.dry_run)
        .run(&organization, tags.as_mut())?;

    report.render(output_mode).context("rendering the run report")?;
    Ok(())
}
