//! Biquadr CLI - Butterworth biquad designer
//!
//! Command-line interface for designing filters and exporting coefficients.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use biquadr::cli::commands::{self, ExportArgs};
use biquadr::cli::{Cli, Commands};
use biquadr::config::Settings;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Biquadr v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load_or_default(cli.config.as_deref())
        .context("failed to load settings")?;

    match cli.command {
        Some(cmd) => handle_command(cmd, &settings),
        None => {
            println!("Biquadr v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, settings: &Settings) -> Result<()> {
    match cmd {
        Commands::Init { workspace, force } => commands::init(&workspace, force),
        Commands::AddTarget {
            workspace,
            name,
            data_type,
            max_order,
        } => commands::add_target(&workspace, &name, data_type, max_order),
        Commands::RemoveTarget { workspace, name } => commands::remove_target(&workspace, &name),
        Commands::Targets { workspace } => commands::list_targets(&workspace),
        Commands::AddProject {
            workspace,
            name,
            target,
            sample_rate,
        } => commands::add_project(&workspace, &name, &target, sample_rate, settings),
        Commands::AddChannel {
            workspace,
            project,
            name,
        } => commands::add_channel(&workspace, &project, &name),
        Commands::AddFilter {
            workspace,
            project,
            channel,
            name,
            filter_type,
            order,
            cutoff,
            disabled,
        } => commands::add_filter(
            &workspace,
            &project,
            &channel,
            &name,
            filter_type,
            order,
            cutoff,
            disabled,
        ),
        Commands::RemoveFilter {
            workspace,
            project,
            channel,
            name,
        } => commands::remove_filter(&workspace, &project, &channel, &name),
        Commands::EnableFilter {
            workspace,
            project,
            channel,
            name,
            off,
        } => commands::enable_filter(&workspace, &project, &channel, &name, !off),
        Commands::Show { workspace, project } => commands::show(&workspace, project.as_deref()),
        Commands::Design { workspace, project } => commands::design(&workspace, &project),
        Commands::Response {
            workspace,
            project,
            f_min,
            f_max,
            points,
            unwrap,
            output,
        } => commands::response(
            &workspace,
            &project,
            f_min,
            f_max,
            points,
            unwrap,
            output.as_deref(),
            settings,
        ),
        Commands::Export {
            workspace,
            project,
            format,
            data_type,
            precision,
            include_disabled,
            pad,
            per_channel,
            output,
            checksum,
        } => {
            let args = ExportArgs {
                format,
                data_type,
                precision,
                include_disabled,
                pad,
                per_channel: per_channel.as_deref(),
                output: output.as_deref(),
                checksum,
            };
            commands::export(&workspace, &project, &args, settings)
        }
        Commands::ImportLegacy {
            workspace,
            file,
            target,
        } => commands::import_legacy(&workspace, &file, &target),
        Commands::ExportLegacy {
            workspace,
            project,
            output,
        } => commands::export_legacy(&workspace, &project, &output),
        Commands::List { dir } => commands::list(&dir),
    }
}
