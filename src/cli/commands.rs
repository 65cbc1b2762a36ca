//! CLI Command Implementations
//!
//! Every command loads the workspace, applies one change or query through
//! the library, and saves if something changed.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::config::Settings;
use crate::dsp::{CascadeCache, PhaseMode};
use crate::error::BiquadrError;
use crate::export::{checksum, export_channels, render, ExportDocument, ExportFormat};
use crate::model::{Channel, DataType, Filter, FilterType, Project, Session, Target, TargetId};
use crate::state::{export_legacy_project, find_workspaces, import_legacy_project, WorkspaceFile};

fn open(path: &Path) -> Result<WorkspaceFile> {
    WorkspaceFile::load(path).with_context(|| format!("failed to open workspace {}", path.display()))
}

fn store(workspace: &mut WorkspaceFile, path: &Path) -> Result<()> {
    workspace
        .save(path)
        .with_context(|| format!("failed to save workspace {}", path.display()))
}

fn target_id(session: &Session, name: &str) -> Result<TargetId> {
    session
        .target_by_name(name)
        .map(|t| t.id)
        .ok_or_else(|| {
            BiquadrError::NotFound {
                kind: "target",
                name: name.to_string(),
            }
            .into()
        })
}

/// Create an empty workspace file.
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    info!("Creating workspace: {}", path.display());
    let mut workspace = WorkspaceFile::new(Session::new());
    store(&mut workspace, path)?;
    println!("Workspace created: {}", path.display());
    Ok(())
}

pub fn add_target(path: &Path, name: &str, data_type: DataType, max_order: usize) -> Result<()> {
    let mut workspace = open(path)?;
    let target = Target::new(name, data_type, max_order)?;
    workspace.session.add_target(target)?;
    store(&mut workspace, path)?;
    println!("Target added: {} ({}, max order {})", name, data_type, max_order);
    Ok(())
}

pub fn remove_target(path: &Path, name: &str) -> Result<()> {
    let mut workspace = open(path)?;
    let id = target_id(&workspace.session, name)?;
    workspace.session.remove_target(id)?;
    store(&mut workspace, path)?;
    println!("Target removed: {}", name);
    Ok(())
}

pub fn list_targets(path: &Path) -> Result<()> {
    let workspace = open(path)?;
    let targets = workspace.session.targets();
    if targets.is_empty() {
        println!("No targets.");
        return Ok(());
    }
    println!("{:<20} {:<10} {:>9}  id", "name", "data type", "max order");
    println!("{:-<60}", "");
    for target in targets {
        println!(
            "{:<20} {:<10} {:>9}  {}",
            target.name, target.data_type, target.max_order, target.id
        );
    }
    Ok(())
}

pub fn add_project(
    path: &Path,
    name: &str,
    target: &str,
    sample_rate: Option<f64>,
    settings: &Settings,
) -> Result<()> {
    let mut workspace = open(path)?;
    let id = target_id(&workspace.session, target)?;
    let sample_rate = sample_rate.unwrap_or(settings.default_sample_rate);
    workspace
        .session
        .add_project(Project::new(name, id, sample_rate)?)?;
    store(&mut workspace, path)?;
    println!("Project added: {} on {} at {} Hz", name, target, sample_rate);
    Ok(())
}

pub fn add_channel(path: &Path, project: &str, name: &str) -> Result<()> {
    let mut workspace = open(path)?;
    workspace.session.add_channel(project, Channel::new(name))?;
    store(&mut workspace, path)?;
    println!("Channel added: {}/{}", project, name);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add_filter(
    path: &Path,
    project: &str,
    channel: &str,
    name: &str,
    filter_type: FilterType,
    order: usize,
    cutoff_hz: f64,
    disabled: bool,
) -> Result<()> {
    let mut workspace = open(path)?;
    let filter = Filter::new(name, filter_type, order, cutoff_hz)?.with_enabled(!disabled);
    workspace.session.add_filter(project, channel, filter)?;
    store(&mut workspace, path)?;
    println!(
        "Filter added: {}/{}/{} ({}, order {}, {} Hz)",
        project, channel, name, filter_type, order, cutoff_hz
    );
    Ok(())
}

pub fn remove_filter(path: &Path, project: &str, channel: &str, name: &str) -> Result<()> {
    let mut workspace = open(path)?;
    workspace.session.remove_filter(project, channel, name)?;
    store(&mut workspace, path)?;
    println!("Filter removed: {}/{}/{}", project, channel, name);
    Ok(())
}

pub fn enable_filter(path: &Path, project: &str, channel: &str, name: &str, enabled: bool) -> Result<()> {
    let mut workspace = open(path)?;
    workspace
        .session
        .set_filter_enabled(project, channel, name, enabled)?;
    store(&mut workspace, path)?;
    println!(
        "Filter {}: {}/{}/{}",
        if enabled { "enabled" } else { "disabled" },
        project,
        channel,
        name
    );
    Ok(())
}

fn mark(enabled: bool) -> &'static str {
    if enabled {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Print projects with their channels and filters.
pub fn show(path: &Path, project: Option<&str>) -> Result<()> {
    let workspace = open(path)?;
    let session = &workspace.session;
    let projects: Vec<&Project> = match project {
        Some(name) => vec![session.require_project(name)?],
        None => session.projects().iter().collect(),
    };

    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }

    for project in projects {
        let target = session.require_target(project.target)?;
        println!(
            "{} (target {}, {}, {} Hz, {} sections)",
            project.name,
            target.name,
            target.data_type,
            project.sample_rate(),
            project.section_count(false)
        );
        for channel in project.channels() {
            println!("  {} {}", mark(channel.enabled), channel.name);
            for filter in channel.filters() {
                println!(
                    "      {} {:<16} {:<8} order {:>2}  {} Hz",
                    mark(filter.enabled),
                    filter.name,
                    filter.filter_type,
                    filter.order,
                    filter.cutoff_hz
                );
            }
        }
    }
    Ok(())
}

/// Print the designed sections of every enabled filter.
pub fn design(path: &Path, project: &str) -> Result<()> {
    let workspace = open(path)?;
    let (project, _) = workspace.session.resolve(project)?;
    let designed = project.design_filters(false, &mut CascadeCache::new())?;

    for d in &designed {
        println!(
            "{}/{}: {}, order {}, {} Hz @ {} Hz",
            d.channel,
            d.filter.name,
            d.filter.filter_type,
            d.filter.order,
            d.filter.cutoff_hz,
            project.sample_rate()
        );
        for (i, s) in d.cascade.iter().enumerate() {
            println!(
                "  [{}] b0={:+.10e} b1={:+.10e} b2={:+.10e} a1={:+.10e} a2={:+.10e}  f0={:.2} Hz Q={:.4}{}",
                i,
                s.b0,
                s.b1,
                s.b2,
                s.a1,
                s.a2,
                s.natural_frequency(project.sample_rate()),
                s.q(),
                if s.is_stable() { "" } else { "  UNSTABLE" }
            );
        }
    }
    if designed.is_empty() {
        println!("No enabled filters.");
    }
    Ok(())
}

/// Combined response as `frequency_hz,magnitude_db,phase_deg` rows.
#[allow(clippy::too_many_arguments)]
pub fn response(
    path: &Path,
    project: &str,
    f_min: Option<f64>,
    f_max: Option<f64>,
    points: Option<usize>,
    unwrap: bool,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<()> {
    let workspace = open(path)?;
    let (project, _) = workspace.session.resolve(project)?;

    let mut plot = settings.plot.clone();
    plot.f_min_hz = f_min.unwrap_or(plot.f_min_hz);
    plot.f_max_hz = f_max.unwrap_or(plot.f_max_hz);
    plot.points = points.unwrap_or(plot.points);
    plot.validate()?;

    let mode = if unwrap {
        PhaseMode::Unwrapped
    } else {
        PhaseMode::Wrapped
    };
    let points = project.response_with(&plot.grid()?, mode, &mut CascadeCache::new())?;

    let mut text = String::from("frequency_hz,magnitude_db,phase_deg\n");
    for p in &points {
        text.push_str(&format!(
            "{:.6},{:.6},{:.6}\n",
            p.frequency_hz,
            p.magnitude_db,
            p.phase_deg()
        ));
    }

    match output {
        Some(out) => {
            fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
            println!("Response written: {} ({} points)", out.display(), points.len());
        }
        None => print!("{}", text),
    }
    Ok(())
}

pub struct ExportArgs<'a> {
    pub format: ExportFormat,
    pub data_type: Option<DataType>,
    pub precision: Option<usize>,
    pub include_disabled: bool,
    pub pad: Option<usize>,
    pub per_channel: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub checksum: bool,
}

/// Export a project, or each of its channels, in one format.
pub fn export(path: &Path, project: &str, args: &ExportArgs<'_>, settings: &Settings) -> Result<()> {
    let workspace = open(path)?;
    let (project, target) = workspace.session.resolve(project)?;

    let mut options = settings.export.clone();
    if args.data_type.is_some() {
        options.data_type = args.data_type;
    }
    if let Some(digits) = args.precision {
        options.precision_digits = digits;
    }
    options.include_disabled |= args.include_disabled;
    if args.pad.is_some() {
        options.pad_sections = args.pad;
    }

    if let Some(dir) = args.per_channel {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        for file in export_channels(project, target, args.format, &options)? {
            let out = dir.join(&file.file_name);
            fs::write(&out, &file.content)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {}", out.display());
            if args.checksum {
                println!("  sha256 {}", checksum(&file.content));
            }
        }
        return Ok(());
    }

    let document = ExportDocument::from_project(project, target, &options)?;
    let lossy: Vec<String> = document
        .warnings()
        .map(|(filter, _)| format!("{}/{}", filter.channel, filter.name))
        .collect();
    if !lossy.is_empty() {
        warn!(
            "{} coefficients exceed the float32 tolerance ({})",
            lossy.len(),
            lossy.join(", ")
        );
    }
    let content = render(&document, args.format, &options)?;
    info!(
        "Exported project '{}' as {} ({} sections)",
        project.name,
        args.format,
        document.section_count()
    );

    match args.output {
        Some(out) => {
            fs::write(out, &content).with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {}", out.display());
            if args.checksum {
                println!("  sha256 {}", checksum(&content));
            }
        }
        None => {
            print!("{}", content);
            if args.checksum {
                eprintln!("sha256 {}", checksum(&content));
            }
        }
    }
    Ok(())
}

pub fn import_legacy(path: &Path, file: &Path, target: &str) -> Result<()> {
    let mut workspace = open(path)?;
    let id = target_id(&workspace.session, target)?;
    let project = import_legacy_project(file, id)
        .with_context(|| format!("failed to import {}", file.display()))?;
    let name = project.name.clone();
    workspace.session.add_project(project)?;
    store(&mut workspace, path)?;
    println!("Imported project: {} (target {})", name, target);
    Ok(())
}

/// Write one project in the desktop tool's project layout.
pub fn export_legacy(path: &Path, project: &str, file: &Path) -> Result<()> {
    let workspace = open(path)?;
    let project = workspace.session.require_project(project)?;
    export_legacy_project(project, file)
        .with_context(|| format!("failed to write {}", file.display()))?;
    println!("Wrote legacy project: {}", file.display());
    Ok(())
}

/// List workspace files below `dir` with a short summary of each.
pub fn list(dir: &Path) -> Result<()> {
    let found = find_workspaces(dir)?;
    if found.is_empty() {
        println!("No workspaces found in {}", dir.display());
        return Ok(());
    }
    for path in found {
        match WorkspaceFile::load(&path) {
            Ok(ws) => println!(
                "{}  ({} targets, {} projects, modified {})",
                path.display(),
                ws.session.targets().len(),
                ws.session.projects().len(),
                ws.modified_at.format("%Y-%m-%d %H:%M:%S")
            ),
            Err(e) => println!("{}  (unreadable: {})", path.display(), e),
        }
    }
    Ok(())
}
