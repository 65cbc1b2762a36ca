//! Workspace Storage
//!
//! Saves and loads the session as a `*.biquadr` JSON workspace file, imports
//! project files written by the earlier desktop tool, and finds workspaces
//! on disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{BiquadrError, Result};
use crate::model::{Channel, Filter, FilterType, Project, Session, TargetId, DEFAULT_SAMPLE_RATE};

/// Current workspace schema version
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// Crate version recorded in saved workspaces
pub const BIQUADR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Workspace file extension (without the dot)
pub const WORKSPACE_EXTENSION: &str = "biquadr";

fn default_schema_version() -> String {
    CURRENT_SCHEMA_VERSION.to_string()
}

/// On-disk workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub biquadr_version: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub session: Session,
}

impl WorkspaceFile {
    pub fn new(session: Session) -> Self {
        let now = Utc::now();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            biquadr_version: BIQUADR_VERSION.to_string(),
            created_at: now,
            modified_at: now,
            session,
        }
    }

    /// Load a workspace and re-validate every project against its target.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BiquadrError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let data: Value = serde_json::from_str(&content)?;
        check_schema_version(&data)?;

        let workspace: WorkspaceFile = serde_json::from_value(data)?;
        workspace.session.validate()?;

        info!(
            "Loaded workspace {} ({} targets, {} projects)",
            path.display(),
            workspace.session.targets().len(),
            workspace.session.projects().len()
        );
        Ok(workspace)
    }

    /// Save through a temporary sibling file that is renamed into place.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.modified_at = Utc::now();
        self.biquadr_version = BIQUADR_VERSION.to_string();
        self.schema_version = CURRENT_SCHEMA_VERSION.to_string();

        let content = serde_json::to_string_pretty(self)?;
        let tmp_path = temp_path(path);
        fs::write(&tmp_path, content).map_err(|e| BiquadrError::FileWriteError {
            path: tmp_path.clone(),
            source: e,
        })?;
        fs::rename(&tmp_path, path).map_err(|e| BiquadrError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!("Saved workspace {}", path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Accept any 1.x schema; a missing version is treated as current.
fn check_schema_version(data: &Value) -> Result<()> {
    let version = data
        .get("schema_version")
        .and_then(|v| v.as_str())
        .unwrap_or(CURRENT_SCHEMA_VERSION);
    let major = version.split('.').next().unwrap_or_default();
    let current_major = CURRENT_SCHEMA_VERSION.split('.').next().unwrap_or_default();
    if major != current_major {
        return Err(BiquadrError::InvalidSchemaVersion {
            version: version.to_string(),
        });
    }
    Ok(())
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LegacyFilter {
    name: String,
    filter_type: FilterType,
    frequency: f64,
    order: usize,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LegacyChannel {
    name: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    filters: Vec<LegacyFilter>,
}

/// Project file layout of the earlier desktop tool
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LegacyProject {
    name: String,
    #[serde(default = "default_sample_rate")]
    sample_rate: f64,
    #[serde(default)]
    channels: Vec<LegacyChannel>,
}

fn default_enabled() -> bool {
    true
}

/// Read a legacy project file and bind it to `target`.
///
/// The result is not checked against the target here; hand it to
/// [`Session::add_project`] for that.
pub fn import_legacy_project(path: &Path, target: TargetId) -> Result<Project> {
    let content = fs::read_to_string(path).map_err(|e| BiquadrError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let legacy: LegacyProject = serde_json::from_str(&content)?;

    let mut project = Project::new(legacy.name, target, legacy.sample_rate)?;
    for legacy_channel in legacy.channels {
        let mut channel = Channel::new(legacy_channel.name);
        channel.enabled = legacy_channel.enabled;
        for f in legacy_channel.filters {
            let filter = Filter::new(f.name, f.filter_type, f.order, f.frequency)?;
            channel.add_filter(filter.with_enabled(f.enabled))?;
        }
        project.add_channel(channel)?;
    }

    info!(
        "Imported legacy project '{}' from {} ({} channels)",
        project.name,
        path.display(),
        project.channels().len()
    );
    Ok(project)
}

/// Write `project` in the legacy layout, for tools that still read it
pub fn export_legacy_project(project: &Project, path: &Path) -> Result<()> {
    let legacy = LegacyProject {
        name: project.name.clone(),
        sample_rate: project.sample_rate(),
        channels: project
            .channels()
            .iter()
            .map(|c| LegacyChannel {
                name: c.name.clone(),
                enabled: c.enabled,
                filters: c
                    .filters()
                    .iter()
                    .map(|f| LegacyFilter {
                        name: f.name.clone(),
                        filter_type: f.filter_type,
                        frequency: f.cutoff_hz,
                        order: f.order,
                        enabled: f.enabled,
                    })
                    .collect(),
            })
            .collect(),
    };
    let content = serde_json::to_string_pretty(&legacy)?;
    fs::write(path, content).map_err(|e| BiquadrError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Wrote legacy project '{}' to {}", project.name, path.display());
    Ok(())
}

/// Every `*.biquadr` file below `dir`, sorted by path
pub fn find_workspaces(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| BiquadrError::Io(e.into()))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(WORKSPACE_EXTENSION)
        {
            found.push(entry.path().to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataType, Target};
    use tempfile::tempdir;

    fn sample_session() -> Session {
        let mut session = Session::new();
        let id = session
            .add_target(Target::new("dsp", DataType::Int32, 8).unwrap())
            .unwrap();
        session
            .add_project(Project::new("speaker", id, 44100.0).unwrap())
            .unwrap();
        session.add_channel("speaker", Channel::new("main")).unwrap();
        session
            .add_filter("speaker", "main", Filter::lowpass("lp", 4, 1000.0).unwrap())
            .unwrap();
        session
    }

    #[test]
    fn test_save_and_load_workspace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.biquadr");

        let mut workspace = WorkspaceFile::new(sample_session());
        workspace.save(&path).unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = WorkspaceFile::load(&path).unwrap();
        assert_eq!(loaded.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(loaded.session, workspace.session);
        assert_eq!(loaded.session.projects()[0].sample_rate(), 44100.0);
    }

    #[test]
    fn test_load_rejects_unknown_major_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.biquadr");
        let mut workspace = WorkspaceFile::new(Session::new());
        workspace.save(&path).unwrap();

        let mut data: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        data["schema_version"] = Value::String("2.0".to_string());
        fs::write(&path, data.to_string()).unwrap();

        let err = WorkspaceFile::load(&path).unwrap_err();
        assert!(matches!(err, BiquadrError::InvalidSchemaVersion { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = WorkspaceFile::load(&dir.path().join("none.biquadr")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_ERROR");
    }

    #[test]
    fn test_import_legacy_project() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.biquadr");
        fs::write(
            &path,
            r#"{
  "name": "Monitor",
  "channels": [
    {
      "name": "Left",
      "filters": [
        {"name": "HPF", "filter_type": "highpass", "frequency": 40.0, "order": 4, "enabled": true},
        {"name": "LPF", "filter_type": "lowpass", "frequency": 16000.0, "order": 2}
      ]
    },
    {"name": "Right", "enabled": false, "filters": []}
  ]
}"#,
        )
        .unwrap();

        let target = TargetId::new();
        let project = import_legacy_project(&path, target).unwrap();
        assert_eq!(project.name, "Monitor");
        assert_eq!(project.sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(project.target, target);
        assert_eq!(project.channels().len(), 2);
        assert!(!project.channels()[1].enabled);
        let lpf = project.channel("Left").unwrap().filter("LPF").unwrap();
        assert_eq!(lpf.cutoff_hz, 16000.0);
        assert!(lpf.enabled);
    }

    #[test]
    fn test_legacy_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.biquadr");
        let session = sample_session();
        let project = &session.projects()[0];

        export_legacy_project(project, &path).unwrap();
        let back = import_legacy_project(&path, project.target).unwrap();
        assert_eq!(&back, project);
    }

    #[test]
    fn test_import_legacy_rejects_odd_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.biquadr");
        fs::write(
            &path,
            r#"{"name":"x","channels":[{"name":"c","filters":[{"name":"f","filter_type":"lowpass","frequency":100.0,"order":3}]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            import_legacy_project(&path, TargetId::new()).unwrap_err(),
            BiquadrError::InvalidOrder { order: 3, .. }
        ));
    }

    #[test]
    fn test_find_workspaces_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.biquadr"), "{}").unwrap();
        fs::write(dir.path().join("nested").join("a.biquadr"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let found = find_workspaces(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("b.biquadr"), dir.path().join("nested").join("a.biquadr")]
        );
        assert!(find_workspaces(&dir.path().join("missing")).unwrap().is_empty());
    }
}
