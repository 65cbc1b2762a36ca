//! State Management Module
//!
//! Workspace persistence, legacy project import and workspace discovery.

pub mod storage;

pub use storage::{
    export_legacy_project, find_workspaces, import_legacy_project, WorkspaceFile,
    BIQUADR_VERSION, CURRENT_SCHEMA_VERSION, WORKSPACE_EXTENSION,
};
