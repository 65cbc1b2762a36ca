//! Session catalog
//!
//! Owns every target and project the shell is working with. All edits that
//! could break the order/Nyquist invariants go through here so that
//! [`Project::validate`] runs once per edit; a failed edit leaves the
//! session untouched.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::filter::Filter;
use super::project::{Channel, Project};
use super::target::{Target, TargetId};
use crate::error::{BiquadrError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    targets: Vec<Target>,
    #[serde(default)]
    projects: Vec<Project>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn target_by_name(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn require_target(&self, id: TargetId) -> Result<&Target> {
        self.target(id).ok_or_else(|| BiquadrError::TargetNotFound {
            id: id.to_string(),
        })
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn require_project(&self, name: &str) -> Result<&Project> {
        self.project(name).ok_or_else(|| BiquadrError::NotFound {
            kind: "project",
            name: name.to_string(),
        })
    }

    /// A project together with the target it references
    pub fn resolve(&self, project_name: &str) -> Result<(&Project, &Target)> {
        let project = self.require_project(project_name)?;
        let target = self.require_target(project.target)?;
        Ok((project, target))
    }

    /// Register a target; names are unique within the session
    pub fn add_target(&mut self, target: Target) -> Result<TargetId> {
        target.validate()?;
        if self.target_by_name(&target.name).is_some() {
            return Err(BiquadrError::DuplicateName {
                kind: "target",
                name: target.name,
            });
        }
        let id = target.id;
        info!("Added target '{}' ({}, max order {})", target.name, target.data_type, target.max_order);
        self.targets.push(target);
        Ok(id)
    }

    /// Replace the target with the same id. Rejected if any project using it would become invalid.
    pub fn update_target(&mut self, target: Target) -> Result<()> {
        target.validate()?;
        let index = self
            .targets
            .iter()
            .position(|t| t.id == target.id)
            .ok_or_else(|| BiquadrError::TargetNotFound {
                id: target.id.to_string(),
            })?;
        if self
            .targets
            .iter()
            .any(|t| t.id != target.id && t.name == target.name)
        {
            return Err(BiquadrError::DuplicateName {
                kind: "target",
                name: target.name,
            });
        }
        for project in self.projects.iter().filter(|p| p.target == target.id) {
            if let Err(e) = project.validate(&target) {
                warn!("Rejected update of target '{}': {}", target.name, e);
                return Err(e);
            }
        }
        self.targets[index] = target;
        Ok(())
    }

    /// Remove an unreferenced target
    pub fn remove_target(&mut self, id: TargetId) -> Result<Target> {
        let index = self
            .targets
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| BiquadrError::TargetNotFound { id: id.to_string() })?;
        if let Some(project) = self.projects.iter().find(|p| p.target == id) {
            return Err(BiquadrError::TargetInUse {
                target: self.targets[index].name.clone(),
                project: project.name.clone(),
            });
        }
        Ok(self.targets.remove(index))
    }

    /// Add a project after validating it against its target
    pub fn add_project(&mut self, project: Project) -> Result<()> {
        if self.project(&project.name).is_some() {
            return Err(BiquadrError::DuplicateName {
                kind: "project",
                name: project.name,
            });
        }
        let target = self.require_target(project.target)?;
        project.validate(target)?;
        info!("Added project '{}' on target '{}'", project.name, target.name);
        self.projects.push(project);
        Ok(())
    }

    pub fn remove_project(&mut self, name: &str) -> Option<Project> {
        let index = self.projects.iter().position(|p| p.name == name)?;
        Some(self.projects.remove(index))
    }

    /// Apply `edit` to a copy of the project and commit it only if it still validates
    pub fn edit_project<F>(&mut self, name: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Project) -> Result<()>,
    {
        let index = self
            .projects
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| BiquadrError::NotFound {
                kind: "project",
                name: name.to_string(),
            })?;

        let mut draft = self.projects[index].clone();
        edit(&mut draft)?;

        if draft.name != name && self.project(&draft.name).is_some() {
            return Err(BiquadrError::DuplicateName {
                kind: "project",
                name: draft.name,
            });
        }
        let target = self.require_target(draft.target)?;
        if let Err(e) = draft.validate(target) {
            warn!("Rejected edit of project '{}': {}", name, e);
            return Err(e);
        }

        self.projects[index] = draft;
        Ok(())
    }

    pub fn add_channel(&mut self, project: &str, channel: Channel) -> Result<()> {
        self.edit_project(project, |p| p.add_channel(channel))
    }

    pub fn add_filter(&mut self, project: &str, channel: &str, filter: Filter) -> Result<()> {
        self.edit_project(project, |p| p.require_channel_mut(channel)?.add_filter(filter))
    }

    /// Replace the filter called `filter_name` with `filter`
    pub fn update_filter(
        &mut self,
        project: &str,
        channel: &str,
        filter_name: &str,
        filter: Filter,
    ) -> Result<()> {
        self.edit_project(project, |p| {
            let slot = p
                .require_channel_mut(channel)?
                .filter_mut(filter_name)
                .ok_or_else(|| BiquadrError::NotFound {
                    kind: "filter",
                    name: filter_name.to_string(),
                })?;
            *slot = filter;
            Ok(())
        })
    }

    pub fn remove_filter(&mut self, project: &str, channel: &str, filter_name: &str) -> Result<Filter> {
        let mut removed = None;
        self.edit_project(project, |p| {
            removed = p.require_channel_mut(channel)?.remove_filter(filter_name);
            Ok(())
        })?;
        removed.ok_or_else(|| BiquadrError::NotFound {
            kind: "filter",
            name: filter_name.to_string(),
        })
    }

    pub fn set_filter_enabled(
        &mut self,
        project: &str,
        channel: &str,
        filter_name: &str,
        enabled: bool,
    ) -> Result<()> {
        self.edit_project(project, |p| {
            let filter = p
                .require_channel_mut(channel)?
                .filter_mut(filter_name)
                .ok_or_else(|| BiquadrError::NotFound {
                    kind: "filter",
                    name: filter_name.to_string(),
                })?;
            filter.enabled = enabled;
            Ok(())
        })
    }

    /// Check every project against its target
    pub fn validate(&self) -> Result<()> {
        for target in &self.targets {
            target.validate()?;
        }
        for project in &self.projects {
            project.validate(self.require_target(project.target)?)?;
        }
        Ok(())
    }
}
