//! Projects and channels
//!
//! A project owns its channels by value and each channel owns its filters.
//! The target is referenced by id only. Project filter order is channel order,
//! then filter order within each channel.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::filter::Filter;
use super::target::{Target, TargetId};
use crate::dsp::butterworth::check_sample_rate;
use crate::dsp::response::{evaluate_with, PhaseMode, ResponsePoint};
use crate::dsp::{Cascade, CascadeCache};
use crate::error::{BiquadrError, Result};

/// Sample rate used when a project does not specify one
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE
}

fn default_enabled() -> bool {
    true
}

/// Named group of filters, e.g. one loudspeaker driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    filters: Vec<Filter>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            filters: Vec::new(),
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Append a filter; names are unique within the channel
    pub fn add_filter(&mut self, filter: Filter) -> Result<()> {
        filter.validate()?;
        if self.filter(&filter.name).is_some() {
            return Err(BiquadrError::DuplicateName {
                kind: "filter",
                name: filter.name,
            });
        }
        self.filters.push(filter);
        Ok(())
    }

    pub fn remove_filter(&mut self, name: &str) -> Option<Filter> {
        let index = self.filters.iter().position(|f| f.name == name)?;
        Some(self.filters.remove(index))
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn filter_mut(&mut self, name: &str) -> Option<&mut Filter> {
        self.filters.iter_mut().find(|f| f.name == name)
    }

    pub fn enabled_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|f| f.enabled)
    }
}

/// A filter together with its designed cascade
#[derive(Debug, Clone, PartialEq)]
pub struct DesignedFilter {
    pub channel: String,
    pub filter: Filter,
    pub cascade: Cascade,
}

/// A set of channels designed for one target at one sample rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub target: TargetId,
    #[serde(default = "default_sample_rate")]
    sample_rate: f64,
    #[serde(default)]
    channels: Vec<Channel>,
}

impl Project {
    pub fn new(name: impl Into<String>, target: TargetId, sample_rate: f64) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        Ok(Self {
            name: name.into(),
            target,
            sample_rate,
            channels: Vec::new(),
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Change the design rate. Cutoffs are re-checked by [`Project::validate`].
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        check_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn add_channel(&mut self, channel: Channel) -> Result<()> {
        if self.channel(&channel.name).is_some() {
            return Err(BiquadrError::DuplicateName {
                kind: "channel",
                name: channel.name,
            });
        }
        self.channels.push(channel);
        Ok(())
    }

    pub fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        let index = self.channels.iter().position(|c| c.name == name)?;
        Some(self.channels.remove(index))
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.name == name)
    }

    /// Look up a channel or fail with `NotFound`
    pub fn require_channel_mut(&mut self, name: &str) -> Result<&mut Channel> {
        self.channel_mut(name).ok_or_else(|| BiquadrError::NotFound {
            kind: "channel",
            name: name.to_string(),
        })
    }

    /// Filters in project order; disabled channels and filters are skipped unless asked for
    pub fn filters(&self, include_disabled: bool) -> Vec<(&Channel, &Filter)> {
        self.channels
            .iter()
            .filter(|c| include_disabled || c.enabled)
            .flat_map(|c| {
                c.filters
                    .iter()
                    .filter(move |f| include_disabled || f.enabled)
                    .map(move |f| (c, f))
            })
            .collect()
    }

    /// Filters that take part in the project cascade
    pub fn enabled_filters(&self) -> Vec<(&Channel, &Filter)> {
        self.filters(false)
    }

    pub fn total_order(&self, include_disabled: bool) -> usize {
        self.filters(include_disabled)
            .iter()
            .map(|(_, f)| f.order)
            .sum()
    }

    /// Biquad sections needed for every selected filter
    pub fn section_count(&self, include_disabled: bool) -> usize {
        self.total_order(include_disabled) / 2
    }

    /// Check every filter, enabled or not, against the target and sample rate
    pub fn validate(&self, target: &Target) -> Result<()> {
        if target.id != self.target {
            return Err(BiquadrError::TargetNotFound {
                id: self.target.to_string(),
            });
        }
        check_sample_rate(self.sample_rate)?;

        let mut channel_names = HashSet::new();
        for channel in &self.channels {
            if !channel_names.insert(channel.name.as_str()) {
                return Err(BiquadrError::DuplicateName {
                    kind: "channel",
                    name: channel.name.clone(),
                });
            }
            let mut filter_names = HashSet::new();
            for filter in &channel.filters {
                if !filter_names.insert(filter.name.as_str()) {
                    return Err(BiquadrError::DuplicateName {
                        kind: "filter",
                        name: filter.name.clone(),
                    });
                }
                filter.validate_for(target, self.sample_rate)?;
            }
        }
        Ok(())
    }

    /// Design the selected filters in project order
    pub fn design_filters(
        &self,
        include_disabled: bool,
        cache: &mut CascadeCache,
    ) -> Result<Vec<DesignedFilter>> {
        self.filters(include_disabled)
            .into_iter()
            .map(|(channel, filter)| {
                let cascade = cache.design(
                    filter.filter_type,
                    filter.order,
                    filter.cutoff_hz,
                    self.sample_rate,
                )?;
                Ok(DesignedFilter {
                    channel: channel.name.clone(),
                    filter: filter.clone(),
                    cascade,
                })
            })
            .collect()
    }

    /// Series combination of every enabled filter's cascade
    pub fn cascade_with(&self, cache: &mut CascadeCache) -> Result<Cascade> {
        let mut combined = Cascade::default();
        for designed in self.design_filters(false, cache)? {
            combined.extend(&designed.cascade);
        }
        Ok(combined)
    }

    pub fn cascade(&self) -> Result<Cascade> {
        self.cascade_with(&mut CascadeCache::new())
    }

    /// Combined response of the enabled filters; flat when there are none
    pub fn response_with(
        &self,
        freq_grid_hz: &[f64],
        phase_mode: PhaseMode,
        cache: &mut CascadeCache,
    ) -> Result<Vec<ResponsePoint>> {
        let cascade = self.cascade_with(cache)?;
        evaluate_with(&cascade, freq_grid_hz, self.sample_rate, phase_mode)
    }

    pub fn response(&self, freq_grid_hz: &[f64]) -> Result<Vec<ResponsePoint>> {
        self.response_with(freq_grid_hz, PhaseMode::Wrapped, &mut CascadeCache::new())
    }

    /// Copy of this project holding a single channel, named `<project>_<channel>`
    pub fn single_channel(&self, channel_name: &str) -> Result<Project> {
        let channel = self
            .channel(channel_name)
            .ok_or_else(|| BiquadrError::NotFound {
                kind: "channel",
                name: channel_name.to_string(),
            })?;
        Ok(Project {
            name: format!("{}_{}", self.name, channel.name),
            target: self.target,
            sample_rate: self.sample_rate,
            channels: vec![channel.clone()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::response::log_frequency_grid;
    use crate::model::{DataType, FilterType};
    use approx::assert_abs_diff_eq;

    fn two_way_project(target: &Target) -> Project {
        let mut project = Project::new("speaker", target.id, 48000.0).unwrap();

        let mut woofer = Channel::new("woofer");
        woofer.add_filter(Filter::highpass("sub", 2, 30.0).unwrap()).unwrap();
        woofer.add_filter(Filter::lowpass("xover", 4, 2000.0).unwrap()).unwrap();

        let mut tweeter = Channel::new("tweeter");
        tweeter.add_filter(Filter::highpass("xover", 4, 2000.0).unwrap()).unwrap();

        project.add_channel(woofer).unwrap();
        project.add_channel(tweeter).unwrap();
        project
    }

    #[test]
    fn test_filters_follow_channel_order() {
        let target = Target::new("dsp", DataType::Float32, 8).unwrap();
        let project = two_way_project(&target);
        let names: Vec<String> = project
            .enabled_filters()
            .iter()
            .map(|(c, f)| format!("{}/{}", c.name, f.name))
            .collect();
        assert_eq!(names, vec!["woofer/sub", "woofer/xover", "tweeter/xover"]);
        assert_eq!(project.total_order(false), 10);
        assert_eq!(project.section_count(false), 5);
    }

    #[test]
    fn test_disabled_filters_and_channels_are_excluded() {
        let target = Target::new("dsp", DataType::Float32, 8).unwrap();
        let mut project = two_way_project(&target);
        project
            .channel_mut("woofer")
            .unwrap()
            .filter_mut("sub")
            .unwrap()
            .enabled = false;
        project.channel_mut("tweeter").unwrap().enabled = false;

        assert_eq!(project.enabled_filters().len(), 1);
        assert_eq!(project.filters(true).len(), 3);
        assert_eq!(project.cascade().unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut channel = Channel::new("main");
        channel.add_filter(Filter::lowpass("lp", 2, 100.0).unwrap()).unwrap();
        let err = channel
            .add_filter(Filter::highpass("lp", 2, 100.0).unwrap())
            .unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_NAME");

        let target = Target::new("dsp", DataType::Float32, 8).unwrap();
        let mut project = two_way_project(&target);
        assert!(project.add_channel(Channel::new("woofer")).is_err());
    }

    #[test]
    fn test_validate_enforces_target_bound_on_disabled_filters() {
        let target = Target::new("small", DataType::Int16, 2).unwrap();
        let mut project = Project::new("p", target.id, 48000.0).unwrap();
        let mut channel = Channel::new("main");
        channel
            .add_filter(Filter::lowpass("lp", 4, 1000.0).unwrap().with_enabled(false))
            .unwrap();
        project.add_channel(channel).unwrap();

        assert!(matches!(
            project.validate(&target).unwrap_err(),
            BiquadrError::InvalidOrder { order: 4, .. }
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_target() {
        let target = Target::new("a", DataType::Int16, 8).unwrap();
        let other = Target::new("b", DataType::Int16, 8).unwrap();
        let project = two_way_project(&target);
        assert!(project.validate(&target).is_ok());
        assert!(project.validate(&other).is_err());
    }

    #[test]
    fn test_lowering_sample_rate_can_invalidate_cutoff() {
        let target = Target::new("dsp", DataType::Float32, 8).unwrap();
        let mut project = two_way_project(&target);
        project.set_sample_rate(3000.0).unwrap();
        assert!(matches!(
            project.validate(&target).unwrap_err(),
            BiquadrError::InvalidFrequency { .. }
        ));
        assert!(project.set_sample_rate(0.0).is_err());
    }

    #[test]
    fn test_response_is_product_of_filters() {
        let target = Target::new("dsp", DataType::Float64, 8).unwrap();
        let project = two_way_project(&target);
        let grid = log_frequency_grid(20.0, 20000.0, 64).unwrap();
        let combined = project.response(&grid).unwrap();

        for (point, &f) in combined.iter().zip(&grid) {
            let mut expected = num_complex::Complex64::new(1.0, 0.0);
            for (_, filter) in project.enabled_filters() {
                expected *= filter.design(48000.0).unwrap().response(f, 48000.0);
            }
            assert_abs_diff_eq!(
                point.magnitude_db,
                20.0 * expected.norm().log10(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_empty_project_response_is_flat() {
        let target = Target::new("dsp", DataType::Float64, 8).unwrap();
        let project = Project::new("empty", target.id, 48000.0).unwrap();
        let points = project.response(&[100.0, 1000.0]).unwrap();
        assert!(points.iter().all(|p| p.magnitude_db == 0.0));
    }

    #[test]
    fn test_design_filters_uses_cache() {
        let target = Target::new("dsp", DataType::Float32, 8).unwrap();
        let project = two_way_project(&target);
        let mut cache = CascadeCache::new();
        let designed = project.design_filters(false, &mut cache).unwrap();
        assert_eq!(designed.len(), 3);
        assert_eq!(designed[2].channel, "tweeter");
        assert_eq!(designed[2].filter.filter_type, FilterType::Highpass);

        project.design_filters(false, &mut cache).unwrap();
        assert_eq!(cache.hits(), 3);
    }

    #[test]
    fn test_single_channel_copy() {
        let target = Target::new("dsp", DataType::Float32, 8).unwrap();
        let project = two_way_project(&target);
        let tweeter = project.single_channel("tweeter").unwrap();
        assert_eq!(tweeter.name, "speaker_tweeter");
        assert_eq!(tweeter.channels().len(), 1);
        assert!(project.single_channel("mid").is_err());
    }
}
