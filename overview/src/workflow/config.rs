use anyhow::Context;
use candcore::{BeamMask, ClassifierConfig, HistogramConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Thresholds for one batch run, loaded from YAML and/or command-line flags.
///
/// ```yaml
/// classifier:
///   nbeams: 12
///   snr_cut: 8.0
/// histogram:
///   min_bins: 40
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub classifier: ClassifierConfig,
    pub histogram: HistogramConfig,
}

/// Command-line values that take precedence over file or default settings.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub nbeams: Option<u32>,
    pub snr_cut: Option<f32>,
    pub beam_mask: Option<u64>,
    pub nbeams_cut: Option<u32>,
    pub members_cut: Option<u32>,
    pub dm_cut: Option<f32>,
    pub filter_cut: Option<u32>,
    pub filter_max: Option<u32>,
    pub min_bins: Option<usize>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(overrides: &ConfigOverrides) -> Self {
        Self::default().with_overrides(overrides)
    }

    /// Applies flag values on top of this config. Changing the beam count
    /// without an explicit mask enables every beam of the new count.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        let classifier = &mut self.classifier;
        if let Some(nbeams) = overrides.nbeams {
            classifier.nbeams = nbeams;
            if overrides.beam_mask.is_none() {
                classifier.active_beam_mask = BeamMask::all(nbeams);
            }
        }
        if let Some(mask) = overrides.beam_mask {
            classifier.active_beam_mask = BeamMask(mask);
        }
        if let Some(snr_cut) = overrides.snr_cut {
            classifier.snr_cut = snr_cut;
        }
        if let Some(nbeams_cut) = overrides.nbeams_cut {
            classifier.nbeams_cut = nbeams_cut;
        }
        if let Some(members_cut) = overrides.members_cut {
            classifier.members_cut = members_cut;
        }
        if let Some(dm_cut) = overrides.dm_cut {
            classifier.dm_cut = dm_cut;
        }
        if let Some(filter_cut) = overrides.filter_cut {
            classifier.filter_cut = filter_cut;
        }
        if let Some(filter_max) = overrides.filter_max {
            classifier.filter_max = filter_max;
        }
        if let Some(min_bins) = overrides.min_bins {
            self.histogram.min_bins = min_bins;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_unset_defaults() {
        let overrides = ConfigOverrides {
            snr_cut: Some(8.0),
            min_bins: Some(50),
            ..Default::default()
        };
        let cfg = WorkflowConfig::from_args(&overrides);
        assert_eq!(cfg.classifier.snr_cut, 8.0);
        assert_eq!(cfg.classifier.members_cut, 3);
        assert_eq!(cfg.histogram.min_bins, 50);
        assert_eq!(cfg.histogram.dm_max, 1010.0);
    }

    #[test]
    fn beam_count_override_resizes_default_mask() {
        let cfg = WorkflowConfig::from_args(&ConfigOverrides {
            nbeams: Some(12),
            ..Default::default()
        });
        assert_eq!(cfg.classifier.active_beam_mask, BeamMask::all(12));

        let masked = WorkflowConfig::from_args(&ConfigOverrides {
            nbeams: Some(12),
            beam_mask: Some(0b101),
            ..Default::default()
        });
        assert_eq!(masked.classifier.active_beam_mask, BeamMask(0b101));
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"classifier:\n  nbeams: 12\n  dm_cut: 2.5\nhistogram:\n  min_bins: 40\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.classifier.nbeams, 12);
        assert_eq!(cfg.classifier.dm_cut, 2.5);
        assert_eq!(cfg.classifier.snr_cut, 6.5);
        assert_eq!(cfg.histogram.min_bins, 40);
    }

    #[test]
    fn config_load_reports_bad_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"classifier: [1, 2\n").unwrap();
        let path = temp.into_temp_path();
        let err = WorkflowConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing workflow config"));
    }
}
