use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use candcore::prelude::BatchStage;
use candcore::telemetry::{MetricsRecorder, MetricsSnapshot};
use candcore::{BeamHistograms, Candidate, CategoryCounts, Classification, Classifier, HistogramBuilder};
use std::sync::Arc;

#[derive(Debug)]
pub struct WorkflowResult {
    pub classification: Classification,
    pub counts: CategoryCounts,
    pub histograms: BeamHistograms,
}

/// Classifies a closed batch and builds its per-beam DM histograms.
#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn execute(&self, candidates: &[Candidate]) -> anyhow::Result<WorkflowResult> {
        let result = self.run_stages(candidates);
        match &result {
            Ok(_) => self.metrics.record_batch(candidates.len()),
            Err(_) => self.metrics.record_rejected(),
        }
        result
    }

    fn run_stages(&self, candidates: &[Candidate]) -> anyhow::Result<WorkflowResult> {
        let classifier = Classifier::new(self.config.classifier.clone())
            .context("configuring classifier")?;
        let histogram_builder =
            HistogramBuilder::new(self.config.histogram.clone(), self.config.classifier.nbeams)
                .context("configuring DM histograms")?;

        let classification = classifier
            .execute(candidates)
            .with_context(|| format!("executing {} stage", classifier.name()))?;
        let histograms = histogram_builder
            .execute(candidates)
            .with_context(|| format!("executing {} stage", histogram_builder.name()))?;
        let counts = classification.counts();

        Ok(WorkflowResult {
            classification,
            counts,
            histograms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_candidates_from_config, GeneratorConfig};
    use crate::workflow::config::ConfigOverrides;

    #[test]
    fn runner_executes_workflow() {
        let cfg = WorkflowConfig::from_args(&ConfigOverrides {
            nbeams: Some(8),
            ..Default::default()
        });
        let runner = Runner::new(cfg);
        let candidates = build_candidates_from_config(&GeneratorConfig {
            nbeams: 8,
            count: 200,
            ..Default::default()
        })
        .unwrap();
        let result = runner.execute(&candidates).unwrap();
        assert_eq!(result.counts.total(), candidates.len());
        assert_eq!(result.histograms.len(), 8);
        assert_eq!(runner.metrics().batches, 1);
    }

    #[test]
    fn runner_handles_empty_batch() {
        let runner = Runner::new(WorkflowConfig::default());
        let result = runner.execute(&[]).unwrap();
        assert_eq!(result.counts, CategoryCounts::default());
        assert_eq!(result.histograms.len(), 40);
        assert!(result.histograms.iter().all(|h| h.bins.len() == 30));
    }

    #[test]
    fn runner_rejects_out_of_range_beam() {
        let cfg = WorkflowConfig::from_args(&ConfigOverrides {
            nbeams: Some(2),
            ..Default::default()
        });
        let runner = Runner::new(cfg);
        let cand = Candidate::single_beam(9.0, 0, 0.0, 0, 0, 50.0, 5, 0, 0, 5);
        let err = runner.execute(&[cand]).unwrap_err();
        assert!(format!("{:#}", err).contains("beam 5"));
        assert_eq!(runner.metrics().rejected, 1);
    }

    #[test]
    fn runner_rejects_bad_config() {
        let mut cfg = WorkflowConfig::default();
        cfg.classifier.dm_cut = -2.0;
        let err = Runner::new(cfg).execute(&[]).unwrap_err();
        assert!(err.to_string().contains("configuring classifier"));
    }
}
