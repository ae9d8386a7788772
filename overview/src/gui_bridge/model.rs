use crate::workflow::runner::WorkflowResult;
use candcore::{BeamHistograms, Candidate, Category, CategoryCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything an external renderer needs to draw the candidate overview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewModel {
    pub counts: CategoryCounts,
    /// Members of each category, keyed by category name.
    pub categories: BTreeMap<Category, Vec<Candidate>>,
    pub histograms: BeamHistograms,
    pub notes: Vec<String>,
}

impl OverviewModel {
    pub fn from_result(result: &WorkflowResult) -> Self {
        let populated = result
            .histograms
            .iter()
            .filter(|h| h.candidates > 0)
            .count();
        let clipped: usize = result.histograms.iter().map(|h| h.clipped_high).sum();
        Self {
            counts: result.counts,
            categories: result
                .classification
                .iter()
                .map(|(category, members)| (category, members.to_vec()))
                .collect(),
            histograms: result.histograms.clone(),
            notes: vec![
                format!("{} candidates classified", result.counts.total()),
                format!(
                    "{} of {} beams populated",
                    populated,
                    result.histograms.len()
                ),
                format!("{} candidates above DM range", clipped),
            ],
        }
    }
}
