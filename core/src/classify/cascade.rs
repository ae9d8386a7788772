use crate::candidate::Candidate;
use crate::classify::coincidence::BeamCoincidenceCounter;
use crate::classify::config::ClassifierConfig;
use crate::prelude::{BatchStage, CoreError, CoreResult};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of the cascade. Variants are declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hidden,
    Noise,
    CoincidentRfi,
    FatRfi,
    LowdmRfi,
    Valid,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Hidden,
        Category::Noise,
        Category::CoincidentRfi,
        Category::FatRfi,
        Category::LowdmRfi,
        Category::Valid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Hidden => "hidden",
            Category::Noise => "noise",
            Category::CoincidentRfi => "coincident_rfi",
            Category::FatRfi => "fat_rfi",
            Category::LowdmRfi => "lowdm_rfi",
            Category::Valid => "valid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Hidden => "hidden",
            Category::Noise => "noise spikes",
            Category::CoincidentRfi => "coincident RFI",
            Category::FatRfi => "fat RFI",
            Category::LowdmRfi => "low-DM RFI",
            Category::Valid => "valid candidates",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-category tallies of one classified batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub hidden: usize,
    pub noise: usize,
    pub coincident_rfi: usize,
    pub fat_rfi: usize,
    pub lowdm_rfi: usize,
    pub valid: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Hidden => self.hidden,
            Category::Noise => self.noise,
            Category::CoincidentRfi => self.coincident_rfi,
            Category::FatRfi => self.fat_rfi,
            Category::LowdmRfi => self.lowdm_rfi,
            Category::Valid => self.valid,
        }
    }

    fn slot(&mut self, category: Category) -> &mut usize {
        match category {
            Category::Hidden => &mut self.hidden,
            Category::Noise => &mut self.noise,
            Category::CoincidentRfi => &mut self.coincident_rfi,
            Category::FatRfi => &mut self.fat_rfi,
            Category::LowdmRfi => &mut self.lowdm_rfi,
            Category::Valid => &mut self.valid,
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|&c| self.get(c)).sum()
    }
}

impl fmt::Display for CategoryCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, category) in Category::ALL.iter().enumerate() {
            let lead = if idx == 0 { "Classified" } else { "          " };
            writeln!(f, "{} {} as {}", lead, self.get(*category), category.label())?;
        }
        Ok(())
    }
}

/// Partition of a batch into the six categories.
///
/// Every category key is present, even when empty, and candidates keep their
/// input order within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    labels: Vec<Category>,
    categories: BTreeMap<Category, Vec<Candidate>>,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            categories: Category::ALL.iter().map(|&c| (c, Vec::new())).collect(),
        }
    }
}

impl Classification {
    pub fn get(&self, category: Category) -> &[Candidate] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Category assigned to the candidate at `index` of the input batch.
    pub fn label_of(&self, index: usize) -> Option<Category> {
        self.labels.get(index).copied()
    }

    pub fn labels(&self) -> &[Category] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[Candidate])> {
        self.categories.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    pub fn counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for (category, members) in &self.categories {
            *counts.slot(*category) = members.len();
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// First-match classification cascade over a fixed configuration.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    coincidence: BeamCoincidenceCounter,
    logger: LogManager,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> CoreResult<Self> {
        config.validate()?;
        let coincidence = BeamCoincidenceCounter::new(config.active_beam_mask, config.nbeams);
        Ok(Self {
            config,
            coincidence,
            logger: LogManager::new(),
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn is_hidden(&self, cand: &Candidate) -> bool {
        let active = self.config.active_beam_mask.contains(cand.beam);
        cand.snr < self.config.snr_cut
            || cand.filter_width > self.config.filter_cut
            || !active
            // secondary beams of a coincident event defer to the primary beam
            || (active && cand.beam != cand.primary_beam)
    }

    /// Assigns the first matching category; later predicates are not consulted.
    pub fn categorize(&self, cand: &Candidate) -> Category {
        if self.is_hidden(cand) {
            Category::Hidden
        } else if cand.members < self.config.members_cut {
            Category::Noise
        } else if self.coincidence.count(cand.beam_mask) > self.config.nbeams_cut {
            Category::CoincidentRfi
        } else if cand.filter_width >= self.config.filter_max {
            Category::FatRfi
        } else if cand.dm < self.config.dm_cut {
            Category::LowdmRfi
        } else {
            Category::Valid
        }
    }

    /// Cheap sanity pass run before classifying a batch.
    pub fn check(&self, candidates: &[Candidate]) -> CoreResult<()> {
        for (index, cand) in candidates.iter().enumerate() {
            if cand.beam >= self.config.nbeams {
                return Err(CoreError::Validation {
                    index,
                    reason: format!(
                        "beam {} outside [0, {})",
                        cand.beam, self.config.nbeams
                    ),
                });
            }
            if let Some(field) = cand.non_finite_field() {
                return Err(CoreError::Validation {
                    index,
                    reason: format!("{} is not finite", field),
                });
            }
        }
        Ok(())
    }

    pub fn classify(&self, candidates: &[Candidate]) -> CoreResult<Classification> {
        self.check(candidates)?;

        let mut result = Classification::default();
        result.labels.reserve(candidates.len());
        for cand in candidates {
            let category = self.categorize(cand);
            result.labels.push(category);
            result
                .categories
                .entry(category)
                .or_default()
                .push(cand.clone());
        }

        if result.is_empty() {
            self.logger.warn("Classifier received an empty batch");
        }
        let counts = result.counts();
        self.logger.record(&format!(
            "Classifier hidden={} noise={} coincident_rfi={} fat_rfi={} lowdm_rfi={} valid={}",
            counts.hidden,
            counts.noise,
            counts.coincident_rfi,
            counts.fat_rfi,
            counts.lowdm_rfi,
            counts.valid
        ));
        Ok(result)
    }
}

impl BatchStage for Classifier {
    type Output = Classification;

    fn name(&self) -> &'static str {
        "classifier"
    }

    fn execute(&self, candidates: &[Candidate]) -> CoreResult<Classification> {
        self.classify(candidates)
    }
}
