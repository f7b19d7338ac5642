//! Combined gene scores and their bootstrap p-values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::priority::{ModelPhenotypeMatch, PriorityResult, PriorityType};
use crate::types::{CandidateVariant, GeneCandidate, ModeOfInheritance};

/// `1 / (1 + e^-(b0 + b1 * phenotype + b2 * variant))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
}

impl LogisticModel {
    pub const PHENOTYPE_SIMILARITY: LogisticModel = LogisticModel {
        b0: -13.28813,
        b1: 10.39451,
        b2: 9.18381,
    };
    pub const ORTHOLOGY_SIMILARITY: LogisticModel = LogisticModel {
        b0: -11.15659,
        b1: 13.21835,
        b2: 4.08667,
    };
    pub const LEGACY: LogisticModel = LogisticModel {
        b0: -10.28769,
        b1: 11.24197,
        b2: 6.73425,
    };

    pub fn score(&self, phenotype_score: f64, variant_score: f64) -> f64 {
        let logit = self.b0 + self.b1 * phenotype_score + self.b2 * variant_score;
        1.0 / (1.0 + (-logit).exp())
    }
}

/// How phenotype and variant scores are merged for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombinedScoreModel {
    Logistic(PriorityType, LogisticModel),
    Mean,
}

impl CombinedScoreModel {
    /// Preferred model over the prioritizers that produced results.
    pub fn select(active: &BTreeSet<PriorityType>) -> Self {
        const PREFERENCE: [(PriorityType, LogisticModel); 3] = [
            (PriorityType::PhenotypeSimilarity, LogisticModel::PHENOTYPE_SIMILARITY),
            (PriorityType::OrthologySimilarity, LogisticModel::ORTHOLOGY_SIMILARITY),
            (PriorityType::Legacy, LogisticModel::LEGACY),
        ];

        PREFERENCE
            .iter()
            .find(|(priority, _)| active.contains(priority))
            .map_or(CombinedScoreModel::Mean, |&(priority, model)| {
                CombinedScoreModel::Logistic(priority, model)
            })
    }

    pub fn combined_score(&self, phenotype_score: f64, variant_score: f64) -> f64 {
        match self {
            CombinedScoreModel::Logistic(_, model) => model.score(phenotype_score, variant_score),
            CombinedScoreModel::Mean => (phenotype_score + variant_score) / 2.0,
        }
    }

    pub fn name(&self) -> String {
        match self {
            CombinedScoreModel::Logistic(priority, _) => format!("logistic({:?})", priority),
            CombinedScoreModel::Mean => "mean".to_string(),
        }
    }
}

/// Mean score of the contributing variants, 0 when there are none.
pub fn variant_score(contributing: &[&CandidateVariant]) -> f64 {
    if contributing.is_empty() {
        return 0.0;
    }
    contributing.iter().map(|v| v.variant_score()).sum::<f64>() / contributing.len() as f64
}

/// Phenotype score of `gene` under `mode`, with the human disease matches
/// that are compatible with that mode.
///
/// The primary (non disease-database) score is scaled by the known-disease
/// inheritance modifier. When the phenotype-similarity result carries
/// compatible disease matches, the score becomes the better of the best
/// non-human model and the best compatible disease. Genes without any
/// prioritization result score 1.0.
pub fn phenotype_score(
    gene: &GeneCandidate,
    mode: ModeOfInheritance,
) -> (f64, Vec<ModelPhenotypeMatch>) {
    if gene.priority_results.is_empty() {
        return (1.0, Vec::new());
    }

    let primary = gene
        .priority_results
        .values()
        .find(|r| r.priority_type() != PriorityType::DiseaseDatabase)
        .map_or(1.0, PriorityResult::score);
    let modifier = gene
        .priority_results
        .get(&PriorityType::DiseaseDatabase)
        .map_or(1.0, |r| r.inheritance_modifier(mode));

    if let Some(similarity) = gene.priority_results.get(&PriorityType::PhenotypeSimilarity) {
        let matches = similarity.compatible_disease_matches(mode);
        if !matches.is_empty() {
            let best_disease = matches.iter().map(|m| m.score).fold(0.0, f64::max);
            let score = similarity.best_cross_species_score().max(best_disease);
            return (score, matches.into_iter().cloned().collect());
        }
    }

    (primary * modifier, Vec::new())
}

/// Sorted population of combined scores expected by chance
#[derive(Debug, Clone, Default)]
pub struct NullDistribution {
    scores: Vec<f64>,
}

impl NullDistribution {
    pub const DEFAULT_SIZE: usize = 500_000;
    const CHUNK_SIZE: usize = 10_000;

    pub fn empty() -> Self {
        Self::default()
    }

    /// Pair phenotype scores resampled with replacement from `phenotype_scores`
    /// with uniform [0, 1) variant scores, through `model`.
    ///
    /// Chunks are drawn in parallel, chunk `i` from a generator seeded with
    /// `seed + i`. Without a seed the base is random.
    pub fn bootstrap(
        phenotype_scores: &[f64],
        size: usize,
        model: &CombinedScoreModel,
        seed: Option<u64>,
    ) -> Self {
        if phenotype_scores.is_empty() || size == 0 {
            warn!("No phenotype scores to resample, p-values will all be 1.0");
            return Self::empty();
        }

        let base_seed = seed.unwrap_or_else(rand::random);
        let chunks = (size + Self::CHUNK_SIZE - 1) / Self::CHUNK_SIZE;

        let mut scores: Vec<f64> = (0..chunks)
            .into_par_iter()
            .flat_map_iter(|chunk| {
                let len = Self::CHUNK_SIZE.min(size - chunk * Self::CHUNK_SIZE);
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(chunk as u64));
                (0..len)
                    .map(|_| {
                        let pick = rng.gen_range(0..phenotype_scores.len());
                        let phenotype = phenotype_scores[pick];
                        let variant: f64 = rng.gen();
                        model.combined_score(phenotype, variant)
                    })
                    .collect::<Vec<f64>>()
            })
            .collect();
        scores.par_sort_unstable_by(f64::total_cmp);

        debug!(
            "Built null distribution of {} scores with the {} model",
            scores.len(),
            model.name()
        );
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// `(1 + #{null >= score}) / N`, capped at 1. Exactly 1.0 for a zero
    /// score or an empty population.
    pub fn p_value(&self, score: f64) -> f64 {
        if self.scores.is_empty() || score <= 0.0 {
            return 1.0;
        }
        let below = self.scores.partition_point(|s| *s < score);
        let at_least = self.scores.len() - below;
        ((1 + at_least) as f64 / self.scores.len() as f64).min(1.0)
    }
}
