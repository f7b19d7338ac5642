//! Phenotype prioritization results attached to genes.
//!
//! Each prioritizer produces a different shape of result; they are carried as
//! one tagged enum with a single comparable `score()`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::ModeOfInheritance;

/// Phenotype prioritization algorithms, in the order their combined-score
/// models are preferred
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityType {
    /// Cross-species phenotype similarity (human, mouse, fish models).
    PhenotypeSimilarity,
    /// Mouse orthology phenotype similarity only.
    OrthologySimilarity,
    /// Legacy human-only semantic similarity.
    Legacy,
    /// Known disease-gene associations.
    DiseaseDatabase,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Organism {
    Human,
    Mouse,
    Fish,
}

/// Disease with its reported modes of inheritance. Empty means unknown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disease {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inheritance_modes: BTreeSet<ModeOfInheritance>,
}

impl Disease {
    pub fn is_compatible_with(&self, mode: ModeOfInheritance) -> bool {
        mode == ModeOfInheritance::Any
            || self.inheritance_modes.is_empty()
            || self.inheritance_modes.contains(&mode)
    }
}

/// Phenotype match between the patient and one model (disease or organism)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelPhenotypeMatch {
    pub model_id: String,
    pub organism: Organism,
    pub score: f64,
    #[serde(default)]
    pub disease: Option<Disease>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityResult {
    PhenotypeSimilarity {
        score: f64,
        #[serde(default)]
        matches: Vec<ModelPhenotypeMatch>,
    },
    OrthologySimilarity {
        score: f64,
    },
    Legacy {
        score: f64,
    },
    DiseaseDatabase {
        #[serde(default)]
        diseases: Vec<Disease>,
    },
}

impl PriorityResult {
    pub fn priority_type(&self) -> PriorityType {
        match self {
            PriorityResult::PhenotypeSimilarity { .. } => PriorityType::PhenotypeSimilarity,
            PriorityResult::OrthologySimilarity { .. } => PriorityType::OrthologySimilarity,
            PriorityResult::Legacy { .. } => PriorityType::Legacy,
            PriorityResult::DiseaseDatabase { .. } => PriorityType::DiseaseDatabase,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            PriorityResult::PhenotypeSimilarity { score, .. }
            | PriorityResult::OrthologySimilarity { score }
            | PriorityResult::Legacy { score } => *score,
            // Only meaningful as a per-mode modifier.
            PriorityResult::DiseaseDatabase { .. } => 1.0,
        }
    }

    /// Known-disease inheritance modifier in [0, 1].
    ///
    /// 1.0 when no disease is known for the gene or any known disease is
    /// compatible with `mode`, 0.5 otherwise. Non-database results return 1.0.
    pub fn inheritance_modifier(&self, mode: ModeOfInheritance) -> f64 {
        match self {
            PriorityResult::DiseaseDatabase { diseases } => {
                if diseases.is_empty() || diseases.iter().any(|d| d.is_compatible_with(mode)) {
                    1.0
                } else {
                    0.5
                }
            }
            _ => 1.0,
        }
    }

    /// Human disease matches whose inheritance fits `mode`.
    pub fn compatible_disease_matches(
        &self,
        mode: ModeOfInheritance,
    ) -> Vec<&ModelPhenotypeMatch> {
        match self {
            PriorityResult::PhenotypeSimilarity { matches, .. } => matches
                .iter()
                .filter(|m| m.organism == Organism::Human)
                .filter(|m| m.disease.as_ref().map_or(true, |d| d.is_compatible_with(mode)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Best score among non-human model organisms.
    pub fn best_cross_species_score(&self) -> f64 {
        match self {
            PriorityResult::PhenotypeSimilarity { matches, .. } => matches
                .iter()
                .filter(|m| m.organism != Organism::Human)
                .map(|m| m.score)
                .fold(0.0, f64::max),
            _ => 0.0,
        }
    }
}
