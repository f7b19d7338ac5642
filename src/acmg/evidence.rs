use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Criteria this engine can assign
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AcmgCriterion {
    /// Null variant in a gene where loss of function causes disease.
    PVS1,
    /// De novo in a patient with no family history.
    PS2,
    /// Absent from population databases.
    PM2,
    /// Detected in trans with a pathogenic variant (recessive).
    PM3,
    /// Protein length change from a stop-loss.
    PM4,
    /// Computational evidence supports a deleterious effect.
    PP3,
    /// Phenotype highly specific for the gene's disease.
    PP4,
    /// Reputable source reports the variant as pathogenic.
    PP5,
    /// Allele frequency above 5%.
    BA1,
    /// Lack of segregation in affected members of a family.
    BS4,
    /// Computational evidence suggests no impact.
    BP4,
    /// Reputable source reports the variant as benign.
    BP6,
}

impl AcmgCriterion {
    pub fn is_pathogenic(&self) -> bool {
        !self.is_benign()
    }

    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            AcmgCriterion::BA1 | AcmgCriterion::BS4 | AcmgCriterion::BP4 | AcmgCriterion::BP6
        )
    }

    /// Weight the criterion carries when not modified.
    pub fn default_strength(&self) -> EvidenceStrength {
        match self {
            AcmgCriterion::PVS1 => EvidenceStrength::VeryStrong,
            AcmgCriterion::PS2 | AcmgCriterion::BS4 => EvidenceStrength::Strong,
            AcmgCriterion::PM2 | AcmgCriterion::PM3 | AcmgCriterion::PM4 => {
                EvidenceStrength::Moderate
            }
            AcmgCriterion::PP3
            | AcmgCriterion::PP4
            | AcmgCriterion::PP5
            | AcmgCriterion::BP4
            | AcmgCriterion::BP6 => EvidenceStrength::Supporting,
            AcmgCriterion::BA1 => EvidenceStrength::StandAlone,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStrength {
    StandAlone,
    VeryStrong,
    Strong,
    Moderate,
    Supporting,
}

impl EvidenceStrength {
    fn label(&self) -> &'static str {
        match self {
            EvidenceStrength::StandAlone => "StandAlone",
            EvidenceStrength::VeryStrong => "VeryStrong",
            EvidenceStrength::Strong => "Strong",
            EvidenceStrength::Moderate => "Moderate",
            EvidenceStrength::Supporting => "Supporting",
        }
    }
}

/// Set of assigned criteria, each at one strength.
///
/// Keyed by criterion, so the insertion order never affects equality or the
/// classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcmgEvidence {
    items: BTreeMap<AcmgCriterion, EvidenceStrength>,
}

impl AcmgEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, criterion: AcmgCriterion, strength: EvidenceStrength) {
        self.items.insert(criterion, strength);
    }

    pub fn contains(&self, criterion: AcmgCriterion) -> bool {
        self.items.contains_key(&criterion)
    }

    pub fn strength_of(&self, criterion: AcmgCriterion) -> Option<EvidenceStrength> {
        self.items.get(&criterion).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AcmgCriterion, EvidenceStrength)> + '_ {
        self.items.iter().map(|(c, s)| (*c, *s))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tally(&self) -> EvidenceTally {
        let mut tally = EvidenceTally::default();
        for (criterion, strength) in self.iter() {
            if criterion.is_pathogenic() {
                match strength {
                    EvidenceStrength::StandAlone | EvidenceStrength::VeryStrong => {
                        tally.very_strong += 1
                    }
                    EvidenceStrength::Strong => tally.strong += 1,
                    EvidenceStrength::Moderate => tally.moderate += 1,
                    EvidenceStrength::Supporting => tally.supporting += 1,
                }
            } else {
                match strength {
                    EvidenceStrength::StandAlone => tally.stand_alone += 1,
                    EvidenceStrength::VeryStrong | EvidenceStrength::Strong => {
                        tally.benign_strong += 1
                    }
                    EvidenceStrength::Moderate | EvidenceStrength::Supporting => {
                        tally.benign_supporting += 1
                    }
                }
            }
        }
        tally
    }
}

impl FromIterator<(AcmgCriterion, EvidenceStrength)> for AcmgEvidence {
    fn from_iter<I: IntoIterator<Item = (AcmgCriterion, EvidenceStrength)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// `PVS1, PM2, PP5_Strong`: modified strengths are suffixed.
impl fmt::Display for AcmgEvidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self
            .iter()
            .map(|(criterion, strength)| {
                if strength == criterion.default_strength() {
                    format!("{:?}", criterion)
                } else {
                    format!("{:?}_{}", criterion, strength.label())
                }
            })
            .collect();
        f.write_str(&labels.join(", "))
    }
}

/// Number of evidence items per weight, pathogenic and benign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvidenceTally {
    pub very_strong: u8,
    pub strong: u8,
    pub moderate: u8,
    pub supporting: u8,
    pub stand_alone: u8,
    pub benign_strong: u8,
    pub benign_supporting: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally() {
        let evidence: AcmgEvidence = [
            (AcmgCriterion::PVS1, EvidenceStrength::VeryStrong),
            (AcmgCriterion::PM2, EvidenceStrength::Moderate),
            (AcmgCriterion::PP5, EvidenceStrength::Strong),
            (AcmgCriterion::BP6, EvidenceStrength::Supporting),
        ]
        .into_iter()
        .collect();

        let tally = evidence.tally();
        assert_eq!(tally.very_strong, 1);
        assert_eq!(tally.strong, 1);
        assert_eq!(tally.moderate, 1);
        assert_eq!(tally.supporting, 0);
        assert_eq!(tally.benign_supporting, 1);
    }

    #[test]
    fn test_display_marks_modified_strength() {
        let mut evidence = AcmgEvidence::new();
        evidence.add(AcmgCriterion::PP5, EvidenceStrength::Strong);
        evidence.add(AcmgCriterion::PVS1, EvidenceStrength::VeryStrong);
        assert_eq!(evidence.to_string(), "PVS1, PP5_Strong");
    }
}
