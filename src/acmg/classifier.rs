use serde::{Deserialize, Serialize};
use std::fmt;

use super::evidence::{AcmgEvidence, EvidenceTally};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcmgClassification {
    Pathogenic,
    LikelyPathogenic,
    UncertainSignificance,
    LikelyBenign,
    Benign,
}

impl fmt::Display for AcmgClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AcmgClassification::Pathogenic => "Pathogenic",
            AcmgClassification::LikelyPathogenic => "Likely pathogenic",
            AcmgClassification::UncertainSignificance => "Uncertain significance",
            AcmgClassification::LikelyBenign => "Likely benign",
            AcmgClassification::Benign => "Benign",
        };
        f.write_str(label)
    }
}

/// Minimum counts of pathogenic evidence (very strong, strong, moderate, supporting)
#[derive(Debug, Clone, Copy)]
struct PathogenicRow(u8, u8, u8, u8);

/// Minimum counts of benign evidence (stand-alone, strong, supporting)
#[derive(Debug, Clone, Copy)]
struct BenignRow(u8, u8, u8);

impl PathogenicRow {
    fn is_met(&self, t: &EvidenceTally) -> bool {
        t.very_strong >= self.0
            && t.strong >= self.1
            && t.moderate >= self.2
            && t.supporting >= self.3
    }
}

impl BenignRow {
    fn is_met(&self, t: &EvidenceTally) -> bool {
        t.stand_alone >= self.0 && t.benign_strong >= self.1 && t.benign_supporting >= self.2
    }
}

// Richards et al. 2015, Table 5.
const PATHOGENIC: [PathogenicRow; 8] = [
    PathogenicRow(1, 1, 0, 0),
    PathogenicRow(1, 0, 2, 0),
    PathogenicRow(1, 0, 1, 1),
    PathogenicRow(1, 0, 0, 2),
    PathogenicRow(0, 2, 0, 0),
    PathogenicRow(0, 1, 3, 0),
    PathogenicRow(0, 1, 2, 2),
    PathogenicRow(0, 1, 1, 4),
];

const LIKELY_PATHOGENIC: [PathogenicRow; 6] = [
    PathogenicRow(1, 0, 1, 0),
    PathogenicRow(0, 1, 1, 0),
    PathogenicRow(0, 1, 0, 2),
    PathogenicRow(0, 0, 3, 0),
    PathogenicRow(0, 0, 2, 2),
    PathogenicRow(0, 0, 1, 4),
];

const BENIGN: [BenignRow; 2] = [BenignRow(1, 0, 0), BenignRow(0, 2, 0)];

const LIKELY_BENIGN: [BenignRow; 2] = [BenignRow(0, 1, 1), BenignRow(0, 0, 2)];

/// Reduces evidence to a classification. Conflicting or insufficient
/// evidence is uncertain.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcmgClassifier;

impl AcmgClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, evidence: &AcmgEvidence) -> AcmgClassification {
        let tally = evidence.tally();

        let pathogenic = if PATHOGENIC.iter().any(|r| r.is_met(&tally)) {
            Some(AcmgClassification::Pathogenic)
        } else if LIKELY_PATHOGENIC.iter().any(|r| r.is_met(&tally)) {
            Some(AcmgClassification::LikelyPathogenic)
        } else {
            None
        };

        let benign = if BENIGN.iter().any(|r| r.is_met(&tally)) {
            Some(AcmgClassification::Benign)
        } else if LIKELY_BENIGN.iter().any(|r| r.is_met(&tally)) {
            Some(AcmgClassification::LikelyBenign)
        } else {
            None
        };

        match (pathogenic, benign) {
            (Some(p), None) => p,
            (None, Some(b)) => b,
            _ => AcmgClassification::UncertainSignificance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acmg::evidence::{AcmgCriterion, EvidenceStrength};

    fn classify(items: &[(AcmgCriterion, EvidenceStrength)]) -> AcmgClassification {
        AcmgClassifier::new().classify(&items.iter().copied().collect())
    }

    use AcmgCriterion::*;
    use EvidenceStrength::*;

    #[test]
    fn test_empty_is_uncertain() {
        assert_eq!(classify(&[]), AcmgClassification::UncertainSignificance);
    }

    #[test]
    fn test_pathogenic_rows() {
        assert_eq!(
            classify(&[(PVS1, VeryStrong), (PS2, Strong)]),
            AcmgClassification::Pathogenic
        );
        assert_eq!(
            classify(&[(PVS1, VeryStrong), (PM2, Moderate), (PP3, Supporting)]),
            AcmgClassification::Pathogenic
        );
        assert_eq!(
            classify(&[(PS2, Strong), (PP5, Strong)]),
            AcmgClassification::Pathogenic
        );
    }

    #[test]
    fn test_likely_pathogenic_rows() {
        assert_eq!(
            classify(&[(PVS1, VeryStrong), (PM2, Moderate)]),
            AcmgClassification::LikelyPathogenic
        );
        assert_eq!(
            classify(&[(PS2, Strong), (PM2, Moderate)]),
            AcmgClassification::LikelyPathogenic
        );
        assert_eq!(
            classify(&[(PVS1, VeryStrong)]),
            AcmgClassification::UncertainSignificance
        );
    }

    #[test]
    fn test_benign_rows() {
        assert_eq!(classify(&[(BA1, StandAlone)]), AcmgClassification::Benign);
        assert_eq!(
            classify(&[(BS4, Strong), (BP6, Supporting)]),
            AcmgClassification::LikelyBenign
        );
        assert_eq!(
            classify(&[(BP4, Supporting), (BP6, Supporting)]),
            AcmgClassification::LikelyBenign
        );
    }

    #[test]
    fn test_conflict_is_uncertain() {
        assert_eq!(
            classify(&[(PVS1, VeryStrong), (PS2, Strong), (BA1, StandAlone)]),
            AcmgClassification::UncertainSignificance
        );
    }
}
