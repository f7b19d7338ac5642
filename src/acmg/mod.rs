//! ACMG/AMP variant classification.
//!
//! Criteria are independent rules evaluated against facts about one
//! contributing variant; the resulting evidence is reduced to a category by a
//! fixed table of weight counts.

pub mod assigner;
pub mod classifier;
pub mod evidence;

pub use assigner::{AcmgAssignment, AcmgContext, AcmgEvidenceAssigner};
pub use classifier::{AcmgClassification, AcmgClassifier};
pub use evidence::{AcmgCriterion, AcmgEvidence, EvidenceStrength, EvidenceTally};
