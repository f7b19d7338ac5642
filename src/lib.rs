//! # Gene Prioritizer
//!
//! Ranks candidate disease genes for a proband and classifies the variants
//! that explain them.
//!
//! ## Features
//!
//! - Inheritance compatibility per mode against a family pedigree (PED or JSON)
//! - Contributing allele selection with compound-heterozygous and
//!   incomplete-penetrance handling
//! - Logistic combination of phenotype and variant scores, with p-values from
//!   a seeded bootstrap null population
//! - ACMG evidence assignment and Richards 2015 classification
//! - Multi-threaded scoring across genes
//! - JSON and TSV reports

pub mod acmg;
pub mod alleles;
pub mod analysis;
pub mod config;
pub mod constraint;
pub mod error;
pub mod inheritance;
pub mod mendelian;
pub mod output;
pub mod parsers;
pub mod pedigree;
pub mod priority;
pub mod regions;
pub mod scoring;
pub mod types;

// Re-export key types
pub use acmg::{AcmgAssignment, AcmgClassification, AcmgClassifier, AcmgEvidence};
pub use analysis::{AnalysisResults, GenePrioritizer};
pub use config::AnalysisConfig;
pub use constraint::GeneConstraints;
pub use error::{PedigreeError, PrioritizerError};
pub use mendelian::{MendelianChecker, PedigreeMendelianChecker};
pub use output::{ReportFormat, ReportGenerator};
pub use pedigree::Pedigree;
pub use priority::{PriorityResult, PriorityType};
pub use types::*;
