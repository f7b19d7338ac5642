use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::parsers::open_file;
use crate::types::GeneCandidate;

/// Annotated, pre-filtered candidate genes for one family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSet {
    /// Sequenced sample names, in input order.
    pub samples: Vec<String>,
    pub genes: Vec<GeneCandidate>,
}

impl CandidateSet {
    pub fn variant_count(&self) -> usize {
        self.genes.iter().map(|g| g.variants.len()).sum()
    }
}

/// Reader for the JSON candidate document produced by the annotation stage
pub struct CandidateParser;

impl CandidateParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path) -> Result<CandidateSet> {
        let reader = open_file(path)?;
        let set: CandidateSet = serde_json::from_reader(reader)
            .with_context(|| format!("Invalid candidate JSON: {}", path.display()))?;
        self.check_samples(&set)
            .with_context(|| format!("Inconsistent candidates: {}", path.display()))?;
        Ok(set)
    }

    /// Every genotype must belong to a declared sample.
    fn check_samples(&self, set: &CandidateSet) -> Result<()> {
        let declared: BTreeSet<&str> = set.samples.iter().map(String::as_str).collect();
        let undeclared: BTreeSet<&str> = set
            .genes
            .iter()
            .flat_map(|g| g.variants.iter())
            .flat_map(|v| v.genotypes.keys())
            .map(String::as_str)
            .filter(|s| !declared.contains(s))
            .collect();

        if undeclared.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "Genotypes for undeclared samples: {}",
                undeclared.into_iter().collect::<Vec<_>>().join(", ")
            ))
        }
    }
}

impl Default for CandidateParser {
    fn default() -> Self {
        Self::new()
    }
}
