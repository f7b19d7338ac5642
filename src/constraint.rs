//! Per-gene loss-of-function constraint metrics (pLI, LOEUF).
//!
//! The table is loaded once per process and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::error::ConstraintError;

/// Default table shipped with the crate.
const PACKAGED_TABLE: &str = include_str!("../resources/gene_constraints.tsv");

/// pLI at or above this marks a gene as LOF-intolerant.
pub const PLI_INTOLERANT: f64 = 0.9;
/// LOEUF below this marks a gene as LOF-intolerant.
pub const LOEUF_INTOLERANT: f64 = 0.6;

static GENE_CONSTRAINTS: OnceLock<GeneConstraints> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneConstraint {
    pub gene_symbol: String,
    pub transcript: String,
    pub pli: f64,
    pub loeuf: f64,
    pub loeuf_lower: f64,
    pub loeuf_upper: f64,
}

impl GeneConstraint {
    pub fn is_loss_of_function_intolerant(&self) -> bool {
        self.pli >= PLI_INTOLERANT || self.loeuf < LOEUF_INTOLERANT
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneConstraints {
    by_symbol: HashMap<String, GeneConstraint>,
}

impl GeneConstraints {
    /// Parse a tab-separated table with a header row. Malformed rows are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConstraintError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(reader);
        csv_reader.headers()?;

        let mut by_symbol = HashMap::new();
        let mut skipped = 0usize;
        for (row, record) in csv_reader.deserialize::<GeneConstraint>().enumerate() {
            match record {
                Ok(constraint) => {
                    by_symbol.insert(constraint.gene_symbol.clone(), constraint);
                }
                Err(e) => {
                    warn!("Skipping malformed gene constraint row {}: {}", row + 2, e);
                    skipped += 1;
                }
            }
        }

        info!(
            "Loaded constraint metrics for {} genes ({} rows skipped)",
            by_symbol.len(),
            skipped
        );
        Ok(Self { by_symbol })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConstraintError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn packaged() -> Result<Self, ConstraintError> {
        Self::from_embedded(PACKAGED_TABLE)
    }

    /// An embedded table must yield at least one gene.
    fn from_embedded(text: &str) -> Result<Self, ConstraintError> {
        let constraints = Self::from_reader(text.as_bytes())?;
        if constraints.is_empty() {
            return Err(ConstraintError::EmptyTable);
        }
        Ok(constraints)
    }

    pub fn get(&self, gene_symbol: &str) -> Option<&GeneConstraint> {
        self.by_symbol.get(gene_symbol)
    }

    /// Genes missing from the table are treated as intolerant.
    pub fn is_loss_of_function_intolerant(&self, gene_symbol: &str) -> bool {
        self.get(gene_symbol)
            .map_or(true, GeneConstraint::is_loss_of_function_intolerant)
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    /// Install `constraints` as the process-wide table. Fails if already set.
    pub fn install(constraints: GeneConstraints) -> Result<(), ConstraintError> {
        GENE_CONSTRAINTS
            .set(constraints)
            .map_err(|_| ConstraintError::AlreadyLoaded)
    }

    /// The process-wide table, loading the packaged one on first use.
    pub fn global() -> Result<&'static GeneConstraints, ConstraintError> {
        if let Some(constraints) = GENE_CONSTRAINTS.get() {
            return Ok(constraints);
        }
        let packaged = Self::packaged()?;
        Ok(GENE_CONSTRAINTS.get_or_init(|| packaged))
    }
}

impl FromIterator<GeneConstraint> for GeneConstraints {
    fn from_iter<I: IntoIterator<Item = GeneConstraint>>(iter: I) -> Self {
        Self {
            by_symbol: iter
                .into_iter()
                .map(|c| (c.gene_symbol.clone(), c))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "gene_symbol\ttranscript\tpli\tloeuf\tloeuf_lower\tloeuf_upper\n\
        TOLERANT\tENST01\t0.01\t1.2\t0.9\t1.5\n\
        BROKEN\tENST02\tnot-a-number\t0.1\t0.05\t0.2\n\
        LOWLOEUF\tENST03\t0.2\t0.3\t0.2\t0.45\n\
        HIGHPLI\tENST04\t0.99\t0.9\t0.7\t1.1\n";

    #[test]
    fn test_malformed_rows_skipped() {
        let constraints = GeneConstraints::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(constraints.len(), 3);
        assert!(constraints.get("BROKEN").is_none());
    }

    #[test]
    fn test_loss_of_function_intolerance() {
        let constraints = GeneConstraints::from_reader(TABLE.as_bytes()).unwrap();
        assert!(!constraints.is_loss_of_function_intolerant("TOLERANT"));
        assert!(constraints.is_loss_of_function_intolerant("LOWLOEUF"));
        assert!(constraints.is_loss_of_function_intolerant("HIGHPLI"));
        assert!(constraints.is_loss_of_function_intolerant("MISSING"));
    }

    #[test]
    fn test_packaged_table_loads() {
        let constraints = GeneConstraints::packaged().unwrap();
        assert!(!constraints.is_empty());
        assert!(GeneConstraints::global().unwrap().len() > 0);
    }

    #[test]
    fn test_unusable_embedded_table_is_an_error() {
        assert!(matches!(
            GeneConstraints::from_embedded(""),
            Err(ConstraintError::EmptyTable)
        ));
        let broken = "gene_symbol\ttranscript\tpli\tloeuf\tloeuf_lower\tloeuf_upper\n\
            BROKEN\tENST02\tnot-a-number\t0.1\t0.05\t0.2\n";
        assert!(GeneConstraints::from_embedded(broken).is_err());
    }
}
