//! Analysis settings, read from an optional TOML file.
//!
//! ```toml
//! modes = ["AUTOSOMAL_DOMINANT", "AUTOSOMAL_RECESSIVE"]
//! bootstrap_size = 500000
//! seed = 42
//! phenotype_specificity_threshold = 0.6
//!
//! [max_frequency]
//! autosomal_dominant = 0.1
//! autosomal_recessive = 2.0
//! autosomal_recessive_hom_alt = 0.1
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::acmg::assigner::PHENOTYPE_SPECIFICITY_THRESHOLD;
use crate::inheritance::InheritanceModeOptions;
use crate::scoring::NullDistribution;
use crate::types::ModeOfInheritance;

/// Maximum population frequency, in percent, per mode of inheritance
///
/// The recessive ceilings apply to compound heterozygous alleles; the
/// `_hom_alt` ones to alleles that are homozygous (or hemizygous) in the
/// affected members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaxFrequencies {
    pub autosomal_dominant: f64,
    pub autosomal_recessive: f64,
    pub autosomal_recessive_hom_alt: f64,
    pub x_dominant: f64,
    pub x_recessive: f64,
    pub x_recessive_hom_alt: f64,
    pub mitochondrial: f64,
}

impl Default for MaxFrequencies {
    fn default() -> Self {
        Self {
            autosomal_dominant: InheritanceModeOptions::DOMINANT_MAX_FREQUENCY,
            autosomal_recessive: InheritanceModeOptions::COMP_HET_MAX_FREQUENCY,
            autosomal_recessive_hom_alt: InheritanceModeOptions::HOM_ALT_MAX_FREQUENCY,
            x_dominant: InheritanceModeOptions::DOMINANT_MAX_FREQUENCY,
            x_recessive: InheritanceModeOptions::COMP_HET_MAX_FREQUENCY,
            x_recessive_hom_alt: InheritanceModeOptions::HOM_ALT_MAX_FREQUENCY,
            mitochondrial: InheritanceModeOptions::MITOCHONDRIAL_MAX_FREQUENCY,
        }
    }
}

impl MaxFrequencies {
    fn by_mode(&self) -> BTreeMap<ModeOfInheritance, f64> {
        BTreeMap::from([
            (ModeOfInheritance::AutosomalDominant, self.autosomal_dominant),
            (ModeOfInheritance::AutosomalRecessive, self.autosomal_recessive),
            (ModeOfInheritance::XDominant, self.x_dominant),
            (ModeOfInheritance::XRecessive, self.x_recessive),
            (ModeOfInheritance::Mitochondrial, self.mitochondrial),
        ])
    }

    fn hom_alt_by_mode(&self) -> BTreeMap<ModeOfInheritance, f64> {
        BTreeMap::from([
            (ModeOfInheritance::AutosomalRecessive, self.autosomal_recessive_hom_alt),
            (ModeOfInheritance::XRecessive, self.x_recessive_hom_alt),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Modes of inheritance to score every gene under.
    pub modes: Vec<ModeOfInheritance>,
    pub max_frequency: MaxFrequencies,
    /// Size of the simulated null population.
    pub bootstrap_size: usize,
    /// Seed for the null population. Random when unset.
    pub seed: Option<u64>,
    pub phenotype_specificity_threshold: f64,
    /// Proband id, when not given on the command line.
    pub proband: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            modes: ModeOfInheritance::ALL.to_vec(),
            max_frequency: MaxFrequencies::default(),
            bootstrap_size: NullDistribution::DEFAULT_SIZE,
            seed: None,
            phenotype_specificity_threshold: PHENOTYPE_SPECIFICITY_THRESHOLD,
            proband: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: AnalysisConfig = toml::from_str(&text)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        config.validate()?;
        info!("Loaded analysis config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.modes.is_empty() {
            bail!("at least one mode of inheritance must be configured");
        }
        for (mode, ceiling) in self.max_frequency.by_mode() {
            if !(0.0..=100.0).contains(&ceiling) {
                bail!("max frequency for {} must be a percentage, got {}", mode, ceiling);
            }
        }
        let comp_het = self.max_frequency.by_mode();
        for (mode, ceiling) in self.max_frequency.hom_alt_by_mode() {
            let limit = comp_het.get(&mode).copied().unwrap_or(100.0);
            if !(0.0..=limit).contains(&ceiling) {
                bail!(
                    "hom-alt max frequency for {} must be within [0, {}], got {}",
                    mode,
                    limit,
                    ceiling
                );
            }
        }
        if !(0.0..=1.0).contains(&self.phenotype_specificity_threshold) {
            bail!(
                "phenotype_specificity_threshold must be within [0, 1], got {}",
                self.phenotype_specificity_threshold
            );
        }
        Ok(())
    }

    pub fn inheritance_options(&self) -> InheritanceModeOptions {
        InheritanceModeOptions::new(self.modes.iter().copied(), self.max_frequency.by_mode())
            .with_hom_alt_max_frequencies(self.max_frequency.hom_alt_by_mode())
    }
}
