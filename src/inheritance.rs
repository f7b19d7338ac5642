//! Tags variants and genes with the modes of inheritance they are compatible
//! with, given the family structure.
//!
//! Variants must already be filtered for quality, frequency and effect. The
//! annotator does not re-filter beyond the per-mode frequency ceilings.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::error::PrioritizerError;
use crate::mendelian::{CheckerAllele, GenotypeGroup, MendelianChecker};
use crate::pedigree::Pedigree;
use crate::types::{CandidateVariant, GeneCandidate, ModeOfInheritance, VariantKey};

/// Modes to evaluate and the maximum population frequency (percent) a
/// variant may have to count towards each of them
///
/// For the recessive modes `max_frequencies` bounds compound heterozygous
/// alleles and `hom_alt_max_frequencies` the stricter homozygous ones.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritanceModeOptions {
    pub modes: BTreeSet<ModeOfInheritance>,
    pub max_frequencies: BTreeMap<ModeOfInheritance, f64>,
    pub hom_alt_max_frequencies: BTreeMap<ModeOfInheritance, f64>,
}

impl InheritanceModeOptions {
    pub const DOMINANT_MAX_FREQUENCY: f64 = 0.1;
    pub const COMP_HET_MAX_FREQUENCY: f64 = 2.0;
    pub const HOM_ALT_MAX_FREQUENCY: f64 = 0.1;
    pub const MITOCHONDRIAL_MAX_FREQUENCY: f64 = 0.2;

    pub fn new(
        modes: impl IntoIterator<Item = ModeOfInheritance>,
        max_frequencies: BTreeMap<ModeOfInheritance, f64>,
    ) -> Self {
        Self {
            modes: modes.into_iter().collect(),
            max_frequencies,
            hom_alt_max_frequencies: Self::default_hom_alt_max_frequencies(),
        }
    }

    pub fn with_hom_alt_max_frequencies(
        mut self,
        hom_alt_max_frequencies: BTreeMap<ModeOfInheritance, f64>,
    ) -> Self {
        self.hom_alt_max_frequencies = hom_alt_max_frequencies;
        self
    }

    pub fn default_max_frequencies() -> BTreeMap<ModeOfInheritance, f64> {
        BTreeMap::from([
            (ModeOfInheritance::AutosomalDominant, Self::DOMINANT_MAX_FREQUENCY),
            (ModeOfInheritance::AutosomalRecessive, Self::COMP_HET_MAX_FREQUENCY),
            (ModeOfInheritance::XDominant, Self::DOMINANT_MAX_FREQUENCY),
            (ModeOfInheritance::XRecessive, Self::COMP_HET_MAX_FREQUENCY),
            (ModeOfInheritance::Mitochondrial, Self::MITOCHONDRIAL_MAX_FREQUENCY),
        ])
    }

    pub fn default_hom_alt_max_frequencies() -> BTreeMap<ModeOfInheritance, f64> {
        BTreeMap::from([
            (ModeOfInheritance::AutosomalRecessive, Self::HOM_ALT_MAX_FREQUENCY),
            (ModeOfInheritance::XRecessive, Self::HOM_ALT_MAX_FREQUENCY),
        ])
    }

    /// Frequency ceiling for `mode`. "Any" and unconfigured modes are unbounded.
    pub fn max_frequency(&self, mode: ModeOfInheritance) -> f64 {
        match mode {
            ModeOfInheritance::Any => f64::INFINITY,
            _ => self
                .max_frequencies
                .get(&mode)
                .copied()
                .unwrap_or(f64::INFINITY),
        }
    }

    /// Ceiling for alleles that satisfy a recessive mode on their own.
    pub fn hom_alt_max_frequency(&self, mode: ModeOfInheritance) -> Option<f64> {
        if mode.is_recessive() {
            self.hom_alt_max_frequencies.get(&mode).copied()
        } else {
            None
        }
    }
}

impl Default for InheritanceModeOptions {
    fn default() -> Self {
        Self::new(ModeOfInheritance::ALL, Self::default_max_frequencies())
    }
}

/// Passed records grouped by variant key, with the calls merged per member
struct KeyedGroups {
    members: Vec<Vec<usize>>,
    groups: Vec<GenotypeGroup>,
    /// Highest frequency among the records of each group; zero if whitelisted.
    frequencies: Vec<f64>,
}

impl KeyedGroups {
    /// Record indices of the selected groups, ascending.
    fn records(&self, selected: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut indices: Vec<usize> = selected
            .into_iter()
            .filter_map(|g| self.members.get(g))
            .flatten()
            .copied()
            .collect();
        indices.sort_unstable();
        indices
    }
}

pub struct InheritanceModeAnnotator<'a, C: MendelianChecker> {
    pedigree: &'a Pedigree,
    options: &'a InheritanceModeOptions,
    checker: C,
}

impl<'a, C: MendelianChecker> InheritanceModeAnnotator<'a, C> {
    pub fn new(pedigree: &'a Pedigree, options: &'a InheritanceModeOptions, checker: C) -> Self {
        Self {
            pedigree,
            options,
            checker,
        }
    }

    /// Annotate every gene in parallel. Stops at the first checker failure.
    pub fn annotate_all(&self, genes: &mut [GeneCandidate]) -> Result<(), PrioritizerError> {
        genes
            .par_iter_mut()
            .try_for_each(|gene| self.annotate(gene).map(|_| ()))?;

        let compatible = genes
            .iter()
            .filter(|g| !g.compatible_modes.is_empty())
            .count();
        info!(
            "{} of {} genes compatible with at least one mode of inheritance",
            compatible,
            genes.len()
        );
        Ok(())
    }

    /// Union the compatible modes into each passed variant and into the gene.
    ///
    /// Records sharing a variant key are one allele and always get the same
    /// modes. Returns the modes found for this gene. Running it again adds
    /// nothing.
    pub fn annotate(
        &self,
        gene: &mut GeneCandidate,
    ) -> Result<BTreeSet<ModeOfInheritance>, PrioritizerError> {
        let mut per_variant: Vec<BTreeSet<ModeOfInheritance>> =
            vec![BTreeSet::new(); gene.variants.len()];

        for &mode in &self.options.modes {
            let compatible = match mode {
                ModeOfInheritance::Any => self.carried_by_all_affected(&gene.variants),
                _ => self.checked(mode, &gene.variants)?,
            };
            for idx in compatible {
                per_variant[idx].insert(mode);
            }
        }

        let mut gene_modes = BTreeSet::new();
        for (variant, modes) in gene.variants.iter_mut().zip(per_variant) {
            gene_modes.extend(modes.iter().copied());
            variant.compatible_modes.extend(modes);
        }
        gene.compatible_modes.extend(gene_modes.iter().copied());

        debug!("{}: compatible with {:?}", gene.symbol, gene_modes);
        Ok(gene_modes)
    }

    /// Incomplete penetrance: every affected member is het or hom-alt.
    fn carried_by_all_affected(&self, variants: &[CandidateVariant]) -> Vec<usize> {
        let keyed = self.keyed_groups(variants, f64::INFINITY);
        let carried = keyed.groups.iter().enumerate().filter_map(|(g, group)| {
            self.pedigree
                .affected()
                .all(|m| group.state(&m.id).carries_alt())
                .then_some(g)
        });
        keyed.records(carried)
    }

    fn checked(
        &self,
        mode: ModeOfInheritance,
        variants: &[CandidateVariant],
    ) -> Result<Vec<usize>, PrioritizerError> {
        let keyed = self.keyed_groups(variants, self.options.max_frequency(mode));
        if keyed.groups.is_empty() {
            return Ok(Vec::new());
        }

        let mut compatible = self
            .checker
            .compatible_groups(mode, &keyed.groups, self.pedigree)?;

        // Above the hom-alt ceiling a group may only count as half of a
        // compound het, i.e. it must not satisfy the mode on its own.
        if let Some(hom_alt_ceiling) = self.options.hom_alt_max_frequency(mode) {
            let mut kept = Vec::with_capacity(compatible.len());
            for g in compatible {
                let Some(group) = keyed.groups.get(g) else {
                    continue;
                };
                if keyed.frequencies[g] <= hom_alt_ceiling || !self.satisfies_alone(mode, group)? {
                    kept.push(g);
                }
            }
            compatible = kept;
        }

        Ok(keyed.records(compatible))
    }

    fn satisfies_alone(
        &self,
        mode: ModeOfInheritance,
        group: &GenotypeGroup,
    ) -> Result<bool, PrioritizerError> {
        let alone = self.checker.compatible_groups(
            mode,
            std::slice::from_ref(group),
            self.pedigree,
        )?;
        Ok(!alone.is_empty())
    }

    /// Group the passed records within `ceiling` (or whitelisted) by key.
    fn keyed_groups(&self, variants: &[CandidateVariant], ceiling: f64) -> KeyedGroups {
        let mut by_key: BTreeMap<VariantKey, Vec<usize>> = BTreeMap::new();
        for (idx, variant) in variants.iter().enumerate() {
            if variant.passed_filters && (variant.whitelisted || variant.max_frequency() <= ceiling)
            {
                by_key.entry(variant.key()).or_default().push(idx);
            }
        }

        let mut keyed = KeyedGroups {
            members: Vec::with_capacity(by_key.len()),
            groups: Vec::with_capacity(by_key.len()),
            frequencies: Vec::with_capacity(by_key.len()),
        };
        for (key, indices) in by_key {
            let frequency = if indices.iter().any(|&i| variants[i].whitelisted) {
                0.0
            } else {
                indices
                    .iter()
                    .map(|&i| variants[i].max_frequency())
                    .fold(0.0, f64::max)
            };
            keyed.groups.push(self.genotype_group(key, &indices, variants));
            keyed.frequencies.push(frequency);
            keyed.members.push(indices);
        }
        keyed
    }

    /// Calls of every pedigree member, taken from the first record that has one.
    fn genotype_group(
        &self,
        key: VariantKey,
        indices: &[usize],
        variants: &[CandidateVariant],
    ) -> GenotypeGroup {
        let calls = self
            .pedigree
            .members()
            .iter()
            .map(|member| {
                let alleles = indices
                    .iter()
                    .find_map(|&i| variants[i].genotype(&member.id))
                    .filter(|gt| !gt.calls().is_empty())
                    .map(|gt| gt.calls().iter().map(|c| CheckerAllele::from(*c)).collect())
                    .unwrap_or_else(|| vec![CheckerAllele::NoCall, CheckerAllele::NoCall]);
                (member.id.clone(), alleles)
            })
            .collect();

        GenotypeGroup { key, calls }
    }
}
