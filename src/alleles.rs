//! Selection of the allele(s) that best explain the phenotype for one gene
//! under one mode of inheritance.
//!
//! Selection never mutates the variants. The winners are returned as an owned
//! list so the same variant can take part in several mode evaluations at once.

use crate::pedigree::{Pedigree, Sex};
use crate::types::{CandidateVariant, ModeOfInheritance};

pub struct ContributingAlleleCalculator<'a> {
    pedigree: &'a Pedigree,
    proband: &'a str,
}

impl<'a> ContributingAlleleCalculator<'a> {
    pub fn new(pedigree: &'a Pedigree, proband: &'a str) -> Self {
        Self { pedigree, proband }
    }

    /// Contributing variants among the passed, `mode`-compatible ones.
    /// Empty when nothing is compatible.
    pub fn find_contributing_variants<'v>(
        &self,
        mode: ModeOfInheritance,
        variants: &'v [CandidateVariant],
    ) -> Vec<&'v CandidateVariant> {
        let compatible: Vec<&CandidateVariant> = variants
            .iter()
            .filter(|v| v.passed_filters && v.is_compatible_with(mode))
            .collect();
        if compatible.is_empty() {
            return Vec::new();
        }

        match mode {
            ModeOfInheritance::AutosomalRecessive => {
                CompHetCalculator::new(self.proband).find(&compatible)
            }
            ModeOfInheritance::XRecessive if self.proband_is_female() => {
                CompHetCalculator::new(self.proband).find(&compatible)
            }
            ModeOfInheritance::Any => {
                IncompletePenetranceCalculator::new(self.pedigree).find(&compatible)
            }
            _ => best_single(&compatible).into_iter().collect(),
        }
    }

    fn proband_is_female(&self) -> bool {
        self.pedigree
            .member(self.proband)
            .map_or(false, |m| m.sex == Sex::Female)
    }
}

/// Highest-scoring variant; the first one wins ties.
fn best_single<'v>(variants: &[&'v CandidateVariant]) -> Option<&'v CandidateVariant> {
    variants
        .iter()
        .copied()
        .fold(None, |best: Option<&CandidateVariant>, v| match best {
            Some(b) if b.variant_score() >= v.variant_score() => Some(b),
            _ => Some(v),
        })
}

/// Recessive selection: best trans-heterozygous pair against best
/// homozygous-alt single, judged on the proband's genotypes.
pub struct CompHetCalculator<'a> {
    proband: &'a str,
}

impl<'a> CompHetCalculator<'a> {
    pub fn new(proband: &'a str) -> Self {
        Self { proband }
    }

    /// The pair wins an exact tie with the homozygote.
    pub fn find<'v>(&self, variants: &[&'v CandidateVariant]) -> Vec<&'v CandidateVariant> {
        let pair = self.best_trans_pair(variants);
        let hom = self.best_hom_alt(variants);

        match (pair, hom) {
            (Some((a, b, pair_score)), Some(h)) => {
                if pair_score >= h.variant_score() {
                    vec![a, b]
                } else {
                    vec![h]
                }
            }
            (Some((a, b, _)), None) => vec![a, b],
            (None, Some(h)) => vec![h],
            (None, None) => Vec::new(),
        }
    }

    /// Two distinct phased hets with their alt alleles on different haplotypes.
    pub fn is_trans_pair(&self, a: &CandidateVariant, b: &CandidateVariant) -> bool {
        if a.key() == b.key() {
            return false;
        }
        let phase_of =
            |v: &CandidateVariant| v.genotype(self.proband).and_then(|g| g.alt_haplotype());
        match (phase_of(a), phase_of(b)) {
            (Some(pa), Some(pb)) => pa != pb,
            _ => false,
        }
    }

    /// Best pair and its score, the mean of the two variant scores.
    pub fn best_trans_pair<'v>(
        &self,
        variants: &[&'v CandidateVariant],
    ) -> Option<(&'v CandidateVariant, &'v CandidateVariant, f64)> {
        let mut best: Option<(&CandidateVariant, &CandidateVariant, f64)> = None;

        for (i, a) in variants.iter().enumerate() {
            for b in &variants[i + 1..] {
                if !self.is_trans_pair(a, b) {
                    continue;
                }
                let score = (a.variant_score() + b.variant_score()) / 2.0;
                if best.map_or(true, |(_, _, s)| score > s) {
                    best = Some((*a, *b, score));
                }
            }
        }

        best
    }

    fn best_hom_alt<'v>(&self, variants: &[&'v CandidateVariant]) -> Option<&'v CandidateVariant> {
        let homozygous: Vec<&CandidateVariant> = variants
            .iter()
            .copied()
            .filter(|v| v.genotype(self.proband).map_or(false, |g| g.is_hom_alt()))
            .collect();
        best_single(&homozygous)
    }
}

/// Keeps variants carried by every affected member, then picks the best one.
pub struct IncompletePenetranceCalculator<'a> {
    pedigree: &'a Pedigree,
}

impl<'a> IncompletePenetranceCalculator<'a> {
    pub fn new(pedigree: &'a Pedigree) -> Self {
        Self { pedigree }
    }

    pub fn find<'v>(&self, variants: &[&'v CandidateVariant]) -> Vec<&'v CandidateVariant> {
        let shared: Vec<&CandidateVariant> = variants
            .iter()
            .copied()
            .filter(|v| self.pedigree.affected().all(|m| v.is_carried_by(&m.id)))
            .collect();
        best_single(&shared).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::tests::{member, trio};
    use crate::pedigree::AffectionStatus;
    use crate::types::tests::missense;
    use crate::types::{Frequency, FrequencySource, GenotypeCall};

    fn scored(
        position: u64,
        revel: f64,
        genotype: &str,
        modes: &[ModeOfInheritance],
    ) -> CandidateVariant {
        let mut v = missense(revel);
        v.position = position;
        v.genotypes
            .insert("proband".to_string(), GenotypeCall::from_string(genotype));
        v.compatible_modes = modes.iter().copied().collect();
        v
    }

    fn zero_scored(position: u64, genotype: &str, modes: &[ModeOfInheritance]) -> CandidateVariant {
        let mut v = scored(position, 0.8, genotype, modes);
        v.frequencies.push(Frequency {
            source: FrequencySource::GnomadGenomesNfe,
            percent: 3.0,
        });
        v
    }

    const AR: &[ModeOfInheritance] = &[ModeOfInheritance::AutosomalRecessive];

    #[test]
    fn test_no_compatible_variants() {
        let pedigree = trio();
        let calc = ContributingAlleleCalculator::new(&pedigree, "proband");
        let variants = vec![scored(100, 0.9, "0/1", &[ModeOfInheritance::AutosomalDominant])];

        for mode in [
            ModeOfInheritance::AutosomalRecessive,
            ModeOfInheritance::XRecessive,
            ModeOfInheritance::XDominant,
            ModeOfInheritance::Mitochondrial,
            ModeOfInheritance::Any,
        ] {
            assert!(calc.find_contributing_variants(mode, &variants).is_empty());
        }
        assert!(calc
            .find_contributing_variants(ModeOfInheritance::AutosomalDominant, &[])
            .is_empty());
    }

    #[test]
    fn test_hom_alt_beats_weaker_trans_pair() {
        let pedigree = trio();
        let calc = ContributingAlleleCalculator::new(&pedigree, "proband");
        let variants = vec![
            zero_scored(100, "0|1", AR),
            scored(200, 0.8, "1|0", AR),
            scored(300, 0.5, "1/1", AR),
        ];
        assert_eq!(variants[0].variant_score(), 0.0);

        let contributing =
            calc.find_contributing_variants(ModeOfInheritance::AutosomalRecessive, &variants);
        assert_eq!(contributing.len(), 1);
        assert_eq!(contributing[0].position, 300);
    }

    #[test]
    fn test_trans_pair_wins_tie() {
        let pedigree = trio();
        let calc = ContributingAlleleCalculator::new(&pedigree, "proband");
        let variants = vec![
            scored(100, 0.4, "0|1", AR),
            scored(200, 0.6, "1|0", AR),
            scored(300, 0.5, "1/1", AR),
        ];

        let positions: Vec<u64> = calc
            .find_contributing_variants(ModeOfInheritance::AutosomalRecessive, &variants)
            .iter()
            .map(|v| v.position)
            .collect();
        assert_eq!(positions, vec![100, 200]);
    }

    #[test]
    fn test_cis_and_unphased_pairs_rejected() {
        let comp_het = CompHetCalculator::new("proband");
        let cis_a = scored(100, 0.9, "0|1", AR);
        let cis_b = scored(200, 0.9, "0|1", AR);
        let unphased = scored(300, 0.9, "0/1", AR);

        assert!(!comp_het.is_trans_pair(&cis_a, &cis_b));
        assert!(!comp_het.is_trans_pair(&cis_a, &unphased));
        assert!(comp_het.find(&[&cis_a, &cis_b, &unphased]).is_empty());
    }

    #[test]
    fn test_comp_het_symmetry() {
        let comp_het = CompHetCalculator::new("proband");
        let a = scored(100, 0.3, "0|1", AR);
        let b = scored(200, 0.7, "1|0", AR);

        let (_, _, forward) = comp_het.best_trans_pair(&[&a, &b]).unwrap();
        let (_, _, backward) = comp_het.best_trans_pair(&[&b, &a]).unwrap();
        assert_eq!(forward, backward);

        let mut fwd: Vec<u64> = comp_het.find(&[&a, &b]).iter().map(|v| v.position).collect();
        let mut bwd: Vec<u64> = comp_het.find(&[&b, &a]).iter().map(|v| v.position).collect();
        fwd.sort_unstable();
        bwd.sort_unstable();
        assert_eq!(fwd, bwd);
    }

    #[test]
    fn test_x_recessive_male_uses_dominant_rule() {
        let pedigree = Pedigree::new(vec![member(
            "proband",
            None,
            None,
            Sex::Male,
            AffectionStatus::Affected,
        )])
        .unwrap();
        let calc = ContributingAlleleCalculator::new(&pedigree, "proband");
        let xr = &[ModeOfInheritance::XRecessive];
        let variants = vec![scored(100, 0.4, "0|1", xr), scored(200, 0.9, "1", xr)];

        let contributing = calc.find_contributing_variants(ModeOfInheritance::XRecessive, &variants);
        assert_eq!(contributing.len(), 1);
        assert_eq!(contributing[0].position, 200);
    }

    #[test]
    fn test_x_recessive_female_uses_comp_het() {
        let pedigree = trio();
        let calc = ContributingAlleleCalculator::new(&pedigree, "proband");
        let xr = &[ModeOfInheritance::XRecessive];
        let variants = vec![scored(100, 0.9, "0/1", xr)];

        assert!(calc
            .find_contributing_variants(ModeOfInheritance::XRecessive, &variants)
            .is_empty());
    }

    #[test]
    fn test_incomplete_penetrance_requires_all_affected() {
        let pedigree = Pedigree::new(vec![
            member("proband", None, None, Sex::Female, AffectionStatus::Affected),
            member("sister", None, None, Sex::Female, AffectionStatus::Affected),
        ])
        .unwrap();
        let calc = ContributingAlleleCalculator::new(&pedigree, "proband");
        let any = &[ModeOfInheritance::Any];

        let mut private = scored(100, 0.95, "0/1", any);
        private
            .genotypes
            .insert("sister".to_string(), GenotypeCall::from_string("0/0"));
        let mut shared = scored(200, 0.6, "0/1", any);
        shared
            .genotypes
            .insert("sister".to_string(), GenotypeCall::from_string("0/1"));

        let variants = vec![private, shared];
        let contributing = calc.find_contributing_variants(ModeOfInheritance::Any, &variants);
        assert_eq!(contributing.len(), 1);
        assert_eq!(contributing[0].position, 200);
    }

    #[test]
    fn test_first_best_single_wins_ties() {
        let pedigree = trio();
        let calc = ContributingAlleleCalculator::new(&pedigree, "proband");
        let ad = &[ModeOfInheritance::AutosomalDominant];
        let variants = vec![scored(100, 0.7, "0/1", ad), scored(200, 0.7, "0/1", ad)];

        let contributing =
            calc.find_contributing_variants(ModeOfInheritance::AutosomalDominant, &variants);
        assert_eq!(contributing[0].position, 100);
    }
}
