//! Mendelian compatibility checking.
//!
//! The annotator talks to a checker through [`MendelianChecker`], handing it
//! genotype groups in a minimal call representation. [`PedigreeMendelianChecker`]
//! is a rule-based implementation over the pedigree.

use std::collections::BTreeMap;

use crate::error::PrioritizerError;
use crate::pedigree::{FamilyMember, Pedigree, Sex};
use crate::types::{AlleleCall, ModeOfInheritance, VariantKey};

/// Allele as seen by the checker: ref = 0, alt = 1, no-call sentinel = -1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckerAllele {
    Ref,
    Alt,
    NoCall,
}

impl CheckerAllele {
    pub fn code(&self) -> i8 {
        match self {
            CheckerAllele::Ref => 0,
            CheckerAllele::Alt => 1,
            CheckerAllele::NoCall => -1,
        }
    }
}

impl From<AlleleCall> for CheckerAllele {
    fn from(call: AlleleCall) -> Self {
        match call {
            AlleleCall::Ref => CheckerAllele::Ref,
            AlleleCall::Alt | AlleleCall::OtherAlt => CheckerAllele::Alt,
            AlleleCall::NoCall => CheckerAllele::NoCall,
        }
    }
}

/// Calls of every pedigree member at one distinct variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeGroup {
    pub key: VariantKey,
    pub calls: BTreeMap<String, Vec<CheckerAllele>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    NoCall,
    HomRef,
    Het,
    HomAlt,
}

impl CallState {
    pub fn from_alleles(alleles: &[CheckerAllele]) -> Self {
        if alleles.iter().all(|a| *a == CheckerAllele::NoCall) {
            return CallState::NoCall;
        }
        let alts = alleles.iter().filter(|a| **a == CheckerAllele::Alt).count();
        if alts == 0 {
            CallState::HomRef
        } else if alts == alleles.len() {
            CallState::HomAlt
        } else {
            CallState::Het
        }
    }

    pub fn carries_alt(&self) -> bool {
        matches!(self, CallState::Het | CallState::HomAlt)
    }
}

impl GenotypeGroup {
    pub fn state(&self, member_id: &str) -> CallState {
        self.calls
            .get(member_id)
            .map_or(CallState::NoCall, |alleles| CallState::from_alleles(alleles))
    }

    fn is_autosomal(&self) -> bool {
        !matches!(self.key.chromosome.as_str(), "X" | "Y" | "MT")
    }

    fn is_x(&self) -> bool {
        self.key.chromosome == "X"
    }

    fn is_mitochondrial(&self) -> bool {
        self.key.chromosome == "MT"
    }
}

/// External Mendelian-compatibility checker.
///
/// Returns the indices of `groups` compatible with `mode`.
pub trait MendelianChecker: Send + Sync {
    fn compatible_groups(
        &self,
        mode: ModeOfInheritance,
        groups: &[GenotypeGroup],
        pedigree: &Pedigree,
    ) -> Result<Vec<usize>, PrioritizerError>;
}

impl<T: MendelianChecker + ?Sized> MendelianChecker for &T {
    fn compatible_groups(
        &self,
        mode: ModeOfInheritance,
        groups: &[GenotypeGroup],
        pedigree: &Pedigree,
    ) -> Result<Vec<usize>, PrioritizerError> {
        (**self).compatible_groups(mode, groups, pedigree)
    }
}

/// Rule-based checker over called genotypes. No-calls never exclude a group.
#[derive(Debug, Clone, Copy, Default)]
pub struct PedigreeMendelianChecker;

impl PedigreeMendelianChecker {
    pub fn new() -> Self {
        Self
    }

    fn dominant(&self, group: &GenotypeGroup, pedigree: &Pedigree) -> bool {
        let mut carriers = 0;
        for member in pedigree.members() {
            let state = group.state(&member.id);
            if member.is_affected() {
                match state {
                    CallState::HomRef => return false,
                    s if s.carries_alt() => carriers += 1,
                    _ => {}
                }
            } else if member.is_unaffected() && state.carries_alt() {
                return false;
            }
        }
        carriers > 0
    }

    fn homozygous_recessive(&self, group: &GenotypeGroup, pedigree: &Pedigree) -> bool {
        let mut carriers = 0;
        for member in pedigree.members() {
            let state = group.state(&member.id);
            if member.is_affected() {
                match state {
                    CallState::HomAlt => carriers += 1,
                    CallState::NoCall => {}
                    _ => return false,
                }
            } else if member.is_unaffected() && state == CallState::HomAlt {
                return false;
            }
        }
        carriers > 0
    }

    /// Affected members het (or uncalled), unaffected not hom-alt.
    fn comp_het_candidate(&self, group: &GenotypeGroup, pedigree: &Pedigree) -> bool {
        let mut carriers = 0;
        for member in pedigree.members() {
            let state = group.state(&member.id);
            if member.is_affected() {
                match state {
                    CallState::Het => carriers += 1,
                    CallState::NoCall => {}
                    _ => return false,
                }
            } else if member.is_unaffected() && state == CallState::HomAlt {
                return false;
            }
        }
        carriers > 0
    }

    /// Candidates that form at least one valid pair: no unaffected member
    /// carries both alleles.
    fn comp_het_pairs(
        &self,
        candidates: &[(usize, &GenotypeGroup)],
        pedigree: &Pedigree,
    ) -> Vec<usize> {
        let unaffected: Vec<&FamilyMember> = pedigree.unaffected().collect();
        let mut paired = vec![false; candidates.len()];

        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let (_, a) = candidates[i];
                let (_, b) = candidates[j];
                if a.key == b.key {
                    continue;
                }
                let carried_by_unaffected = unaffected.iter().any(|m| {
                    a.state(&m.id).carries_alt() && b.state(&m.id).carries_alt()
                });
                if !carried_by_unaffected {
                    paired[i] = true;
                    paired[j] = true;
                }
            }
        }

        candidates
            .iter()
            .zip(paired)
            .filter(|(_, p)| *p)
            .map(|((idx, _), _)| *idx)
            .collect()
    }

    fn recessive(
        &self,
        groups: &[GenotypeGroup],
        pedigree: &Pedigree,
        on_chromosome: impl Fn(&GenotypeGroup) -> bool,
        hom: impl Fn(&GenotypeGroup) -> bool,
        comp_het: impl Fn(&GenotypeGroup) -> bool,
    ) -> Vec<usize> {
        let mut compatible: Vec<usize> = Vec::new();
        let mut candidates: Vec<(usize, &GenotypeGroup)> = Vec::new();

        for (idx, group) in groups.iter().enumerate() {
            if !on_chromosome(group) {
                continue;
            }
            if hom(group) {
                compatible.push(idx);
            } else if comp_het(group) {
                candidates.push((idx, group));
            }
        }

        compatible.extend(self.comp_het_pairs(&candidates, pedigree));
        compatible.sort_unstable();
        compatible
    }

    fn x_recessive_hom(&self, group: &GenotypeGroup, pedigree: &Pedigree) -> bool {
        let mut carriers = 0;
        for member in pedigree.members() {
            let state = group.state(&member.id);
            match (member.is_affected(), member.is_unaffected(), member.sex) {
                (true, _, Sex::Female) => match state {
                    CallState::HomAlt => carriers += 1,
                    CallState::NoCall => {}
                    _ => return false,
                },
                (true, _, _) => match state {
                    CallState::HomRef => return false,
                    s if s.carries_alt() => carriers += 1,
                    _ => {}
                },
                (_, true, Sex::Male) if state.carries_alt() => return false,
                (_, true, _) if state == CallState::HomAlt => return false,
                _ => {}
            }
        }
        carriers > 0
    }

    /// Comp-het on X only applies when every affected member is female.
    fn x_recessive_comp_het(&self, group: &GenotypeGroup, pedigree: &Pedigree) -> bool {
        let all_female = pedigree.affected().all(|m| m.sex == Sex::Female);
        if !all_female {
            return false;
        }
        let unaffected_male_carrier = pedigree
            .unaffected()
            .any(|m| m.sex == Sex::Male && group.state(&m.id).carries_alt());
        !unaffected_male_carrier && self.comp_het_candidate(group, pedigree)
    }

    fn mitochondrial(&self, group: &GenotypeGroup, pedigree: &Pedigree) -> bool {
        let mut carriers = 0;
        for member in pedigree.members() {
            let state = group.state(&member.id);
            if member.is_affected() {
                match state {
                    CallState::HomRef => return false,
                    s if s.carries_alt() => carriers += 1,
                    _ => {}
                }
            } else if member.is_unaffected() && state == CallState::HomAlt {
                return false;
            }
        }
        carriers > 0
    }
}

fn select(groups: &[GenotypeGroup], keep: impl Fn(&GenotypeGroup) -> bool) -> Vec<usize> {
    groups
        .iter()
        .enumerate()
        .filter(|(_, g)| keep(g))
        .map(|(i, _)| i)
        .collect()
}

impl MendelianChecker for PedigreeMendelianChecker {
    fn compatible_groups(
        &self,
        mode: ModeOfInheritance,
        groups: &[GenotypeGroup],
        pedigree: &Pedigree,
    ) -> Result<Vec<usize>, PrioritizerError> {
        let compatible = match mode {
            ModeOfInheritance::AutosomalDominant => {
                select(groups, |g| g.is_autosomal() && self.dominant(g, pedigree))
            }
            ModeOfInheritance::XDominant => {
                select(groups, |g| g.is_x() && self.dominant(g, pedigree))
            }
            ModeOfInheritance::Mitochondrial => {
                select(groups, |g| g.is_mitochondrial() && self.mitochondrial(g, pedigree))
            }
            ModeOfInheritance::AutosomalRecessive => self.recessive(
                groups,
                pedigree,
                GenotypeGroup::is_autosomal,
                |g| self.homozygous_recessive(g, pedigree),
                |g| self.comp_het_candidate(g, pedigree),
            ),
            ModeOfInheritance::XRecessive => self.recessive(
                groups,
                pedigree,
                GenotypeGroup::is_x,
                |g| self.x_recessive_hom(g, pedigree),
                |g| self.x_recessive_comp_het(g, pedigree),
            ),
            ModeOfInheritance::Any => {
                return Err(PrioritizerError::MendelianCheck {
                    mode: mode.to_string(),
                    message: "mode is resolved without a Mendelian check".to_string(),
                })
            }
        };

        Ok(compatible)
    }
}
