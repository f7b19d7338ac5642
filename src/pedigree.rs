//! Family model shared by every pedigree input format.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::error::PedigreeError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// PED sex code: 1 = male, 2 = female, anything else unknown.
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Sex::Male,
            "2" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AffectionStatus {
    Affected,
    Unaffected,
    #[default]
    Unknown,
}

impl AffectionStatus {
    /// PED status code: 2 = affected, 1 = unaffected, 0/-9 unknown.
    pub fn from_code(code: &str) -> Self {
        match code {
            "2" => AffectionStatus::Affected,
            "1" => AffectionStatus::Unaffected,
            _ => AffectionStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilyMember {
    pub id: String,
    pub family_id: String,
    #[serde(default)]
    pub father_id: Option<String>,
    #[serde(default)]
    pub mother_id: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub status: AffectionStatus,
}

impl FamilyMember {
    pub fn is_affected(&self) -> bool {
        self.status == AffectionStatus::Affected
    }

    pub fn is_unaffected(&self) -> bool {
        self.status == AffectionStatus::Unaffected
    }

    fn parent_ids(&self) -> impl Iterator<Item = &str> {
        self.father_id
            .as_deref()
            .into_iter()
            .chain(self.mother_id.as_deref())
    }
}

/// A validated single-family pedigree. Immutable once built.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pedigree {
    members: Vec<FamilyMember>,
}

impl Pedigree {
    pub fn new(members: Vec<FamilyMember>) -> Result<Self, PedigreeError> {
        if members.is_empty() {
            return Err(PedigreeError::Empty);
        }

        let families: BTreeSet<&str> = members.iter().map(|m| m.family_id.as_str()).collect();
        if families.len() > 1 {
            return Err(PedigreeError::MultipleFamilies(
                families.into_iter().map(str::to_string).collect(),
            ));
        }

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(member.id.as_str()) {
                return Err(PedigreeError::DuplicateMember(member.id.clone()));
            }
        }

        if members.len() > 1 && !members.iter().any(FamilyMember::is_affected) {
            return Err(PedigreeError::NoAffectedMembers(members.len()));
        }

        Ok(Self { members })
    }

    /// Pedigree for an unrelated single sample, assumed affected.
    pub fn single_sample(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            members: vec![FamilyMember {
                family_id: "FAM1".to_string(),
                id,
                father_id: None,
                mother_id: None,
                sex: Sex::Unknown,
                status: AffectionStatus::Affected,
            }],
        }
    }

    pub fn members(&self) -> &[FamilyMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_single_sample(&self) -> bool {
        self.members.len() == 1
    }

    pub fn family_id(&self) -> &str {
        &self.members[0].family_id
    }

    pub fn member(&self, id: &str) -> Option<&FamilyMember> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn affected(&self) -> impl Iterator<Item = &FamilyMember> {
        self.members.iter().filter(|m| m.is_affected())
    }

    pub fn unaffected(&self) -> impl Iterator<Item = &FamilyMember> {
        self.members.iter().filter(|m| m.is_unaffected())
    }

    /// All parents, grandparents, ... of `id` that are members of this pedigree.
    pub fn ancestors_of(&self, id: &str) -> Vec<&FamilyMember> {
        let mut ancestors = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        if let Some(member) = self.member(id) {
            queue.extend(member.parent_ids());
        }

        while let Some(parent_id) = queue.pop_front() {
            if !visited.insert(parent_id) {
                continue;
            }
            if let Some(parent) = self.member(parent_id) {
                ancestors.push(parent);
                queue.extend(parent.parent_ids());
            }
        }

        ancestors
    }

    /// Checks that the sequenced samples and the pedigree describe the same
    /// individuals and that the proband is an affected member.
    pub fn validate_samples(
        &self,
        sample_names: &[String],
        proband: &str,
    ) -> Result<(), PedigreeError> {
        let samples: BTreeSet<&str> = sample_names.iter().map(String::as_str).collect();
        let ids: BTreeSet<&str> = self.members.iter().map(|m| m.id.as_str()).collect();

        let not_in_pedigree: Vec<String> =
            samples.difference(&ids).map(|s| s.to_string()).collect();
        let not_in_samples: Vec<String> =
            ids.difference(&samples).map(|s| s.to_string()).collect();
        if !not_in_pedigree.is_empty() || !not_in_samples.is_empty() {
            return Err(PedigreeError::SampleMismatch {
                not_in_pedigree,
                not_in_samples,
            });
        }

        match self.member(proband) {
            None => Err(PedigreeError::ProbandNotFound(proband.to_string())),
            Some(m) if !m.is_affected() => {
                Err(PedigreeError::ProbandNotAffected(proband.to_string()))
            }
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn member(
        id: &str,
        father: Option<&str>,
        mother: Option<&str>,
        sex: Sex,
        status: AffectionStatus,
    ) -> FamilyMember {
        FamilyMember {
            id: id.to_string(),
            family_id: "FAM".to_string(),
            father_id: father.map(str::to_string),
            mother_id: mother.map(str::to_string),
            sex,
            status,
        }
    }

    /// Affected child with two unaffected parents.
    pub(crate) fn trio() -> Pedigree {
        Pedigree::new(vec![
            member(
                "proband",
                Some("father"),
                Some("mother"),
                Sex::Female,
                AffectionStatus::Affected,
            ),
            member("father", None, None, Sex::Male, AffectionStatus::Unaffected),
            member("mother", None, None, Sex::Female, AffectionStatus::Unaffected),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_pedigree_rejected() {
        assert_eq!(Pedigree::new(vec![]), Err(PedigreeError::Empty));
    }

    #[test]
    fn test_multi_family_rejected() {
        let mut other = member("x", None, None, Sex::Male, AffectionStatus::Affected);
        other.family_id = "OTHER".to_string();
        let result = Pedigree::new(vec![
            member("a", None, None, Sex::Male, AffectionStatus::Affected),
            other,
        ]);
        assert!(matches!(result, Err(PedigreeError::MultipleFamilies(_))));
    }

    #[test]
    fn test_no_affected_rejected() {
        let result = Pedigree::new(vec![
            member("a", None, None, Sex::Male, AffectionStatus::Unaffected),
            member("b", None, None, Sex::Female, AffectionStatus::Unknown),
        ]);
        assert_eq!(result, Err(PedigreeError::NoAffectedMembers(2)));
    }

    #[test]
    fn test_ancestors() {
        let pedigree = Pedigree::new(vec![
            member("child", Some("dad"), Some("mum"), Sex::Male, AffectionStatus::Affected),
            member("dad", Some("grandpa"), None, Sex::Male, AffectionStatus::Unaffected),
            member("mum", None, None, Sex::Female, AffectionStatus::Unaffected),
            member("grandpa", None, None, Sex::Male, AffectionStatus::Unaffected),
        ])
        .unwrap();

        let ids: BTreeSet<&str> = pedigree
            .ancestors_of("child")
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, BTreeSet::from(["dad", "mum", "grandpa"]));
        assert!(pedigree.ancestors_of("grandpa").is_empty());
    }

    #[test]
    fn test_validate_samples() {
        let pedigree = trio();
        let samples: Vec<String> = ["proband", "father", "mother"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(pedigree.validate_samples(&samples, "proband").is_ok());
        assert_eq!(
            pedigree.validate_samples(&samples, "father"),
            Err(PedigreeError::ProbandNotAffected("father".to_string()))
        );
        assert_eq!(
            pedigree.validate_samples(&samples, "nobody"),
            Err(PedigreeError::ProbandNotFound("nobody".to_string()))
        );

        let mismatched = vec!["proband".to_string(), "uncle".to_string()];
        match pedigree.validate_samples(&mismatched, "proband") {
            Err(PedigreeError::SampleMismatch {
                not_in_pedigree,
                not_in_samples,
            }) => {
                assert_eq!(not_in_pedigree, vec!["uncle".to_string()]);
                assert_eq!(
                    not_in_samples,
                    vec!["father".to_string(), "mother".to_string()]
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
