use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::parsers::{open_file, PedigreeParser};
use crate::pedigree::{FamilyMember, Pedigree};

/// JSON pedigree document.
///
/// ```json
/// { "family_id": "FAM1",
///   "members": [ { "id": "proband", "father_id": "dad", "sex": "female", "status": "affected" } ] }
/// ```
#[derive(Debug, Deserialize)]
struct FamilyDocument {
    family_id: String,
    members: Vec<MemberRecord>,
}

#[derive(Debug, Deserialize)]
struct MemberRecord {
    id: String,
    #[serde(default)]
    father_id: Option<String>,
    #[serde(default)]
    mother_id: Option<String>,
    #[serde(default)]
    sex: crate::pedigree::Sex,
    #[serde(default)]
    status: crate::pedigree::AffectionStatus,
}

/// JSON pedigree parser
pub struct JsonPedigreeParser;

impl JsonPedigreeParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path) -> Result<Pedigree> {
        let reader = open_file(path)?;
        let document: FamilyDocument = serde_json::from_reader(reader)
            .with_context(|| format!("Invalid pedigree JSON: {}", path.display()))?;
        self.to_pedigree(document)
            .with_context(|| format!("Invalid pedigree: {}", path.display()))
    }

    fn to_pedigree(&self, document: FamilyDocument) -> Result<Pedigree> {
        let members = document
            .members
            .into_iter()
            .map(|m| FamilyMember {
                id: m.id,
                family_id: document.family_id.clone(),
                father_id: m.father_id.filter(|id| id != "0"),
                mother_id: m.mother_id.filter(|id| id != "0"),
                sex: m.sex,
                status: m.status,
            })
            .collect();
        Ok(Pedigree::new(members)?)
    }
}

impl Default for JsonPedigreeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PedigreeParser for JsonPedigreeParser {
    fn parse(&self, path: &Path) -> Result<Pedigree> {
        self.parse(path)
    }
}
