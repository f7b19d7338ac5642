use anyhow::{anyhow, Context, Result};
use std::io::BufRead;
use std::path::Path;

use crate::parsers::{open_file, PedigreeParser};
use crate::pedigree::{AffectionStatus, FamilyMember, Pedigree, Sex};

/// PLINK/PED pedigree parser.
///
/// Six whitespace-separated columns: family id, individual id, father id,
/// mother id, sex (0/1/2), status (-9/0/1/2). `0` marks a missing parent.
pub struct PedParser;

impl PedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path) -> Result<Pedigree> {
        let reader = open_file(path)?;
        let mut members = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let member = self
                .parse_line(line)
                .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
            members.push(member);
        }

        Pedigree::new(members)
            .with_context(|| format!("Invalid pedigree: {}", path.display()))
    }

    fn parse_line(&self, line: &str) -> Result<FamilyMember> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            return Err(anyhow!(
                "Invalid PED line: expected 6 columns, found {}",
                parts.len()
            ));
        }

        Ok(FamilyMember {
            family_id: parts[0].to_string(),
            id: parts[1].to_string(),
            father_id: parent_id(parts[2]),
            mother_id: parent_id(parts[3]),
            sex: Sex::from_code(parts[4]),
            status: AffectionStatus::from_code(parts[5]),
        })
    }
}

impl Default for PedParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_id(field: &str) -> Option<String> {
    match field {
        "0" | "." | "" => None,
        id => Some(id.to_string()),
    }
}

impl PedigreeParser for PedParser {
    fn parse(&self, path: &Path) -> Result<Pedigree> {
        self.parse(path)
    }
}
