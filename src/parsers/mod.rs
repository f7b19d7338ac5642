//! Input adapters. Every pedigree format converges on [`Pedigree`].

pub mod candidates;
pub mod family_json;
pub mod ped;
pub mod regions;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::pedigree::Pedigree;

pub use candidates::{CandidateParser, CandidateSet};
pub use family_json::JsonPedigreeParser;
pub use ped::PedParser;
pub use regions::RegionParser;

/// Common interface of the pedigree input adapters
pub trait PedigreeParser {
    fn parse(&self, path: &Path) -> Result<Pedigree>;
}

/// Pick the pedigree adapter from the file extension (`.json` or PED otherwise).
pub fn parse_pedigree(path: &Path) -> Result<Pedigree> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        JsonPedigreeParser::new().parse(path)
    } else {
        PedParser::new().parse(path)
    }
}

/// Open a plain or gzip-compressed text file.
pub fn open_file(path: &Path) -> Result<Box<dyn BufRead>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let is_gz = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false);

    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Strip `chr` prefixes and map `M` to `MT`.
pub fn normalize_chromosome(chr: &str) -> String {
    let trimmed = chr.trim();
    let stripped = trimmed
        .strip_prefix("chr")
        .or_else(|| trimmed.strip_prefix("CHR"))
        .or_else(|| trimmed.strip_prefix("Chr"))
        .unwrap_or(trimmed);

    match stripped {
        "M" | "m" | "MT" | "mt" => "MT".to_string(),
        "x" => "X".to_string(),
        "y" => "Y".to_string(),
        other => other.to_string(),
    }
}
