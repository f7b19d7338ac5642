use anyhow::Result;
use std::io::BufRead;
use std::path::Path;
use tracing::{info, warn};

use crate::parsers::open_file;
use crate::regions::{RegionIndex, TopologicalDomain};

/// BED parser for topological domains.
///
/// Columns: chromosome, 0-based start, end, comma-separated gene symbols.
/// Malformed lines are logged and skipped.
pub struct RegionParser;

impl RegionParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path) -> Result<Vec<TopologicalDomain>> {
        let reader = open_file(path)?;
        let mut domains = Vec::new();
        let mut skipped = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }

            match self.parse_line(&line) {
                Some(domain) => domains.push(domain),
                None => {
                    warn!("Skipping malformed region at {}:{}", path.display(), line_no + 1);
                    skipped += 1;
                }
            }
        }

        info!(
            "Loaded {} domains from {} ({} skipped)",
            domains.len(),
            path.display(),
            skipped
        );
        Ok(domains)
    }

    pub fn load_index(&self, path: &Path) -> Result<RegionIndex<TopologicalDomain>> {
        Ok(RegionIndex::new(self.parse(path)?))
    }

    fn parse_line(&self, line: &str) -> Option<TopologicalDomain> {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return None;
        }

        let start0: u64 = parts[1].trim().parse().ok()?;
        let end: u64 = parts[2].trim().parse().ok()?;
        let genes = parts
            .get(3)
            .map(|field| {
                field
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty() && *g != ".")
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(TopologicalDomain {
            chromosome: parts[0].trim().to_string(),
            start: start0 + 1,
            end,
            genes,
        })
    }
}

impl Default for RegionParser {
    fn default() -> Self {
        Self::new()
    }
}
