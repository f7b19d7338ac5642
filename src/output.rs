use anyhow::{Context, Result};
use chrono::Local;
use csv::WriterBuilder;
use serde_json::to_string_pretty;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::AnalysisResults;
use crate::types::GeneScore;

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Json,
    Tsv,
    All,
}

/// Writes ranked gene scores to an output directory
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Generate reports in the requested format(s). Returns the written paths.
    pub fn generate(&self, results: &AnalysisResults, format: ReportFormat) -> Result<Vec<PathBuf>> {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

        let written = match format {
            ReportFormat::Json => vec![self.generate_json_report(results, &timestamp)?],
            ReportFormat::Tsv => vec![self.generate_tsv_report(results, &timestamp)?],
            ReportFormat::All => vec![
                self.generate_json_report(results, &timestamp)?,
                self.generate_tsv_report(results, &timestamp)?,
            ],
        };

        for path in &written {
            info!("Wrote {}", path.display());
        }
        Ok(written)
    }

    fn report_path(&self, results: &AnalysisResults, timestamp: &str, ext: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_genes_{}.{}", results.proband, timestamp, ext))
    }

    fn generate_json_report(&self, results: &AnalysisResults, timestamp: &str) -> Result<PathBuf> {
        let path = self.report_path(results, timestamp, "json");
        let json = to_string_pretty(results)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        Ok(path)
    }

    fn generate_tsv_report(&self, results: &AnalysisResults, timestamp: &str) -> Result<PathBuf> {
        let path = self.report_path(results, timestamp, "tsv");

        let mut wtr = WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&path)
            .with_context(|| format!("Failed to create TSV report {}", path.display()))?;
        wtr.write_record([
            "rank",
            "gene_symbol",
            "gene_id",
            "mode",
            "combined_score",
            "p_value",
            "phenotype_score",
            "variant_score",
            "contributing_variants",
            "acmg",
            "diseases",
        ])?;

        for (rank, score) in results.gene_scores.iter().enumerate() {
            wtr.write_record(&tsv_row(rank + 1, score))?;
        }

        wtr.flush()?;
        Ok(path)
    }
}

fn tsv_row(rank: usize, score: &GeneScore) -> [String; 11] {
    let variants: Vec<String> = score
        .contributing_variants
        .iter()
        .map(|v| v.key().to_string())
        .collect();
    let acmg: Vec<String> = score
        .acmg_assignments
        .iter()
        .map(|a| format!("{} {} [{}]", a.variant, a.classification, a.evidence))
        .collect();
    let diseases: Vec<String> = score
        .compatible_disease_matches
        .iter()
        .filter_map(|m| m.disease.as_ref())
        .map(|d| format!("{} {}", d.id, d.name))
        .collect();

    [
        rank.to_string(),
        score.gene_symbol.clone(),
        score.gene_id.clone(),
        score.mode.abbreviation().to_string(),
        format!("{:.4}", score.combined_score),
        format!("{:.4e}", score.p_value),
        format!("{:.4}", score.phenotype_score),
        format!("{:.4}", score.variant_score),
        variants.join(";"),
        acmg.join("; "),
        diseases.join("; "),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::missense;
    use crate::types::ModeOfInheritance;

    fn results() -> AnalysisResults {
        AnalysisResults {
            proband: "proband".to_string(),
            model: "mean".to_string(),
            null_distribution_size: 0,
            gene_count: 1,
            variant_count: 1,
            gene_scores: vec![GeneScore {
                gene_symbol: "GENE1".to_string(),
                gene_id: "1".to_string(),
                mode: ModeOfInheritance::AutosomalDominant,
                variant_score: 0.7,
                phenotype_score: 0.5,
                combined_score: 0.6,
                p_value: 1.0,
                contributing_variants: vec![missense(0.7)],
                compatible_disease_matches: vec![],
                acmg_assignments: vec![],
            }],
        }
    }

    #[test]
    fn test_all_formats_written() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let generator = ReportGenerator::new(&dir.path().join("reports"))?;
        let written = generator.generate(&results(), ReportFormat::All)?;
        assert_eq!(written.len(), 2);

        let json: AnalysisResults = serde_json::from_str(&fs::read_to_string(&written[0])?)?;
        assert_eq!(json.gene_scores.len(), 1);
        assert_eq!(json.gene_scores[0].gene_symbol, "GENE1");

        let tsv = fs::read_to_string(&written[1])?;
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("rank\tgene_symbol"));
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields[0], "1");
        assert_eq!(fields[1], "GENE1");
        assert_eq!(fields[3], "AD");
        assert_eq!(fields[4], "0.6000");
        Ok(())
    }
}
