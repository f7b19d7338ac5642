use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::acmg::AcmgEvidenceAssigner;
use crate::alleles::ContributingAlleleCalculator;
use crate::config::AnalysisConfig;
use crate::constraint::GeneConstraints;
use crate::error::PrioritizerError;
use crate::inheritance::InheritanceModeAnnotator;
use crate::mendelian::MendelianChecker;
use crate::parsers::CandidateSet;
use crate::pedigree::Pedigree;
use crate::priority::PriorityType;
use crate::regions::{reassign_regulatory_variants, RegionIndex, TopologicalDomain};
use crate::scoring::{self, CombinedScoreModel, NullDistribution};
use crate::types::{GeneCandidate, GeneScore, ModeOfInheritance};

/// Ranked output of one analysis
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub proband: String,
    /// Combined-score model used for every gene and for the null population.
    pub model: String,
    pub null_distribution_size: usize,
    pub gene_count: usize,
    pub variant_count: usize,
    /// One entry per gene and configured mode, best first.
    pub gene_scores: Vec<GeneScore>,
}

impl AnalysisResults {
    /// Best-scoring mode of each gene, in rank order.
    pub fn best_per_gene(&self) -> Vec<&GeneScore> {
        let mut seen = BTreeSet::new();
        self.gene_scores
            .iter()
            .filter(|s| seen.insert(s.gene_symbol.as_str()))
            .collect()
    }
}

/// Scores every candidate gene under every configured mode of inheritance
pub struct GenePrioritizer<'a, C: MendelianChecker> {
    config: &'a AnalysisConfig,
    constraints: &'a GeneConstraints,
    checker: C,
    domains: Option<&'a RegionIndex<TopologicalDomain>>,
    progress: Option<ProgressBar>,
}

impl<'a, C: MendelianChecker> GenePrioritizer<'a, C> {
    pub fn new(config: &'a AnalysisConfig, constraints: &'a GeneConstraints, checker: C) -> Self {
        Self {
            config,
            constraints,
            checker,
            domains: None,
            progress: None,
        }
    }

    /// Reassign regulatory variants within these domains before scoring.
    pub fn with_domains(mut self, domains: &'a RegionIndex<TopologicalDomain>) -> Self {
        self.domains = Some(domains);
        self
    }

    /// Advance `progress` once per scored gene.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run(
        &self,
        candidates: CandidateSet,
        pedigree: &Pedigree,
        proband: &str,
    ) -> Result<AnalysisResults, PrioritizerError> {
        pedigree.validate_samples(&candidates.samples, proband)?;
        let variant_count = candidates.variant_count();
        let mut genes = candidates.genes;

        if let Some(domains) = self.domains {
            let phenotype_scores = phenotype_scores_by_gene(&genes);
            let moved = reassign_regulatory_variants(&mut genes, domains, &phenotype_scores);
            info!("Reassigned {} regulatory variants to neighbouring genes", moved);
        }

        let options = self.config.inheritance_options();
        InheritanceModeAnnotator::new(pedigree, &options, &self.checker).annotate_all(&mut genes)?;

        let active: BTreeSet<PriorityType> = genes
            .iter()
            .flat_map(|g| g.priority_results.keys().copied())
            .collect();
        let model = CombinedScoreModel::select(&active);
        info!("Using the {} combined-score model", model.name());

        let observed: Vec<f64> = genes
            .iter()
            .map(|g| scoring::phenotype_score(g, ModeOfInheritance::Any).0)
            .collect();
        let null = NullDistribution::bootstrap(
            &observed,
            self.config.bootstrap_size,
            &model,
            self.config.seed,
        );

        if let Some(pb) = &self.progress {
            pb.set_length(genes.len() as u64);
        }

        let calculator = ContributingAlleleCalculator::new(pedigree, proband);
        let assigner = AcmgEvidenceAssigner::new(pedigree, proband, self.constraints)
            .with_phenotype_specificity_threshold(self.config.phenotype_specificity_threshold);
        let modes: BTreeSet<ModeOfInheritance> = self.config.modes.iter().copied().collect();

        let mut gene_scores: Vec<GeneScore> = genes
            .par_iter()
            .flat_map_iter(|gene| {
                let scores: Vec<GeneScore> = modes
                    .iter()
                    .map(|&mode| score_gene(gene, mode, &model, &null, &calculator, &assigner))
                    .collect();
                if let Some(pb) = &self.progress {
                    pb.inc(1);
                }
                scores
            })
            .collect();

        gene_scores.sort_by(|a, b| {
            b.combined_score
                .total_cmp(&a.combined_score)
                .then_with(|| a.gene_symbol.cmp(&b.gene_symbol))
                .then_with(|| a.mode.cmp(&b.mode))
        });

        info!(
            "Scored {} genes under {} modes of inheritance",
            genes.len(),
            modes.len()
        );

        Ok(AnalysisResults {
            proband: proband.to_string(),
            model: model.name(),
            null_distribution_size: null.len(),
            gene_count: genes.len(),
            variant_count,
            gene_scores,
        })
    }
}

/// Mode-independent phenotype score of each gene, by symbol.
fn phenotype_scores_by_gene(genes: &[GeneCandidate]) -> HashMap<String, f64> {
    genes
        .iter()
        .map(|g| {
            (
                g.symbol.clone(),
                scoring::phenotype_score(g, ModeOfInheritance::Any).0,
            )
        })
        .collect()
}

/// A mode without contributing alleles keeps its phenotype score but gets a
/// variant score of zero.
fn score_gene(
    gene: &GeneCandidate,
    mode: ModeOfInheritance,
    model: &CombinedScoreModel,
    null: &NullDistribution,
    calculator: &ContributingAlleleCalculator,
    assigner: &AcmgEvidenceAssigner,
) -> GeneScore {
    let contributing = calculator.find_contributing_variants(mode, &gene.variants);
    let (phenotype_score, disease_matches) = scoring::phenotype_score(gene, mode);
    let variant_score = scoring::variant_score(&contributing);

    let combined_score = model.combined_score(phenotype_score, variant_score);
    let p_value = null.p_value(combined_score);
    let acmg_assignments = assigner.assignments(&gene.symbol, mode, &contributing, &disease_matches);

    debug!(
        "{} {}: phenotype {:.3}, variant {:.3}, combined {:.4}, p {:.2e}",
        gene.symbol, mode, phenotype_score, variant_score, combined_score, p_value
    );

    GeneScore {
        gene_symbol: gene.symbol.clone(),
        gene_id: gene.gene_id.clone(),
        mode,
        variant_score,
        phenotype_score,
        combined_score,
        p_value,
        contributing_variants: contributing.into_iter().cloned().collect(),
        compatible_disease_matches: disease_matches,
        acmg_assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acmg::AcmgClassification;
    use crate::mendelian::PedigreeMendelianChecker;
    use crate::pedigree::tests::trio;
    use crate::priority::PriorityResult;
    use crate::types::tests::variant;
    use crate::types::{CandidateVariant, VariantEffect};

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            bootstrap_size: 20_000,
            seed: Some(11),
            ..AnalysisConfig::default()
        }
    }

    fn gene(symbol: &str, phenotype: f64, variants: Vec<CandidateVariant>) -> GeneCandidate {
        let mut gene = GeneCandidate::new(symbol, symbol);
        gene.add_priority_result(PriorityResult::PhenotypeSimilarity {
            score: phenotype,
            matches: vec![],
        });
        gene.variants = variants
            .into_iter()
            .map(|mut v| {
                v.gene_symbol = symbol.to_string();
                v
            })
            .collect();
        gene
    }

    fn trio_samples() -> Vec<String> {
        vec!["proband".to_string(), "father".to_string(), "mother".to_string()]
    }

    #[test]
    fn test_de_novo_stop_gain_ranks_first() {
        let candidates = CandidateSet {
            samples: trio_samples(),
            genes: vec![
                gene(
                    "WEAK",
                    0.3,
                    vec![variant(
                        "2",
                        500,
                        VariantEffect::SynonymousVariant,
                        &[("proband", "0/1"), ("father", "0/1"), ("mother", "0/0")],
                    )],
                ),
                gene(
                    "STRONG",
                    0.9,
                    vec![variant(
                        "1",
                        100,
                        VariantEffect::StopGained,
                        &[("proband", "0/1"), ("father", "0/0"), ("mother", "0/0")],
                    )],
                ),
            ],
        };

        let config = config();
        let constraints = GeneConstraints::default();
        let prioritizer =
            GenePrioritizer::new(&config, &constraints, PedigreeMendelianChecker::new());
        let results = prioritizer.run(candidates, &trio(), "proband").unwrap();

        assert_eq!(results.gene_count, 2);
        assert_eq!(results.gene_scores.len(), 2 * ModeOfInheritance::ALL.len());
        assert_eq!(results.null_distribution_size, 20_000);

        let top = &results.gene_scores[0];
        assert_eq!(top.gene_symbol, "STRONG");
        assert_eq!(top.contributing_variants.len(), 1);
        assert!(top.p_value < 1.0);
        assert!(top.mode == ModeOfInheritance::AutosomalDominant || top.mode == ModeOfInheritance::Any);

        let dominant = results
            .gene_scores
            .iter()
            .find(|s| s.gene_symbol == "STRONG" && s.mode == ModeOfInheritance::AutosomalDominant)
            .unwrap();
        assert_eq!(dominant.acmg_assignments.len(), 1);
        assert_eq!(
            dominant.acmg_assignments[0].classification,
            AcmgClassification::Pathogenic
        );

        let best: Vec<&str> = results
            .best_per_gene()
            .iter()
            .map(|s| s.gene_symbol.as_str())
            .collect();
        assert_eq!(best, vec!["STRONG", "WEAK"]);
    }

    #[test]
    fn test_incompatible_modes_have_zero_variant_score() {
        let candidates = CandidateSet {
            samples: trio_samples(),
            genes: vec![gene(
                "GENE1",
                0.8,
                vec![variant(
                    "1",
                    100,
                    VariantEffect::MissenseVariant,
                    &[("proband", "0/1"), ("father", "0/0"), ("mother", "0/0")],
                )],
            )],
        };

        let config = config();
        let constraints = GeneConstraints::default();
        let results = GenePrioritizer::new(&config, &constraints, PedigreeMendelianChecker::new())
            .run(candidates, &trio(), "proband")
            .unwrap();

        let by_mode = |mode| {
            results
                .gene_scores
                .iter()
                .find(|s| s.mode == mode)
                .unwrap()
        };
        let recessive = by_mode(ModeOfInheritance::AutosomalRecessive);
        let dominant = by_mode(ModeOfInheritance::AutosomalDominant);

        assert!(recessive.contributing_variants.is_empty());
        assert_eq!(recessive.variant_score, 0.0);
        assert_eq!(recessive.phenotype_score, 0.8);
        assert!(recessive.acmg_assignments.is_empty());
        assert!(recessive.combined_score < dominant.combined_score);
        assert!(recessive.p_value >= dominant.p_value);
    }

    #[test]
    fn test_regulatory_variant_scored_in_domain_gene() {
        let candidates = CandidateSet {
            samples: trio_samples(),
            genes: vec![
                gene(
                    "WEAK",
                    0.2,
                    vec![variant(
                        "1",
                        150,
                        VariantEffect::RegulatoryRegionVariant,
                        &[("proband", "0/1"), ("father", "0/0"), ("mother", "0/0")],
                    )],
                ),
                gene("STRONG", 0.9, vec![]),
            ],
        };
        let domains = RegionIndex::new(vec![TopologicalDomain {
            chromosome: "1".to_string(),
            start: 100,
            end: 200,
            genes: ["WEAK", "STRONG"].iter().map(|g| g.to_string()).collect(),
        }]);

        let config = config();
        let constraints = GeneConstraints::default();
        let results = GenePrioritizer::new(&config, &constraints, PedigreeMendelianChecker::new())
            .with_domains(&domains)
            .run(candidates, &trio(), "proband")
            .unwrap();

        let dominant = |symbol: &str| {
            results
                .gene_scores
                .iter()
                .find(|s| s.gene_symbol == symbol && s.mode == ModeOfInheritance::AutosomalDominant)
                .unwrap()
        };
        assert_eq!(results.variant_count, 1);
        assert!(dominant("WEAK").contributing_variants.is_empty());
        let moved = &dominant("STRONG").contributing_variants;
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].position, 150);
        assert_eq!(moved[0].gene_symbol, "STRONG");
    }

    #[test]
    fn test_sample_mismatch_is_fatal() {
        let candidates = CandidateSet {
            samples: vec!["proband".to_string()],
            genes: vec![],
        };
        let config = config();
        let constraints = GeneConstraints::default();
        let result = GenePrioritizer::new(&config, &constraints, PedigreeMendelianChecker::new())
            .run(candidates, &trio(), "proband");
        assert!(matches!(result, Err(PrioritizerError::Pedigree(_))));
    }
}
