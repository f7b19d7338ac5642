//! Per-chromosome interval index for point-in-region queries, and the
//! reassignment of regulatory variants to the best gene in their topological
//! domain.

use bio::data_structures::interval_tree::IntervalTree;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::parsers::normalize_chromosome;
use crate::types::GeneCandidate;

/// A region on a chromosome with 1-based, inclusive coordinates
pub trait ChromosomalRegion {
    fn chromosome(&self) -> &str;
    fn start(&self) -> u64;
    fn end(&self) -> u64;
}

/// Immutable index of regions, one interval tree per chromosome.
///
/// Regions are stored half-open and 0-based: `[start - 1, end)`.
pub struct RegionIndex<T> {
    trees: HashMap<String, IntervalTree<u64, T>>,
    len: usize,
}

impl<T: ChromosomalRegion> RegionIndex<T> {
    pub fn new(regions: impl IntoIterator<Item = T>) -> Self {
        let mut trees: HashMap<String, IntervalTree<u64, T>> = HashMap::new();
        let mut len = 0;

        for region in regions {
            let (start, end) = (region.start(), region.end());
            if start == 0 || start > end {
                warn!(
                    "Skipping invalid region {}:{}-{}",
                    region.chromosome(),
                    start,
                    end
                );
                continue;
            }

            trees
                .entry(normalize_chromosome(region.chromosome()))
                .or_insert_with(IntervalTree::new)
                .insert(start - 1..end, region);
            len += 1;
        }

        debug!("Indexed {} regions on {} chromosomes", len, trees.len());
        Self { trees, len }
    }

    /// All regions containing the 1-based `position`. Order is not significant.
    pub fn query(&self, chromosome: &str, position: u64) -> Vec<&T> {
        let Some(pos0) = position.checked_sub(1) else {
            return Vec::new();
        };

        match self.trees.get(&normalize_chromosome(chromosome)) {
            Some(tree) => tree.find(pos0..pos0 + 1).map(|entry| entry.data()).collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Topologically associating domain and the genes it contains
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologicalDomain {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub genes: BTreeSet<String>,
}

impl ChromosomalRegion for TopologicalDomain {
    fn chromosome(&self) -> &str {
        &self.chromosome
    }

    fn start(&self) -> u64 {
        self.start
    }

    fn end(&self) -> u64 {
        self.end
    }
}

/// Move regulatory variants to the gene with the highest phenotype score
/// among genes sharing their domain. Returns the number of variants moved.
pub fn reassign_regulatory_variants(
    genes: &mut [GeneCandidate],
    domains: &RegionIndex<TopologicalDomain>,
    phenotype_scores: &HashMap<String, f64>,
) -> usize {
    let gene_index: HashMap<String, usize> = genes
        .iter()
        .enumerate()
        .map(|(i, g)| (g.symbol.clone(), i))
        .collect();

    // (from gene, variant index, to gene)
    let mut moves: Vec<(usize, usize, usize)> = Vec::new();

    for (gene_idx, gene) in genes.iter().enumerate() {
        let current_score = phenotype_scores.get(&gene.symbol).copied().unwrap_or(0.0);

        for (variant_idx, variant) in gene.variants.iter().enumerate() {
            if !variant.effect.is_regulatory() {
                continue;
            }

            let best = domains
                .query(&variant.chromosome, variant.position)
                .into_iter()
                .flat_map(|domain| domain.genes.iter())
                .filter_map(|symbol| {
                    let idx = *gene_index.get(symbol)?;
                    let score = phenotype_scores.get(symbol).copied().unwrap_or(0.0);
                    Some((idx, score))
                })
                .fold(None, |best: Option<(usize, f64)>, candidate| match best {
                    Some(b) if b.1 >= candidate.1 => Some(b),
                    _ => Some(candidate),
                });

            if let Some((target_idx, target_score)) = best {
                if target_idx != gene_idx && target_score > current_score {
                    moves.push((gene_idx, variant_idx, target_idx));
                }
            }
        }
    }

    // Remove from the back so earlier indices stay valid.
    moves.sort_by(|a, b| b.1.cmp(&a.1));
    for &(from, variant_idx, to) in &moves {
        let mut variant = genes[from].variants.remove(variant_idx);
        debug!(
            "Reassigning {} from {} to {}",
            variant.key(),
            genes[from].symbol,
            genes[to].symbol
        );
        variant.gene_symbol = genes[to].symbol.clone();
        variant.gene_id = genes[to].gene_id.clone();
        genes[to].variants.push(variant);
    }

    moves.len()
}
