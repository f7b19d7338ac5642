use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::acmg::AcmgAssignment;
use crate::parsers::normalize_chromosome;
use crate::priority::{ModelPhenotypeMatch, PriorityResult, PriorityType};

/// Modes of inheritance a gene can be scored under
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModeOfInheritance {
    AutosomalDominant,
    AutosomalRecessive,
    XDominant,
    XRecessive,
    Mitochondrial,
    Any,
}

impl ModeOfInheritance {
    pub const ALL: [ModeOfInheritance; 6] = [
        ModeOfInheritance::AutosomalDominant,
        ModeOfInheritance::AutosomalRecessive,
        ModeOfInheritance::XDominant,
        ModeOfInheritance::XRecessive,
        ModeOfInheritance::Mitochondrial,
        ModeOfInheritance::Any,
    ];

    pub fn is_dominant(&self) -> bool {
        matches!(
            self,
            ModeOfInheritance::AutosomalDominant | ModeOfInheritance::XDominant
        )
    }

    pub fn is_recessive(&self) -> bool {
        matches!(
            self,
            ModeOfInheritance::AutosomalRecessive | ModeOfInheritance::XRecessive
        )
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            ModeOfInheritance::AutosomalDominant => "AD",
            ModeOfInheritance::AutosomalRecessive => "AR",
            ModeOfInheritance::XDominant => "XD",
            ModeOfInheritance::XRecessive => "XR",
            ModeOfInheritance::Mitochondrial => "MT",
            ModeOfInheritance::Any => "ANY",
        }
    }
}

impl fmt::Display for ModeOfInheritance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// A single allele call within a genotype
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AlleleCall {
    Ref,
    Alt,
    OtherAlt,
    NoCall,
}

impl AlleleCall {
    fn from_token(token: &str) -> Self {
        match token {
            "0" => AlleleCall::Ref,
            "1" => AlleleCall::Alt,
            "." | "" => AlleleCall::NoCall,
            other if other.chars().all(|c| c.is_ascii_digit()) => AlleleCall::OtherAlt,
            _ => AlleleCall::NoCall,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            AlleleCall::Ref => "0",
            AlleleCall::Alt => "1",
            AlleleCall::OtherAlt => "2",
            AlleleCall::NoCall => ".",
        }
    }
}

/// Genotype of one sample at one variant, relative to that variant's alternate allele.
///
/// Serialised as a VCF-style `GT` string: `0/1`, `1|0`, `./.`, `1` (haploid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GenotypeCall {
    calls: Vec<AlleleCall>,
    phased: bool,
}

impl GenotypeCall {
    pub fn new(calls: Vec<AlleleCall>, phased: bool) -> Self {
        Self { calls, phased }
    }

    pub fn no_call() -> Self {
        Self::new(vec![AlleleCall::NoCall, AlleleCall::NoCall], false)
    }

    pub fn from_string(s: &str) -> Self {
        let s = s.trim();
        let phased = s.contains('|');
        let calls = s
            .split(&['/', '|'][..])
            .map(AlleleCall::from_token)
            .collect();
        Self { calls, phased }
    }

    pub fn calls(&self) -> &[AlleleCall] {
        &self.calls
    }

    fn alt_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == AlleleCall::Alt).count()
    }

    pub fn is_no_call(&self) -> bool {
        self.calls.iter().all(|c| *c == AlleleCall::NoCall)
    }

    pub fn is_hom_ref(&self) -> bool {
        !self.calls.is_empty() && self.calls.iter().all(|c| *c == AlleleCall::Ref)
    }

    /// All alleles are this variant's alt. Haploid `1` (hemizygous) counts.
    pub fn is_hom_alt(&self) -> bool {
        !self.calls.is_empty() && self.alt_count() == self.calls.len()
    }

    pub fn is_het(&self) -> bool {
        self.alt_count() > 0 && !self.is_hom_alt()
    }

    pub fn has_alt(&self) -> bool {
        self.alt_count() > 0
    }

    /// Phased and fully called.
    pub fn is_phased(&self) -> bool {
        self.phased
            && self.calls.len() >= 2
            && !self.calls.iter().any(|c| *c == AlleleCall::NoCall)
    }

    /// Haplotype index carrying the alt allele of a phased heterozygote.
    pub fn alt_haplotype(&self) -> Option<usize> {
        if !(self.is_phased() && self.is_het()) {
            return None;
        }
        self.calls.iter().position(|c| *c == AlleleCall::Alt)
    }
}

impl TryFrom<String> for GenotypeCall {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err("empty genotype string".to_string());
        }
        Ok(GenotypeCall::from_string(&value))
    }
}

impl From<GenotypeCall> for String {
    fn from(gt: GenotypeCall) -> Self {
        gt.to_string()
    }
}

impl fmt::Display for GenotypeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.phased { "|" } else { "/" };
        let tokens: Vec<&str> = self.calls.iter().map(|c| c.token()).collect();
        f.write_str(&tokens.join(sep))
    }
}

/// Sequence Ontology consequence of a variant on its gene
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VariantEffect {
    StartLost,
    StopGained,
    FrameshiftElongation,
    FrameshiftTruncation,
    FrameshiftVariant,
    SpliceAcceptorVariant,
    SpliceDonorVariant,
    ExonLossVariant,
    StopLost,
    InframeInsertion,
    InframeDeletion,
    MissenseVariant,
    SpliceRegionVariant,
    SynonymousVariant,
    FivePrimeUtrVariant,
    ThreePrimeUtrVariant,
    IntronVariant,
    UpstreamGeneVariant,
    DownstreamGeneVariant,
    RegulatoryRegionVariant,
    NonCodingTranscriptExonVariant,
    IntergenicVariant,
}

impl VariantEffect {
    /// Null-variant consequences.
    pub fn is_loss_of_function(&self) -> bool {
        matches!(
            self,
            VariantEffect::StartLost
                | VariantEffect::StopGained
                | VariantEffect::FrameshiftElongation
                | VariantEffect::FrameshiftTruncation
                | VariantEffect::FrameshiftVariant
                | VariantEffect::SpliceAcceptorVariant
                | VariantEffect::SpliceDonorVariant
                | VariantEffect::ExonLossVariant
        )
    }

    /// Non-coding consequences eligible for domain-based gene reassignment.
    pub fn is_regulatory(&self) -> bool {
        matches!(
            self,
            VariantEffect::FivePrimeUtrVariant
                | VariantEffect::ThreePrimeUtrVariant
                | VariantEffect::UpstreamGeneVariant
                | VariantEffect::DownstreamGeneVariant
                | VariantEffect::RegulatoryRegionVariant
                | VariantEffect::IntergenicVariant
        )
    }

    pub fn default_pathogenicity(&self) -> f64 {
        match self {
            VariantEffect::ExonLossVariant => 1.0,
            VariantEffect::StartLost
            | VariantEffect::StopGained
            | VariantEffect::FrameshiftElongation
            | VariantEffect::FrameshiftTruncation
            | VariantEffect::FrameshiftVariant => 0.95,
            VariantEffect::SpliceAcceptorVariant
            | VariantEffect::SpliceDonorVariant
            | VariantEffect::StopLost => 0.9,
            VariantEffect::InframeInsertion | VariantEffect::InframeDeletion => 0.85,
            VariantEffect::SpliceRegionVariant => 0.8,
            VariantEffect::MissenseVariant => 0.6,
            VariantEffect::RegulatoryRegionVariant => 0.15,
            VariantEffect::SynonymousVariant
            | VariantEffect::FivePrimeUtrVariant
            | VariantEffect::ThreePrimeUtrVariant
            | VariantEffect::IntronVariant
            | VariantEffect::UpstreamGeneVariant
            | VariantEffect::DownstreamGeneVariant
            | VariantEffect::NonCodingTranscriptExonVariant => 0.1,
            VariantEffect::IntergenicVariant => 0.0,
        }
    }
}

/// Reference population catalogs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrequencySource {
    ThousandGenomes,
    TopMed,
    Uk10k,
    EspAll,
    ExacAll,
    GnomadExomesAfr,
    GnomadExomesAmr,
    GnomadExomesEas,
    GnomadExomesNfe,
    GnomadExomesSas,
    GnomadGenomesAfr,
    GnomadGenomesAmr,
    GnomadGenomesEas,
    GnomadGenomesNfe,
    GnomadGenomesSas,
    Local,
}

/// Allele frequency, in percent (0-100)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Frequency {
    pub source: FrequencySource,
    pub percent: f64,
}

/// In-silico pathogenicity predictors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathogenicitySource {
    Polyphen,
    Sift,
    MutationTaster,
    Revel,
    Mvp,
    Cadd,
    AlphaMissense,
    SpliceAi,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PathogenicityPrediction {
    pub source: PathogenicitySource,
    pub score: f64,
}

impl PathogenicityPrediction {
    /// Score on a 0..1 scale where higher is more damaging. SIFT is inverted.
    pub fn normalised_score(&self) -> f64 {
        match self.source {
            PathogenicitySource::Sift => 1.0 - self.score,
            _ => self.score,
        }
    }

    pub fn is_pathogenic(&self) -> bool {
        match self.source {
            PathogenicitySource::Polyphen => self.score > 0.446,
            PathogenicitySource::Sift => self.score < 0.05,
            PathogenicitySource::MutationTaster => self.score > 0.5,
            PathogenicitySource::Revel => self.score > 0.5,
            PathogenicitySource::Mvp => self.score >= 0.75,
            PathogenicitySource::Cadd => self.score >= 0.99,
            PathogenicitySource::AlphaMissense => self.score >= 0.564,
            PathogenicitySource::SpliceAi => self.score >= 0.2,
        }
    }
}

/// Curated clinical interpretation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClinSig {
    Pathogenic,
    PathogenicOrLikelyPathogenic,
    LikelyPathogenic,
    UncertainSignificance,
    LikelyBenign,
    BenignOrLikelyBenign,
    Benign,
    ConflictingPathogenicity,
    NotProvided,
}

impl ClinSig {
    pub fn is_pathogenic_or_likely(&self) -> bool {
        matches!(
            self,
            ClinSig::Pathogenic | ClinSig::PathogenicOrLikelyPathogenic | ClinSig::LikelyPathogenic
        )
    }

    pub fn is_benign_or_likely(&self) -> bool {
        matches!(
            self,
            ClinSig::Benign | ClinSig::BenignOrLikelyBenign | ClinSig::LikelyBenign
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinVarData {
    pub primary_interpretation: ClinSig,
    /// Review status, 0 (no assertion criteria) to 4 (practice guideline).
    pub star_rating: u8,
    #[serde(default)]
    pub variation_id: Option<String>,
}

/// Identity of a variant allele, used to group multi-record sites
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.chromosome, self.position, self.reference, self.alternate
        )
    }
}

fn default_true() -> bool {
    true
}

/// A filtered, annotated variant allele considered for gene scoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateVariant {
    pub chromosome: String,
    /// 1-based position.
    pub position: u64,
    pub reference: String,
    pub alternate: String,
    pub gene_symbol: String,
    pub gene_id: String,
    pub effect: VariantEffect,
    #[serde(default)]
    pub hgvs: Option<String>,
    /// Genotype per sample id.
    pub genotypes: BTreeMap<String, GenotypeCall>,
    #[serde(default)]
    pub frequencies: Vec<Frequency>,
    #[serde(default)]
    pub predictions: Vec<PathogenicityPrediction>,
    #[serde(default)]
    pub clinvar: Option<ClinVarData>,
    /// Known pathogenic variants exempt from frequency ceilings.
    #[serde(default)]
    pub whitelisted: bool,
    #[serde(default = "default_true")]
    pub passed_filters: bool,
    #[serde(default)]
    pub compatible_modes: BTreeSet<ModeOfInheritance>,
}

impl CandidateVariant {
    pub fn key(&self) -> VariantKey {
        VariantKey {
            chromosome: normalize_chromosome(&self.chromosome),
            position: self.position,
            reference: self.reference.clone(),
            alternate: self.alternate.clone(),
        }
    }

    pub fn genotype(&self, sample: &str) -> Option<&GenotypeCall> {
        self.genotypes.get(sample)
    }

    /// Sample is called het or hom-alt for this allele.
    pub fn is_carried_by(&self, sample: &str) -> bool {
        self.genotype(sample).map_or(false, GenotypeCall::has_alt)
    }

    pub fn is_x_chromosomal(&self) -> bool {
        normalize_chromosome(&self.chromosome) == "X"
    }

    pub fn is_mitochondrial(&self) -> bool {
        normalize_chromosome(&self.chromosome) == "MT"
    }

    pub fn is_compatible_with(&self, mode: ModeOfInheritance) -> bool {
        self.compatible_modes.contains(&mode)
    }

    pub fn has_frequency_data(&self) -> bool {
        !self.frequencies.is_empty()
    }

    /// Highest population frequency in percent, 0 when absent.
    pub fn max_frequency(&self) -> f64 {
        self.frequencies
            .iter()
            .map(|f| f.percent)
            .fold(0.0, f64::max)
    }

    pub fn frequency_score(&self) -> f64 {
        let max_freq = self.max_frequency();
        if max_freq <= 0.0 {
            1.0
        } else if max_freq > 2.0 {
            0.0
        } else {
            (1.13533 - 0.13533 * max_freq.exp()).clamp(0.0, 1.0)
        }
    }

    pub fn pathogenicity_score(&self) -> f64 {
        let best_prediction = self
            .predictions
            .iter()
            .map(PathogenicityPrediction::normalised_score)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));

        match (self.effect, best_prediction) {
            (VariantEffect::MissenseVariant, Some(score)) => score,
            (effect, Some(score)) => effect.default_pathogenicity().max(score),
            (effect, None) => effect.default_pathogenicity(),
        }
    }

    /// Combined frequency x pathogenicity score in [0, 1].
    pub fn variant_score(&self) -> f64 {
        if self.whitelisted {
            1.0
        } else {
            self.frequency_score() * self.pathogenicity_score()
        }
    }

    pub fn has_pathogenic_clinvar(&self) -> bool {
        self.clinvar
            .as_ref()
            .map_or(false, |c| c.primary_interpretation.is_pathogenic_or_likely())
    }
}

/// A gene with its filtered variants and phenotype prioritization results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneCandidate {
    pub symbol: String,
    pub gene_id: String,
    #[serde(default)]
    pub variants: Vec<CandidateVariant>,
    /// Serialised as a list; keyed by the result's own type.
    #[serde(default, with = "priority_list")]
    pub priority_results: BTreeMap<PriorityType, PriorityResult>,
    #[serde(default)]
    pub compatible_modes: BTreeSet<ModeOfInheritance>,
}

impl GeneCandidate {
    pub fn new(symbol: impl Into<String>, gene_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            gene_id: gene_id.into(),
            variants: Vec::new(),
            priority_results: BTreeMap::new(),
            compatible_modes: BTreeSet::new(),
        }
    }

    pub fn add_priority_result(&mut self, result: PriorityResult) {
        self.priority_results.insert(result.priority_type(), result);
    }

    pub fn passed_variants(&self) -> impl Iterator<Item = &CandidateVariant> {
        self.variants.iter().filter(|v| v.passed_filters)
    }

    pub fn is_compatible_with(&self, mode: ModeOfInheritance) -> bool {
        self.compatible_modes.contains(&mode)
    }
}

mod priority_list {
    use super::{PriorityResult, PriorityType};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        results: &BTreeMap<PriorityType, PriorityResult>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(results.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<PriorityType, PriorityResult>, D::Error> {
        let results = Vec::<PriorityResult>::deserialize(deserializer)?;
        Ok(results
            .into_iter()
            .map(|r| (r.priority_type(), r))
            .collect())
    }
}

/// Score of one gene under one mode of inheritance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneScore {
    pub gene_symbol: String,
    pub gene_id: String,
    pub mode: ModeOfInheritance,
    pub variant_score: f64,
    pub phenotype_score: f64,
    pub combined_score: f64,
    pub p_value: f64,
    pub contributing_variants: Vec<CandidateVariant>,
    pub compatible_disease_matches: Vec<ModelPhenotypeMatch>,
    pub acmg_assignments: Vec<AcmgAssignment>,
}
