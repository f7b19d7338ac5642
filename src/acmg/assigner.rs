use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::{AcmgClassification, AcmgClassifier};
use super::evidence::{AcmgCriterion, AcmgEvidence, EvidenceStrength};
use crate::constraint::GeneConstraints;
use crate::pedigree::Pedigree;
use crate::priority::{Disease, ModelPhenotypeMatch};
use crate::types::{
    CandidateVariant, FrequencySource, ModeOfInheritance, VariantEffect, VariantKey,
};

/// Frequency (percent) at or above which a variant is benign on its own.
pub const STAND_ALONE_BENIGN_FREQUENCY: f64 = 5.0;
/// Default minimum disease-match score for phenotype specificity.
pub const PHENOTYPE_SPECIFICITY_THRESHOLD: f64 = 0.6;

/// Classification of one contributing variant for one gene and mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcmgAssignment {
    pub variant: VariantKey,
    #[serde(default)]
    pub hgvs: Option<String>,
    pub gene_symbol: String,
    pub mode: ModeOfInheritance,
    pub disease: Option<Disease>,
    pub evidence: AcmgEvidence,
    pub classification: AcmgClassification,
}

/// Facts the criteria are evaluated against
#[derive(Debug, Clone, Copy)]
pub struct AcmgContext<'a> {
    pub variant: &'a CandidateVariant,
    pub gene_symbol: &'a str,
    pub mode: ModeOfInheritance,
    /// Every contributing variant of the gene under `mode`, `variant` included.
    pub contributing: &'a [&'a CandidateVariant],
    pub disease_match: Option<&'a ModelPhenotypeMatch>,
}

type RuleOutcome = Option<(AcmgCriterion, EvidenceStrength)>;
type AcmgRule = fn(&AcmgEvidenceAssigner, &AcmgContext) -> RuleOutcome;

const RULES: [AcmgRule; 11] = [
    null_variant,
    de_novo,
    absent_from_population,
    in_trans_with_pathogenic,
    protein_length_change,
    computational_evidence,
    phenotype_specificity,
    reputable_source_pathogenic,
    common_in_population,
    non_segregation,
    reputable_source_benign,
];

pub struct AcmgEvidenceAssigner<'a> {
    pedigree: &'a Pedigree,
    proband: &'a str,
    constraints: &'a GeneConstraints,
    phenotype_specificity_threshold: f64,
    classifier: AcmgClassifier,
}

impl<'a> AcmgEvidenceAssigner<'a> {
    pub fn new(
        pedigree: &'a Pedigree,
        proband: &'a str,
        constraints: &'a GeneConstraints,
    ) -> Self {
        Self {
            pedigree,
            proband,
            constraints,
            phenotype_specificity_threshold: PHENOTYPE_SPECIFICITY_THRESHOLD,
            classifier: AcmgClassifier::new(),
        }
    }

    pub fn with_phenotype_specificity_threshold(mut self, threshold: f64) -> Self {
        self.phenotype_specificity_threshold = threshold;
        self
    }

    pub fn assign(&self, context: &AcmgContext) -> AcmgEvidence {
        RULES.iter().filter_map(|rule| rule(self, context)).collect()
    }

    /// One assignment per contributing variant, matched against the
    /// best-scoring compatible disease.
    pub fn assignments(
        &self,
        gene_symbol: &str,
        mode: ModeOfInheritance,
        contributing: &[&CandidateVariant],
        disease_matches: &[ModelPhenotypeMatch],
    ) -> Vec<AcmgAssignment> {
        let disease_match = disease_matches
            .iter()
            .fold(None, |best: Option<&ModelPhenotypeMatch>, m| match best {
                Some(b) if b.score >= m.score => Some(b),
                _ => Some(m),
            });

        contributing
            .iter()
            .map(|&variant| {
                let context = AcmgContext {
                    variant,
                    gene_symbol,
                    mode,
                    contributing,
                    disease_match,
                };
                let evidence = self.assign(&context);
                let classification = self.classifier.classify(&evidence);
                debug!(
                    "{} {} {}: [{}] => {}",
                    gene_symbol,
                    mode,
                    variant.key(),
                    evidence,
                    classification
                );

                AcmgAssignment {
                    variant: variant.key(),
                    hgvs: variant.hgvs.clone(),
                    gene_symbol: gene_symbol.to_string(),
                    mode,
                    disease: disease_match.and_then(|m| m.disease.clone()),
                    evidence,
                    classification,
                }
            })
            .collect()
    }
}

// Each rule inspects one fact set and yields at most one criterion.

/// PVS1: null variant under "Any", a recessive mode, or a dominant mode in a
/// LOF-intolerant gene.
fn null_variant(assigner: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    let applies = ctx.variant.effect.is_loss_of_function()
        && (ctx.mode == ModeOfInheritance::Any
            || ctx.mode.is_recessive()
            || (ctx.mode.is_dominant()
                && assigner.constraints.is_loss_of_function_intolerant(ctx.gene_symbol)));
    applies.then_some((AcmgCriterion::PVS1, EvidenceStrength::VeryStrong))
}

/// PS2: at least two ancestors, all called, unaffected and without the allele.
fn de_novo(assigner: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    if !ctx.mode.is_dominant() || !ctx.variant.is_carried_by(assigner.proband) {
        return None;
    }
    let ancestors = assigner.pedigree.ancestors_of(assigner.proband);
    let clean = ancestors.len() >= 2
        && ancestors.iter().all(|a| {
            !a.is_affected()
                && ctx
                    .variant
                    .genotype(&a.id)
                    .map_or(false, |gt| !gt.is_no_call() && !gt.has_alt())
        });
    clean.then_some((AcmgCriterion::PS2, EvidenceStrength::Strong))
}

/// PM2: no reference catalog reports the allele.
fn absent_from_population(_: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    let absent = ctx
        .variant
        .frequencies
        .iter()
        .all(|f| f.source == FrequencySource::Local || f.percent <= 0.0);
    absent.then_some((AcmgCriterion::PM2, EvidenceStrength::Moderate))
}

/// PM3: phased recessive pair whose partner is curated pathogenic.
fn in_trans_with_pathogenic(assigner: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    if !ctx.mode.is_recessive() || ctx.contributing.len() != 2 {
        return None;
    }
    let phased = |v: &CandidateVariant| {
        v.genotype(assigner.proband)
            .map_or(false, |gt| gt.is_phased() && gt.is_het())
    };
    let key = ctx.variant.key();
    let partner = ctx.contributing.iter().find(|v| v.key() != key)?;

    (phased(ctx.variant) && phased(*partner) && partner.has_pathogenic_clinvar())
        .then_some((AcmgCriterion::PM3, EvidenceStrength::Moderate))
}

/// PM4: stop-loss.
fn protein_length_change(_: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    (ctx.variant.effect == VariantEffect::StopLost)
        .then_some((AcmgCriterion::PM4, EvidenceStrength::Moderate))
}

/// PP3 / BP4: strict majority of at least two predictors.
fn computational_evidence(_: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    let predictions = &ctx.variant.predictions;
    if predictions.len() < 2 {
        return None;
    }
    let damaging = predictions.iter().filter(|p| p.is_pathogenic()).count();
    let benign = predictions.len() - damaging;

    if damaging > benign {
        Some((AcmgCriterion::PP3, EvidenceStrength::Supporting))
    } else if benign > damaging {
        Some((AcmgCriterion::BP4, EvidenceStrength::Supporting))
    } else {
        None
    }
}

/// PP4: the matched disease's phenotype score clears the threshold.
fn phenotype_specificity(assigner: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    let disease_match = ctx.disease_match?;
    (disease_match.score >= assigner.phenotype_specificity_threshold)
        .then_some((AcmgCriterion::PP4, EvidenceStrength::Supporting))
}

/// PP5: curated pathogenic, strong from two stars.
fn reputable_source_pathogenic(_: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    let clinvar = ctx.variant.clinvar.as_ref()?;
    if !clinvar.primary_interpretation.is_pathogenic_or_likely() {
        return None;
    }
    match clinvar.star_rating {
        0 => None,
        1 => Some((AcmgCriterion::PP5, EvidenceStrength::Supporting)),
        _ => Some((AcmgCriterion::PP5, EvidenceStrength::Strong)),
    }
}

/// BA1
fn common_in_population(_: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    (ctx.variant.max_frequency() >= STAND_ALONE_BENIGN_FREQUENCY)
        .then_some((AcmgCriterion::BA1, EvidenceStrength::StandAlone))
}

/// BS4: the proband carries the allele but an affected relative is called without it.
fn non_segregation(assigner: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    if assigner.pedigree.len() < 2 || !ctx.variant.is_carried_by(assigner.proband) {
        return None;
    }
    let segregation_broken = assigner
        .pedigree
        .affected()
        .filter(|m| m.id != assigner.proband)
        .any(|m| {
            ctx.variant
                .genotype(&m.id)
                .map_or(false, |gt| !gt.is_no_call() && !gt.has_alt())
        });
    segregation_broken.then_some((AcmgCriterion::BS4, EvidenceStrength::Strong))
}

/// BP6: curated benign with at least one star.
fn reputable_source_benign(_: &AcmgEvidenceAssigner, ctx: &AcmgContext) -> RuleOutcome {
    let clinvar = ctx.variant.clinvar.as_ref()?;
    (clinvar.primary_interpretation.is_benign_or_likely() && clinvar.star_rating >= 1)
        .then_some((AcmgCriterion::BP6, EvidenceStrength::Supporting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::GeneConstraint;
    use crate::pedigree::tests::trio;
    use crate::pedigree::{AffectionStatus, FamilyMember, Sex};
    use crate::priority::Organism;
    use crate::types::tests::{missense, variant};
    use crate::types::{
        ClinSig, ClinVarData, Frequency, PathogenicityPrediction, PathogenicitySource,
    };

    fn tolerant(symbol: &str) -> GeneConstraints {
        [GeneConstraint {
            gene_symbol: symbol.to_string(),
            transcript: "ENST0001".to_string(),
            pli: 0.0,
            loeuf: 1.4,
            loeuf_lower: 1.1,
            loeuf_upper: 1.8,
        }]
        .into_iter()
        .collect()
    }

    fn context<'a>(
        variant: &'a CandidateVariant,
        mode: ModeOfInheritance,
        contributing: &'a [&'a CandidateVariant],
    ) -> AcmgContext<'a> {
        AcmgContext {
            variant,
            gene_symbol: "GENE1",
            mode,
            contributing,
            disease_match: None,
        }
    }

    #[test]
    fn test_heterozygous_stop_gain_is_likely_pathogenic() {
        let pedigree = Pedigree::single_sample("proband");
        let constraints = GeneConstraints::default();
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints);

        let stop = variant("1", 100, VariantEffect::StopGained, &[("proband", "0/1")]);
        let assignments =
            assigner.assignments("GENE1", ModeOfInheritance::AutosomalDominant, &[&stop], &[]);

        assert_eq!(assignments.len(), 1);
        let evidence = &assignments[0].evidence;
        let criteria: Vec<AcmgCriterion> = evidence.iter().map(|(c, _)| c).collect();
        assert_eq!(criteria, vec![AcmgCriterion::PVS1, AcmgCriterion::PM2]);
        assert_eq!(
            assignments[0].classification,
            AcmgClassification::LikelyPathogenic
        );
    }

    #[test]
    fn test_null_variant_needs_intolerance_when_dominant() {
        let pedigree = Pedigree::single_sample("proband");
        let constraints = tolerant("GENE1");
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints);
        let stop = variant("1", 100, VariantEffect::StopGained, &[("proband", "1/1")]);

        let dominant = assigner.assign(&context(&stop, ModeOfInheritance::AutosomalDominant, &[]));
        assert!(!dominant.contains(AcmgCriterion::PVS1));
        let recessive =
            assigner.assign(&context(&stop, ModeOfInheritance::AutosomalRecessive, &[]));
        assert!(recessive.contains(AcmgCriterion::PVS1));
    }

    #[test]
    fn test_null_variant_counts_under_any_mode() {
        let pedigree = Pedigree::single_sample("proband");
        let constraints = tolerant("GENE1");
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints);
        let stop = variant("1", 100, VariantEffect::StopGained, &[("proband", "0/1")]);

        let any = assigner.assignments("GENE1", ModeOfInheritance::Any, &[&stop], &[]);
        assert!(any[0].evidence.contains(AcmgCriterion::PVS1));
        assert_eq!(any[0].classification, AcmgClassification::LikelyPathogenic);

        let intolerant = GeneConstraints::default();
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &intolerant);
        let dominant =
            assigner.assignments("GENE1", ModeOfInheritance::AutosomalDominant, &[&stop], &[]);
        assert_eq!(dominant[0].classification, any[0].classification);
    }

    #[test]
    fn test_common_variant_is_benign_despite_predictions() {
        let pedigree = Pedigree::single_sample("proband");
        let constraints = GeneConstraints::default();
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints);

        let mut common = missense(0.95);
        common.predictions.push(PathogenicityPrediction {
            source: PathogenicitySource::Polyphen,
            score: 0.99,
        });
        common.frequencies.push(Frequency {
            source: FrequencySource::GnomadGenomesNfe,
            percent: 6.0,
        });

        let assignments =
            assigner.assignments("GENE1", ModeOfInheritance::AutosomalDominant, &[&common], &[]);
        let evidence = &assignments[0].evidence;
        assert!(evidence.contains(AcmgCriterion::BA1));
        assert!(evidence.contains(AcmgCriterion::PP3));
        assert_eq!(assignments[0].classification, AcmgClassification::Benign);
    }

    #[test]
    fn test_de_novo_in_trio() {
        let pedigree = trio();
        let constraints = GeneConstraints::default();
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints);

        let de_novo = variant(
            "1",
            100,
            VariantEffect::MissenseVariant,
            &[("proband", "0/1"), ("father", "0/0"), ("mother", "0/0")],
        );
        let evidence = assigner.assign(&context(
            &de_novo,
            ModeOfInheritance::AutosomalDominant,
            &[],
        ));
        assert_eq!(
            evidence.strength_of(AcmgCriterion::PS2),
            Some(EvidenceStrength::Strong)
        );

        let uncalled_mother = variant(
            "1",
            100,
            VariantEffect::MissenseVariant,
            &[("proband", "0/1"), ("father", "0/0"), ("mother", "./.")],
        );
        assert!(!assigner
            .assign(&context(&uncalled_mother, ModeOfInheritance::AutosomalDominant, &[]))
            .contains(AcmgCriterion::PS2));
    }

    #[test]
    fn test_in_trans_with_pathogenic_partner() {
        let pedigree = trio();
        let constraints = GeneConstraints::default();
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints);

        let first = variant("1", 100, VariantEffect::MissenseVariant, &[("proband", "0|1")]);
        let mut partner = variant("1", 200, VariantEffect::MissenseVariant, &[("proband", "1|0")]);
        partner.clinvar = Some(ClinVarData {
            primary_interpretation: ClinSig::Pathogenic,
            star_rating: 2,
            variation_id: None,
        });

        let pair = [&first, &partner];
        let evidence = assigner.assign(&context(&first, ModeOfInheritance::AutosomalRecessive, &pair));
        assert!(evidence.contains(AcmgCriterion::PM3));

        let partner_evidence =
            assigner.assign(&context(&partner, ModeOfInheritance::AutosomalRecessive, &pair));
        assert!(!partner_evidence.contains(AcmgCriterion::PM3));
        assert_eq!(
            partner_evidence.strength_of(AcmgCriterion::PP5),
            Some(EvidenceStrength::Strong)
        );
    }

    #[test]
    fn test_non_segregation_and_benign_report() {
        let pedigree = Pedigree::new(vec![
            FamilyMember {
                id: "proband".to_string(),
                family_id: "FAM".to_string(),
                father_id: None,
                mother_id: None,
                sex: Sex::Male,
                status: AffectionStatus::Affected,
            },
            FamilyMember {
                id: "brother".to_string(),
                family_id: "FAM".to_string(),
                father_id: None,
                mother_id: None,
                sex: Sex::Male,
                status: AffectionStatus::Affected,
            },
        ])
        .unwrap();
        let constraints = GeneConstraints::default();
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints);

        let mut v = variant(
            "1",
            100,
            VariantEffect::MissenseVariant,
            &[("proband", "0/1"), ("brother", "0/0")],
        );
        v.clinvar = Some(ClinVarData {
            primary_interpretation: ClinSig::LikelyBenign,
            star_rating: 1,
            variation_id: Some("12345".to_string()),
        });

        let evidence = assigner.assign(&context(&v, ModeOfInheritance::Any, &[]));
        assert!(evidence.contains(AcmgCriterion::BS4));
        assert!(evidence.contains(AcmgCriterion::BP6));
    }

    #[test]
    fn test_phenotype_specificity_and_tied_predictions() {
        let pedigree = Pedigree::single_sample("proband");
        let constraints = GeneConstraints::default();
        let assigner = AcmgEvidenceAssigner::new(&pedigree, "proband", &constraints)
            .with_phenotype_specificity_threshold(0.7);

        let mut v = missense(0.9);
        v.predictions.push(PathogenicityPrediction {
            source: PathogenicitySource::Sift,
            score: 0.5,
        });
        let disease_match = ModelPhenotypeMatch {
            model_id: "OMIM:100".to_string(),
            organism: Organism::Human,
            score: 0.75,
            disease: None,
        };

        let assignments = assigner.assignments(
            "GENE1",
            ModeOfInheritance::AutosomalDominant,
            &[&v],
            std::slice::from_ref(&disease_match),
        );
        let evidence = &assignments[0].evidence;
        assert!(evidence.contains(AcmgCriterion::PP4));
        assert!(!evidence.contains(AcmgCriterion::PP3));
        assert!(!evidence.contains(AcmgCriterion::BP4));
    }
}
