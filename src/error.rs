use thiserror::Error;

/// Fatal pedigree/sample configuration problems, raised before any analysis starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PedigreeError {
    #[error("pedigree contains no members")]
    Empty,

    #[error("pedigree must describe a single family, found: {}", .0.join(", "))]
    MultipleFamilies(Vec<String>),

    #[error("duplicate pedigree member: {0}")]
    DuplicateMember(String),

    #[error("pedigree with {0} members has no affected individual")]
    NoAffectedMembers(usize),

    #[error("proband '{0}' is not present in the pedigree")]
    ProbandNotFound(String),

    #[error("proband '{0}' is not affected")]
    ProbandNotAffected(String),

    #[error(
        "sample names do not match the pedigree (not in pedigree: [{}]; not in samples: [{}])",
        .not_in_pedigree.join(", "),
        .not_in_samples.join(", ")
    )]
    SampleMismatch {
        not_in_pedigree: Vec<String>,
        not_in_samples: Vec<String>,
    },
}

/// Problems loading the gene constraint reference table.
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("failed to read gene constraint table: {0}")]
    Io(#[from] std::io::Error),

    #[error("gene constraint table has no usable header: {0}")]
    Header(#[from] csv::Error),

    #[error("gene constraint table has no usable rows")]
    EmptyTable,

    #[error("gene constraint table has already been loaded")]
    AlreadyLoaded,
}

/// Errors surfaced by the prioritization pipeline.
#[derive(Debug, Error)]
pub enum PrioritizerError {
    #[error(transparent)]
    Pedigree(#[from] PedigreeError),

    #[error("mendelian compatibility check failed for {mode}: {message}")]
    MendelianCheck { mode: String, message: String },
}
