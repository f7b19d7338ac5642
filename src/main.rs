use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{generate, Shell};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use tracing::info;

use gene_prioritizer::parsers::{parse_pedigree, CandidateParser, RegionParser};
use gene_prioritizer::{
    AnalysisConfig, AnalysisResults, GeneConstraints, GenePrioritizer, ModeOfInheritance,
    Pedigree, PedigreeMendelianChecker, ReportFormat, ReportGenerator,
};

/// Rank candidate disease genes and classify their variants
#[derive(Parser, Debug)]
#[command(
    name = "gene-prioritizer",
    version,
    about = "Multithreaded gene prioritization with inheritance checks and ACMG classification",
    long_about = r#"
Scores annotated candidate genes for one proband:
- Inheritance compatibility per mode against the family pedigree
- Contributing allele selection (dominant, compound heterozygous, incomplete penetrance)
- Combined phenotype/variant score with a bootstrap p-value
- ACMG evidence assignment and classification of every contributing variant

Pedigrees are read from PED or JSON files; candidates from JSON (optionally gzipped).
"#
)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Pedigree file (.ped or .json); optional for a single sample
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pedigree: Option<PathBuf>,

    /// Annotated candidate genes (JSON, may be gzipped)
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    candidates: Option<PathBuf>,

    /// Proband id (defaults to the config, then the only affected member)
    #[arg(long)]
    proband: Option<String>,

    /// Analysis settings (TOML)
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Gene constraint table replacing the packaged one
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    constraints: Option<PathBuf>,

    /// Topological domains (BED) for regulatory variant reassignment
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    regions: Option<PathBuf>,

    /// Modes of inheritance to score (overrides the config)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    modes: Vec<ModeOfInheritance>,

    /// Seed for the null population (overrides the config)
    #[arg(long, env = "GENE_PRIORITIZER_SEED")]
    seed: Option<u64>,

    /// Number of threads (0 = auto-detect)
    #[arg(
        short,
        long,
        default_value = "0",
        help = "Number of threads (0 = auto)"
    )]
    threads: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "all")]
    format: ReportFormat,

    /// Output directory for reports
    #[arg(short, long, default_value = "./reports")]
    output: PathBuf,

    /// Number of top genes to print
    #[arg(long, default_value = "10")]
    top: usize,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions
    Completions { shell: Shell },
    /// List the supported modes of inheritance
    Modes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            return Ok(());
        }
        Some(Commands::Modes) => {
            list_modes();
            return Ok(());
        }
        None => {}
    }

    init_logging(cli.verbose);
    init_thread_pool(cli.threads)?;

    info!("Starting gene prioritization...");
    info!("Using {} threads", rayon::current_num_threads());

    run_analysis(&cli)
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "gene-prioritizer", &mut io::stdout());
}

fn list_modes() {
    println!("{}", style("Supported Modes of Inheritance:").bold().cyan());
    println!();

    let options = AnalysisConfig::default().inheritance_options();
    for mode in ModeOfInheritance::ALL {
        let ceiling = options.max_frequency(mode);
        let ceiling = match (ceiling.is_finite(), options.hom_alt_max_frequency(mode)) {
            (true, Some(hom_alt)) => format!(
                "max frequency {}% (compound het), {}% (homozygous)",
                ceiling, hom_alt
            ),
            (true, None) => format!("max frequency {}%", ceiling),
            (false, _) => "no frequency ceiling".to_string(),
        };
        println!(
            "  {} - {:?}",
            style(mode.abbreviation()).green().bold(),
            mode
        );
        println!("         {}", style(ceiling).dim());
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("gene_prioritizer={}", level))
        .init();
}

fn init_thread_pool(threads: usize) -> Result<()> {
    let num_threads = if threads == 0 {
        num_cpus::get()
    } else {
        threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .context("Failed to initialize thread pool")?;

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_path(path)?,
        None => AnalysisConfig::default(),
    };

    if !cli.modes.is_empty() {
        config.modes = cli.modes.clone();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.proband.is_some() {
        config.proband = cli.proband.clone();
    }
    config.validate()?;
    Ok(config)
}

fn load_constraints(cli: &Cli) -> Result<&'static GeneConstraints> {
    if let Some(path) = &cli.constraints {
        let constraints = GeneConstraints::from_path(path)
            .with_context(|| format!("Failed to load constraints: {}", path.display()))?;
        info!("Loaded {} gene constraints from {}", constraints.len(), path.display());
        GeneConstraints::install(constraints)?;
    }
    GeneConstraints::global().context("Failed to load the packaged gene constraints")
}

/// The configured proband, or the pedigree's only affected member.
fn resolve_proband(config: &AnalysisConfig, pedigree: &Pedigree) -> Result<String> {
    if let Some(proband) = &config.proband {
        return Ok(proband.clone());
    }

    let affected: Vec<&str> = pedigree.affected().map(|m| m.id.as_str()).collect();
    match affected.as_slice() {
        [only] => Ok(only.to_string()),
        [] if pedigree.is_single_sample() => Ok(pedigree.members()[0].id.clone()),
        _ => bail!(
            "cannot infer the proband from {} affected members; pass --proband",
            affected.len()
        ),
    }
}

fn run_analysis(cli: &Cli) -> Result<()> {
    let Some(candidates_path) = &cli.candidates else {
        bail!("--candidates is required");
    };

    let config = load_config(cli)?;
    let constraints = load_constraints(cli)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading candidate genes...");
    let candidates = CandidateParser::new().parse(candidates_path)?;

    pb.set_message("Loading pedigree...");
    let pedigree = match (&cli.pedigree, candidates.samples.as_slice()) {
        (Some(path), _) => parse_pedigree(path)?,
        (None, [sample]) => Pedigree::single_sample(sample.clone()),
        (None, samples) => bail!(
            "--pedigree is required for {} samples",
            samples.len()
        ),
    };
    let proband = resolve_proband(&config, &pedigree)?;
    info!(
        "Family {}: {} members, proband {}",
        pedigree.family_id(),
        pedigree.len(),
        proband
    );

    let domains = match &cli.regions {
        Some(path) => {
            pb.set_message("Indexing topological domains...");
            Some(RegionParser::new().load_index(path)?)
        }
        None => None,
    };

    pb.set_message("Scoring genes...");
    let mut prioritizer =
        GenePrioritizer::new(&config, constraints, PedigreeMendelianChecker::new())
            .with_progress(pb.clone());
    if let Some(domains) = &domains {
        prioritizer = prioritizer.with_domains(domains);
    }
    let results = prioritizer.run(candidates, &pedigree, &proband)?;
    pb.finish_with_message("Scoring complete");

    let generator = ReportGenerator::new(&cli.output)?;
    generator.generate(&results, cli.format)?;

    print_summary(&results, cli.top);
    println!(
        "\n{} Reports written to {}",
        style("✓").green().bold(),
        style(cli.output.display()).cyan()
    );

    Ok(())
}

fn print_summary(results: &AnalysisResults, top: usize) {
    println!();
    println!(
        "{} ({} genes, {} variants, {} model)",
        style("Top ranked genes:").bold().cyan(),
        results.gene_count,
        results.variant_count,
        results.model
    );

    for (rank, score) in results.best_per_gene().into_iter().take(top).enumerate() {
        println!(
            "  {:>3}. {} {} combined {:.3} (p = {:.2e})",
            rank + 1,
            style(&score.gene_symbol).green().bold(),
            style(score.mode.abbreviation()).yellow(),
            score.combined_score,
            score.p_value
        );
        for assignment in &score.acmg_assignments {
            println!(
                "         {} {} [{}]",
                style(&assignment.variant).dim(),
                assignment.classification,
                assignment.evidence
            );
        }
    }
}
