//! mtprep CLI - vocabulary building and batch preparation for translation corpora.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use mtprep_core::{PipelineConfig, Side, SplitReport, UnknownTokenPolicy};
use mtprep_data::{
    build_tokenizer, CallbackList, CorpusBuilder, DataLoader, DataLoaderConfig, LengthHistogram,
    LoggingCallback, PadCollator, ParallelCorpus, ProgressCallback, TranslationBatch,
    TranslationDataset, VocabPair, DEFAULT_BINS,
};

#[derive(Parser)]
#[command(name = "mtprep")]
#[command(author, version, about = "Vocabulary building and batching for translation corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build vocabularies and encode every configured split
    Build {
        /// Path to pipeline configuration file (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Source vocabulary size, reserved tokens included
        #[arg(long)]
        source_vocab_size: Option<usize>,

        /// Target vocabulary size, reserved tokens included
        #[arg(long)]
        target_vocab_size: Option<usize>,

        /// Exclusive upper bound on source sequence length
        #[arg(long)]
        maxlen_in: Option<usize>,

        /// Exclusive upper bound on target sequence length, sos/eos included
        #[arg(long)]
        maxlen_out: Option<usize>,

        /// Vocabulary artifact output path
        #[arg(long)]
        vocab_file: Option<PathBuf>,

        /// Sample artifact output path
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Fail on tokens outside the vocabulary instead of substituting unk
        #[arg(long)]
        reject_unknown: bool,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Print one encoded sample as ids and text
    Inspect {
        /// Path to pipeline configuration file (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Split to read from
        #[arg(short, long, default_value = "train")]
        split: String,

        /// Sample index within the split
        #[arg(short, long, default_value = "0")]
        index: usize,
    },

    /// Show token length histograms for a split
    Stats {
        /// Path to pipeline configuration file (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Split to analyze (defaults to the vocabulary split)
        #[arg(short, long)]
        split: Option<String>,

        /// Number of histogram bins
        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,

        /// Width of the longest bar
        #[arg(long, default_value = "50")]
        width: usize,
    },

    /// Collate and print the first batch of a split
    Batch {
        /// Path to pipeline configuration file (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Split to batch
        #[arg(short, long, default_value = "train")]
        split: String,

        /// Batch size
        #[arg(long)]
        batch_size: Option<usize>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        /// Keep file order
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Write a sample configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "mtprep.yaml")]
        output: String,
    },
}

/// Command-line overrides for `build`.
#[derive(Debug, Default)]
struct BuildOverrides {
    source_vocab_size: Option<usize>,
    target_vocab_size: Option<usize>,
    maxlen_in: Option<usize>,
    maxlen_out: Option<usize>,
    vocab_file: Option<PathBuf>,
    data_file: Option<PathBuf>,
    reject_unknown: bool,
}

impl BuildOverrides {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(size) = self.source_vocab_size {
            config.vocab.source_size = size;
        }
        if let Some(size) = self.target_vocab_size {
            config.vocab.target_size = size;
        }
        if let Some(len) = self.maxlen_in {
            config.lengths.maxlen_in = len;
        }
        if let Some(len) = self.maxlen_out {
            config.lengths.maxlen_out = len;
        }
        if let Some(path) = self.vocab_file {
            config.corpus.vocab_file = path;
        }
        if let Some(path) = self.data_file {
            config.corpus.data_file = path;
        }
        if self.reject_unknown {
            config.vocab.unknown_policy = UnknownTokenPolicy::Reject;
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            source_vocab_size,
            target_vocab_size,
            maxlen_in,
            maxlen_out,
            vocab_file,
            data_file,
            reject_unknown,
            no_progress,
        } => {
            let mut config = load_config(config.as_deref())?;
            BuildOverrides {
                source_vocab_size,
                target_vocab_size,
                maxlen_in,
                maxlen_out,
                vocab_file,
                data_file,
                reject_unknown,
            }
            .apply(&mut config);
            config.validate()?;
            run_build(config, !no_progress)?;
        }

        Commands::Inspect {
            config,
            split,
            index,
        } => {
            let config = load_config(config.as_deref())?;
            config.validate()?;
            run_inspect(&config, &split, index)?;
        }

        Commands::Stats {
            config,
            split,
            bins,
            width,
        } => {
            let config = load_config(config.as_deref())?;
            config.validate()?;
            let split = split.unwrap_or_else(|| config.corpus.vocab_split.clone());
            run_stats(&config, &split, bins, width)?;
        }

        Commands::Batch {
            config,
            split,
            batch_size,
            seed,
            no_shuffle,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(size) = batch_size {
                config.batch.batch_size = size;
            }
            if let Some(seed) = seed {
                config.batch.seed = seed;
            }
            if no_shuffle {
                config.batch.shuffle = false;
            }
            config.validate()?;
            run_batch(&config, &split)?;
        }

        Commands::Init { output } => {
            generate_sample_config(Path::new(&output))?;
        }
    }

    Ok(())
}

/// Load the config file if given, else the defaults.
///
/// Not validated here; callers validate once their flag overrides are applied.
fn load_config(path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading config from {}", path);
            Ok(PipelineConfig::parse_yaml_file(path)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Build and persist the vocabulary and sample artifacts.
fn run_build(config: PipelineConfig, progress: bool) -> anyhow::Result<()> {
    println!("========================================");
    println!("  mtprep Build");
    println!("========================================");
    println!("Vocab split:  {}", config.corpus.vocab_split);
    println!(
        "Vocab sizes:  source {} / target {}",
        config.vocab.source_size, config.vocab.target_size
    );
    println!(
        "Max lengths:  source < {} / target < {}",
        config.lengths.maxlen_in, config.lengths.maxlen_out
    );
    println!("========================================\n");

    let mut callbacks = CallbackList::new();
    if progress {
        callbacks.push(ProgressCallback::new());
    }
    callbacks.push(LoggingCallback::new());

    let builder = CorpusBuilder::from_config(config)?;
    let output = builder.build(&mut callbacks)?;
    output.save(builder.config())?;

    println!("\n{}", format_reports(&output.reports));
    println!(
        "Vocabulary:   source {} / target {} entries",
        output.vocabs.source.len(),
        output.vocabs.target.len()
    );
    println!("Source lengths\n{}", output.source_lengths.render(50));
    println!("Target lengths\n{}", output.target_lengths.render(50));
    println!(
        "Wrote {} and {}",
        builder.config().corpus.vocab_file.display(),
        builder.config().corpus.data_file.display()
    );
    Ok(())
}

fn format_reports(reports: &[SplitReport]) -> String {
    let mut lines = vec![format!(
        "{:<10} {:>8} {:>8} {:>8} {:>10} {:>10}",
        "split", "lines", "kept", "dropped", "src_unk", "tgt_unk"
    )];
    for r in reports {
        lines.push(format!(
            "{:<10} {:>8} {:>8} {:>8} {:>10} {:>10}",
            r.split, r.lines, r.kept, r.dropped, r.source_unknown, r.target_unknown
        ));
    }
    lines.join("\n")
}

/// Print sample `index` of `split` as ids and decoded text.
fn run_inspect(config: &PipelineConfig, split: &str, index: usize) -> anyhow::Result<()> {
    let vocabs = VocabPair::load(&config.corpus.vocab_file, &config.special)?;
    let dataset = TranslationDataset::load(&config.corpus.data_file, split)?;
    let (source_ids, target_ids) = dataset.pair(index)?;
    let (source_text, target_text) = render_sample(&vocabs, &source_ids, &target_ids);

    println!("{}[{}] of {}", split, index, dataset.len());
    println!("source ids:  {:?}", source_ids);
    println!("source text: {}", source_text);
    println!("target ids:  {:?}", target_ids);
    println!("target text: {}", target_text);
    Ok(())
}

/// Decode a sample: source tokens space-joined, target tokens concatenated.
fn render_sample(vocabs: &VocabPair, source_ids: &[u32], target_ids: &[u32]) -> (String, String) {
    let source = vocabs.side(Side::Source).decode(source_ids).join(" ");
    let target = vocabs.side(Side::Target).decode(target_ids).concat();
    (source, target)
}

/// Tokenize a split's raw files and print length histograms.
fn run_stats(config: &PipelineConfig, split: &str, bins: usize, width: usize) -> anyhow::Result<()> {
    let files = config.corpus.split(split).ok_or_else(|| {
        anyhow::anyhow!(
            "split '{}' is not configured (available: {})",
            split,
            config
                .corpus
                .splits
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;
    let corpus = ParallelCorpus::load_split(files)?;

    for (side, lines, kind) in [
        (Side::Source, corpus.source(), &config.tokenizers.source),
        (Side::Target, corpus.target(), &config.tokenizers.target),
    ] {
        let tokenizer = build_tokenizer(kind, &config.special)?;
        let mut lengths = Vec::with_capacity(lines.len());
        for line in lines {
            lengths.push(tokenizer.tokenize(line)?.len());
        }
        let hist = LengthHistogram::new(&lengths, bins);
        println!("{} ({})", side, tokenizer.name());
        println!("{}", hist.render(width));
    }
    Ok(())
}

/// Collate the first batch of a split and print it.
fn run_batch(config: &PipelineConfig, split: &str) -> anyhow::Result<()> {
    let dataset = TranslationDataset::load(&config.corpus.data_file, split)?;
    let collator = PadCollator::from_config(config)?;
    let mut loader = DataLoader::new(
        dataset,
        collator,
        DataLoaderConfig::from(&config.batch),
    )?;

    println!(
        "{} samples, {} batches of up to {}",
        loader.len(),
        loader.num_batches(),
        config.batch.batch_size
    );
    match loader.next_batch() {
        Some(batch) => print_batch(&batch?),
        None => println!("split '{}' is empty", split),
    }
    Ok(())
}

fn print_batch(batch: &TranslationBatch) {
    println!(
        "padded_source {:?}\n{}",
        batch.padded_source.dim(),
        batch.padded_source
    );
    println!(
        "padded_target {:?}\n{}",
        batch.padded_target.dim(),
        batch.padded_target
    );
    println!("source_lengths {}", batch.source_lengths);
    println!("order {:?}", batch.order);
}

/// Write a sample configuration with every default spelled out.
fn generate_sample_config(output: &Path) -> anyhow::Result<()> {
    let config = PipelineConfig::default();
    let yaml = serde_yaml::to_string(&config)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, yaml)?;
    println!("Sample configuration written to {}", output.display());
    Ok(())
}
