mod batch;
mod server;

use anyhow::Context;
use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use farsi_norm::{
    detect_all, detect_numbers, jaccard_similarity, longest_common_subsequence, DigitScript,
    NormalizationConfig, Normalizer, SimilarityRequest, SimilarityScorer,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(ClapParser)]
#[command(author, version, about = "Persian text normalization toolkit")]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a file (or stdin) and print the result
    Normalize {
        #[arg(long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the numbers found in a file (or stdin) as JSON
    Numbers {
        #[arg(long)]
        input: Option<PathBuf>,

        /// Also detect spelled-out Persian numbers
        #[arg(long)]
        words: bool,
    },
    /// Score a JSON similarity request from a file (or stdin)
    Similarity {
        #[arg(long)]
        request: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Metric::Cosine)]
        metric: Metric,
    },
    /// Normalize every file of a directory tree in parallel
    Batch {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Serve the engine over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        host: String,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Metric {
    Cosine,
    Jaccard,
    Lcs,
}

/// Normalization switches. Flags are OR-ed on top of `--config`.
#[derive(Args)]
struct ConfigArgs {
    /// JSON file with a normalization config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable every spacing, URL and punctuation switch
    #[arg(long)]
    all: bool,

    #[arg(long)]
    convert_half_space: bool,
    #[arg(long)]
    restore_half_space: bool,
    #[arg(long)]
    combine_space: bool,
    #[arg(long)]
    remove_outer_space: bool,
    #[arg(long)]
    remove_url: bool,
    #[arg(long)]
    normalize_punctuation: bool,
    #[arg(long)]
    remove_punctuation: bool,
    #[arg(long)]
    normalize_characters: bool,
    #[arg(long)]
    lowercase: bool,
    #[arg(long)]
    end_with_eol: bool,

    /// Spell out digit runs in this language (en, fa)
    #[arg(long, value_name = "LANG")]
    int_to_word: Option<String>,

    /// Rewrite digits into one script (ascii, persian, arabic)
    #[arg(long, value_name = "SCRIPT")]
    digit_script: Option<String>,
}

impl ConfigArgs {
    fn resolve(&self) -> anyhow::Result<NormalizationConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None if self.all => NormalizationConfig::full(),
            None => NormalizationConfig::default(),
        };
        if self.all && self.config.is_some() {
            let full = NormalizationConfig::full();
            cfg.convert_half_space |= full.convert_half_space;
            cfg.combine_space |= full.combine_space;
            cfg.remove_outer_space |= full.remove_outer_space;
            cfg.remove_url |= full.remove_url;
            cfg.normalize_punctuation |= full.normalize_punctuation;
            cfg.normalize_characters |= full.normalize_characters;
        }

        cfg.convert_half_space |= self.convert_half_space;
        cfg.restore_half_space |= self.restore_half_space;
        cfg.combine_space |= self.combine_space;
        cfg.remove_outer_space |= self.remove_outer_space;
        cfg.remove_url |= self.remove_url;
        cfg.normalize_punctuation |= self.normalize_punctuation;
        cfg.remove_punctuation |= self.remove_punctuation;
        cfg.normalize_characters |= self.normalize_characters;
        cfg.lowercase |= self.lowercase;
        cfg.end_with_eol |= self.end_with_eol;

        if let Some(lang) = &self.int_to_word {
            cfg = cfg.with_int_to_word(lang);
        }
        if let Some(code) = &self.digit_script {
            let script = DigitScript::from_code(code)
                .with_context(|| format!("unknown digit script {code:?}"))?;
            cfg = cfg.with_digit_script(script);
        }
        Ok(cfg)
    }
}

fn init_logging(level: LogLevel) -> anyhow::Result<()> {
    let log_level = Level::from(level);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    let raw = match path {
        Some(p) => std::fs::read(p).with_context(|| format!("reading {}", p.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    let text = String::from_utf8(raw).map_err(|e| farsi_norm::Error::from(e.utf8_error()))?;
    Ok(text)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    match cli.command {
        Commands::Normalize { input, config } => {
            let cfg = config.resolve()?;
            debug!(?cfg, "normalization config");
            let text = read_input(input.as_deref())?;
            print!("{}", Normalizer::new(cfg).normalize(&text));
        }
        Commands::Numbers { input, words } => {
            let text = read_input(input.as_deref())?;
            let matches = if words {
                detect_all(&text)
            } else {
                detect_numbers(&text)
            };
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
        Commands::Similarity { request, metric } => {
            let raw = read_input(request.as_deref())?;
            let req: SimilarityRequest =
                serde_json::from_str(&raw).context("parsing similarity request")?;
            let output = match metric {
                Metric::Cosine => {
                    serde_json::to_string_pretty(&SimilarityScorer::default().score(&req)?)?
                }
                Metric::Jaccard => {
                    let (queries, candidates) = joined_strings(&req);
                    serde_json::to_string_pretty(&jaccard_similarity(&queries, &candidates)?)?
                }
                Metric::Lcs => {
                    let (queries, candidates) = joined_strings(&req);
                    serde_json::to_string_pretty(&longest_common_subsequence(&queries, &candidates)?)?
                }
            };
            println!("{}", output);
        }
        Commands::Batch {
            input,
            out,
            limit,
            config,
        } => {
            let cfg = config.resolve()?;
            println!("🚀 Starting Batch Normalization...");
            println!("📂 Input Path: {:?}", input.display());

            let start_time = Instant::now();
            let report = batch::normalize_tree(&input, &out, &cfg, limit)?;
            let duration = start_time.elapsed();

            let separator = "=".repeat(40);
            println!("\n{}", separator);
            println!("✅ Normalized {} of {} files.", report.normalized, report.files);
            println!("⏱ Time Elapsed: {:.2?}", duration);
            println!(
                "📦 Size: {:.2} MB in, {:.2} MB out",
                report.bytes_in as f64 / (1024.0 * 1024.0),
                report.bytes_out as f64 / (1024.0 * 1024.0)
            );
            println!("🔢 Numeral runs: {}", report.numbers);
            for failure in &report.failures {
                println!("⚠ {}: {}", failure.path.display(), failure.error);
            }
            println!("💾 Saved to: {:?}", out.display());
            println!("{}", separator);
        }
        Commands::Serve { host, config } => {
            let cfg = config.resolve()?;
            println!("🌐 Server is running at: http://{}", host);
            server::run_server(cfg, host).await?;
        }
    }

    Ok(())
}

/// Queries and candidate rows as whitespace-joined strings.
fn joined_strings(req: &SimilarityRequest) -> (Vec<String>, Vec<Vec<String>>) {
    let queries = req.queries.iter().map(|q| q.join(" ")).collect();
    let candidates = req
        .candidates
        .iter()
        .map(|batch| batch.iter().map(|row| row.join(" ")).collect())
        .collect();
    (queries, candidates)
}
