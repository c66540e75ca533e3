use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use docsift_core::config_file::{self, ConfigFile};
use docsift_core::{
    DetectedType, ExtractionOptions, OcrProgress, ProgressCallback, content_type_for_name, detect,
};
use docsift_ingest::{Extractor, FileBlob, load_file, summarize};

mod output;

use output::ColorMode;

/// Extract text from PDF, DOCX and image files (OCR)
#[derive(Parser, Debug)]
#[command(name = "docsift", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from one or more files
    Extract(ExtractArgs),

    /// Check format support and size limits without extracting
    Validate {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show page count, text layer and metadata (PDF) or statistics (DOCX)
    Info {
        /// PDF or DOCX file
        file: PathBuf,
    },

    /// List the OCR language codes
    Languages,

    /// Print the effective configuration as TOML
    Config {
        /// Write it to the platform config file instead
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ExtractArgs {
    /// Files to extract, processed in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Retry failed PDF/DOCX extraction through OCR
    #[arg(long)]
    fallback_ocr: bool,

    /// Grayscale and contrast-stretch images before OCR
    #[arg(long)]
    preprocess: bool,

    /// Comma-separated 1-based PDF pages, in output order
    #[arg(long, value_delimiter = ',')]
    pages: Vec<u32>,

    /// Include PDF document metadata
    #[arg(long)]
    metadata: bool,

    /// Also render DOCX to HTML
    #[arg(long)]
    html: bool,

    /// Drop empty DOCX paragraphs from the text
    #[arg(long)]
    ignore_empty: bool,

    /// DOCX style mapping rule, e.g. "p[style-name='Clause'] => p.clause" (repeatable)
    #[arg(long = "style-map")]
    style_map: Vec<String>,

    /// OCR language code(s), e.g. eng or eng+deu
    #[arg(long)]
    lang: Option<String>,

    /// Only recognize these characters
    #[arg(long)]
    whitelist: Option<String>,

    /// Never recognize these characters
    #[arg(long)]
    blacklist: Option<String>,

    /// Print results and summary as JSON
    #[arg(long)]
    json: bool,

    /// Print the extracted text of each file
    #[arg(long)]
    show_text: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config_file::load_config();
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Extract(args) => extract(args, &config, color).await,
        Command::Validate { files } => {
            if !validate(&files, &config, color).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Info { file } => info(&file, color).await,
        Command::Languages => {
            let mut out = std::io::stdout();
            for code in docsift_ocr::supported_languages() {
                writeln!(out, "{}", code)?;
            }
            Ok(())
        }
        Command::Config { save } => show_config(&config, save),
    }
}

fn show_config(config: &ConfigFile, save: bool) -> anyhow::Result<()> {
    if save {
        let path = config_file::save_config(config).map_err(|e| anyhow::anyhow!(e))?;
        println!("Saved configuration to {}", path.display());
    } else {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Resolve options: CLI flags > environment > config file > defaults.
fn resolve_options(
    args: &ExtractArgs,
    config: &ConfigFile,
    env_lang: Option<String>,
) -> ExtractionOptions {
    let mut options = config.extraction_options();

    if args.fallback_ocr {
        options.fallback_to_ocr = true;
    }
    if args.preprocess {
        options.preprocess_image = true;
    }
    if !args.pages.is_empty() {
        options.pdf.page_numbers = Some(args.pages.clone());
    }
    if args.metadata {
        options.pdf.include_metadata = true;
    }
    if args.html {
        options.docx.include_style_info = true;
    }
    if args.ignore_empty {
        options.docx.ignore_empty_paragraphs = true;
    }
    if !args.style_map.is_empty() {
        options.docx.style_map = args.style_map.clone();
    }
    if let Some(lang) = args.lang.clone().or(env_lang) {
        options.ocr.language = lang;
    }
    if args.whitelist.is_some() {
        options.ocr.white_list = args.whitelist.clone();
    }
    if args.blacklist.is_some() {
        options.ocr.black_list = args.blacklist.clone();
    }
    options
}

fn build_extractor(config: &ConfigFile) -> Extractor {
    let builder = Extractor::builder().limits(config.size_limits());

    #[cfg(feature = "tesseract")]
    let builder = {
        let mut factory = docsift_ocr::TesseractEngineFactory::new();
        let tessdata = std::env::var_os("TESSDATA_PREFIX")
            .map(PathBuf::from)
            .or_else(|| config.tessdata_path());
        if let Some(path) = tessdata {
            factory = factory.with_tessdata(path);
        }
        builder.ocr_engine(Arc::new(factory))
    };

    builder.build()
}

/// A bar driven by OCR progress events. Hidden when stderr is not a terminal.
fn ocr_progress_bar() -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} OCR {msg} [{bar:30.cyan/dim}] {percent}%")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

fn progress_logger(bar: &ProgressBar) -> ProgressCallback {
    let bar = bar.clone();
    Arc::new(move |event: OcrProgress| {
        bar.set_message(event.stage.to_string());
        bar.set_position((event.progress * 100.0).round() as u64);
    })
}

async fn extract(args: ExtractArgs, config: &ConfigFile, color: ColorMode) -> anyhow::Result<()> {
    let env_lang = std::env::var("DOCSIFT_OCR_LANG").ok();
    let mut options = resolve_options(&args, config, env_lang);
    let extractor = build_extractor(config);

    let quiet = args.json || args.output.is_some();
    let color = ColorMode(color.enabled() && !quiet);
    let mut writer: Box<dyn Write> = if let Some(ref output_path) = args.output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ocr_progress_bar()?
    };
    options.ocr.logger = Some(progress_logger(&bar));

    let results = extractor
        .extract_text_from_paths(&args.files, &options)
        .await;
    bar.finish_and_clear();

    let summary = summarize(&results);
    if args.json {
        output::write_json(&mut writer, &results, &summary)?;
    } else {
        for result in &results {
            output::print_result(&mut writer, result, args.show_text, color)?;
        }
        output::print_summary(&mut writer, &summary, color)?;
    }
    writer.flush()?;
    Ok(())
}

/// Returns whether every file passed.
async fn validate(files: &[PathBuf], config: &ConfigFile, color: ColorMode) -> anyhow::Result<bool> {
    let extractor = Extractor::builder().limits(config.size_limits()).build();
    let mut out = std::io::stdout();
    let mut all_valid = true;

    for path in files {
        let file = match sized_blob(path).await {
            Ok(file) => file,
            Err(e) => {
                all_valid = false;
                output::print_unreadable(&mut out, path, &e.to_string(), color)?;
                continue;
            }
        };
        let validation = extractor.validate_file(&file);
        all_valid &= validation.is_valid;
        output::print_validation(&mut out, &file.name, &validation, color)?;
    }
    Ok(all_valid)
}

/// A blob carrying only the name, type and on-disk size of a file.
async fn sized_blob(path: &Path) -> anyhow::Result<FileBlob> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let content_type = content_type_for_name(&name);
    let mut blob = FileBlob::new(name, content_type, Vec::<u8>::new());
    blob.size = metadata.len();
    Ok(blob)
}

async fn info(path: &Path, color: ColorMode) -> anyhow::Result<()> {
    let file = load_file(path).await?;
    let mut out = std::io::stdout();

    match detect(&file) {
        DetectedType::Pdf => {
            let info = docsift_pdf::pdf_info(Arc::clone(&file.data)).await?;
            output::print_pdf_info(&mut out, &file.name, &info, color)?;
        }
        DetectedType::Docx => {
            let info = docsift_docx::docx_info(Arc::clone(&file.data)).await?;
            output::print_docx_info(&mut out, &file.name, &info, color)?;
        }
        other => anyhow::bail!("No document info for {} files: {}", other, file.name),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::config_file::{ExtractionConfig, OcrConfig};

    fn parse_extract(args: &[&str]) -> ExtractArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Extract(args) => args,
            other => panic!("expected extract, got {:?}", other),
        }
    }

    #[test]
    fn extract_flags_parse() {
        let args = parse_extract(&[
            "docsift",
            "extract",
            "a.pdf",
            "b.docx",
            "--pages",
            "3,1",
            "--style-map",
            "p[style-name='Clause'] => p.clause",
            "--style-map",
            "r[style-name='Strong'] => strong",
            "--fallback-ocr",
        ]);
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.pages, vec![3, 1]);
        assert_eq!(args.style_map.len(), 2);
        assert!(args.fallback_ocr);
    }

    #[test]
    fn extract_requires_files() {
        assert!(Cli::try_parse_from(["docsift", "extract"]).is_err());
    }

    #[test]
    fn config_save_flag_parses() {
        let cli = Cli::try_parse_from(["docsift", "config", "--save"]).unwrap();
        assert!(matches!(cli.command, Command::Config { save: true }));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["docsift", "languages", "-vv", "--no-color"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
    }

    #[test]
    fn cli_overrides_env_overrides_config() {
        let config = ConfigFile {
            extraction: Some(ExtractionConfig {
                fallback_to_ocr: Some(true),
                preprocess_image: None,
            }),
            ocr: Some(OcrConfig {
                language: Some("fra".into()),
                white_list: Some("abc".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let args = ExtractArgs::default();
        let options = resolve_options(&args, &config, None);
        assert!(options.fallback_to_ocr);
        assert_eq!(options.ocr.language, "fra");
        assert_eq!(options.ocr.white_list.as_deref(), Some("abc"));
        assert_eq!(options.pdf.page_numbers, None);

        let options = resolve_options(&args, &config, Some("deu".into()));
        assert_eq!(options.ocr.language, "deu");

        let args = ExtractArgs {
            lang: Some("spa".into()),
            whitelist: Some("0123456789".into()),
            pages: vec![2],
            html: true,
            ..Default::default()
        };
        let options = resolve_options(&args, &config, Some("deu".into()));
        assert_eq!(options.ocr.language, "spa");
        assert_eq!(options.ocr.white_list.as_deref(), Some("0123456789"));
        assert_eq!(options.pdf.page_numbers, Some(vec![2]));
        assert!(options.docx.include_style_info);
    }
}
