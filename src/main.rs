//! refbook CLI
//!
//! Command-line interface for loading reference book JSON files, resolving
//! names and searching them.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use refbook_store::logging::{self, TracingConfig};
use refbook_store::{FlexBook, FlexBookOptions, LangCode};

/// refbook - in-memory reference book tool
#[derive(Parser)]
#[command(name = "refbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Default language of the book (two-letter tag)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show languages, item count and hashes
    Stats(FileArgs),

    /// Resolve the name of one id
    Name(NameArgs),

    /// Find ids whose name contains a substring (case-insensitive)
    Search(SearchArgs),

    /// Print the cached JSON snapshot of one language
    Dump(DumpArgs),
}

#[derive(Args)]
struct FileArgs {
    /// Path to a JSON array of {"id", "name"} objects
    file: PathBuf,
}

#[derive(Args)]
struct NameArgs {
    /// Path to a JSON array of {"id", "name"} objects
    file: PathBuf,

    /// Item id
    #[arg(long)]
    id: i64,

    /// Language to resolve in (defaults to the book language)
    #[arg(long = "in")]
    in_lang: Option<String>,
}

#[derive(Args)]
struct SearchArgs {
    /// Path to a JSON array of {"id", "name"} objects
    file: PathBuf,

    /// Substring to look for
    query: String,

    /// Language to search in (defaults to the book language)
    #[arg(long = "in")]
    in_lang: Option<String>,

    /// Maximum results to show
    #[arg(long, default_value = "50")]
    max_results: usize,
}

#[derive(Args)]
struct DumpArgs {
    /// Path to a JSON array of {"id", "name"} objects
    file: PathBuf,

    /// Language to dump (defaults to the book language)
    #[arg(long = "in")]
    in_lang: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_config(TracingConfig::for_verbosity(cli.verbose));

    let lang = cli.lang.as_deref();
    match cli.command {
        Commands::Stats(args) => cmd_stats(&load(&args.file, lang)?, cli.format),
        Commands::Name(args) => cmd_name(&load(&args.file, lang)?, &args, cli.format),
        Commands::Search(args) => cmd_search(&load(&args.file, lang)?, &args, cli.format),
        Commands::Dump(args) => cmd_dump(&load(&args.file, lang)?, &args),
    }
}

fn load(path: &Path, lang: Option<&str>) -> Result<FlexBook> {
    info!("Loading book: {:?}", path);

    let src = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let options = match lang {
        Some(tag) => FlexBookOptions::new().with_default_lang(tag),
        None => FlexBookOptions::new(),
    };
    let book = FlexBook::with_options(options);
    book.parse(&src)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!(languages = book.languages().len(), items = book.len(), "book loaded");
    Ok(book)
}

/// Resolve `--in`, falling back to the book's default language
fn target_tag(book: &FlexBook, in_lang: Option<&str>) -> String {
    in_lang
        .map(str::to_string)
        .or_else(|| book.default_lang().tag())
        .unwrap_or_default()
}

fn cmd_stats(book: &FlexBook, format: OutputFormat) -> Result<()> {
    let languages = book.languages();

    match format {
        OutputFormat::Json => {
            let per_lang: Vec<_> = languages
                .iter()
                .map(|lang| {
                    let tag = lang.tag().unwrap_or_default();
                    serde_json::json!({
                        "lang": lang.to_string(),
                        "items": book.book(&tag).len(),
                        "hash": book.hash(&tag).to_string(),
                    })
                })
                .collect();
            let out = serde_json::json!({
                "default_lang": book.default_lang().to_string(),
                "items": book.len(),
                "languages": per_lang,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("Default language: {}", book.default_lang());
            println!("Items:            {}", book.len());
            println!();
            println!("{:<6} {:<8} {}", "Lang", "Items", "Hash");
            println!("{:-<6} {:-<8} {:-<20}", "", "", "");
            for lang in &languages {
                let tag = lang.tag().unwrap_or_default();
                println!("{:<6} {:<8} {}", lang.to_string(), book.book(&tag).len(), book.hash(&tag));
            }
        }
    }

    Ok(())
}

fn cmd_name(book: &FlexBook, args: &NameArgs, format: OutputFormat) -> Result<()> {
    let tag = target_tag(book, args.in_lang.as_deref());
    let name = book.name(LangCode::from_tag(&tag), args.id);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"id": args.id, "lang": tag, "name": name}));
        }
        OutputFormat::Text => println!("{name}"),
    }
    Ok(())
}

fn cmd_search(book: &FlexBook, args: &SearchArgs, format: OutputFormat) -> Result<()> {
    let tag = target_tag(book, args.in_lang.as_deref());
    let lang = LangCode::from_tag(&tag);

    let mut ids = Vec::new();
    book.contains(&tag, &args.query, &mut ids);
    info!("Found {} matches for {:?}", ids.len(), args.query);
    ids.truncate(args.max_results);

    match format {
        OutputFormat::Json => {
            let hits: Vec<_> = ids
                .iter()
                .map(|&id| serde_json::json!({"id": id, "name": book.name(lang, id)}))
                .collect();
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        OutputFormat::Text => {
            for id in ids {
                println!("{:<10} {}", id, book.name(lang, id));
            }
        }
    }
    Ok(())
}

fn cmd_dump(book: &FlexBook, args: &DumpArgs) -> Result<()> {
    let tag = target_tag(book, args.in_lang.as_deref());
    let json = book.json(&tag);

    let mut stdout = io::stdout().lock();
    stdout.write_all(&json)?;
    writeln!(stdout)?;
    Ok(())
}
