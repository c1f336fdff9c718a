use anyhow::Result;
use camera_roll_sorter_core::{
    app_paths, load_config, organize, resolve_date, ExtensionFilter, FileOutcome, MediaKind,
    NamingPolicy, OrganizeOptions, RunSummary, TracingReporter,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "camera-roll-sorter-cli")]
#[command(about = "写真と動画を撮影日時で 年/月 フォルダへ整理します")]
struct Cli {
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[arg(short, long, global = true, default_value_t = false, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Sort(SortArgs),
    Resolve(ResolveArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Args)]
struct SortArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: PathBuf,
    /// Move originals here after copying.
    #[arg(long)]
    backup: Option<PathBuf>,
    /// `*`, `*.jpg`, or `jpg,mp4`
    #[arg(long)]
    extensions: Option<String>,
    #[arg(long, value_enum)]
    photo_naming: Option<Naming>,
    #[arg(long, value_enum)]
    video_naming: Option<Naming>,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long, default_value_t = false)]
    no_exiftool: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    files: Vec<PathBuf>,
    #[arg(long, default_value_t = false)]
    no_exiftool: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Naming {
    Rename,
    Preserve,
}

impl From<Naming> for NamingPolicy {
    fn from(value: Naming) -> Self {
        match value {
            Naming::Rename => NamingPolicy::Rename,
            Naming::Preserve => NamingPolicy::Preserve,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Sort(args) => cmd_sort(args),
        Commands::Resolve(args) => cmd_resolve(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_sort(args: SortArgs) -> Result<()> {
    let config = load_config()?;

    let mut options = OrganizeOptions::new(args.input, args.output);
    options.backup = args.backup;
    options.filter = args
        .extensions
        .as_deref()
        .map(ExtensionFilter::parse)
        .unwrap_or_else(|| config.extension_filter());
    options.include_hidden = args.include_hidden || config.include_hidden;
    options.photo_naming = args.photo_naming.map(Into::into).unwrap_or(config.photo_naming);
    options.video_naming = args.video_naming.map(Into::into).unwrap_or(config.video_naming);
    options.resolver = config.resolver_options();
    if args.no_exiftool {
        options.resolver.exiftool = None;
    }

    let summary = organize(&options, &TracingReporter)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Table => print_table(&summary),
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let config = load_config()?;
    let mut resolver = config.resolver_options();
    if args.no_exiftool {
        resolver.exiftool = None;
    }

    for file in &args.files {
        let Some(kind) = MediaKind::from_path(file) else {
            println!("{} -> 未対応の拡張子", file.display());
            continue;
        };
        match resolve_date(file, kind, &resolver, &TracingReporter) {
            Some(resolved) => println!(
                "{} -> {} ({})",
                file.display(),
                resolved.date.format("%Y-%m-%d %H:%M:%S %:z"),
                resolved.source
            ),
            None => println!("{} -> 日時不明", file.display()),
        }
    }
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_table(summary: &RunSummary) {
    println!("元ファイル -> 結果");
    for outcome in &summary.outcomes {
        match outcome {
            FileOutcome::Placed {
                source,
                target,
                date_source,
                backup,
                backup_error,
                ..
            } => {
                println!("{} -> {} ({})", source.display(), target.display(), date_source);
                if let Some(backup) = backup {
                    println!("    バックアップ: {}", backup.display());
                }
                if let Some(err) = backup_error {
                    println!("    バックアップ失敗: {err}");
                }
            }
            FileOutcome::Duplicate { source, existing } => {
                println!("{} -> 重複 ({})", source.display(), existing.display());
            }
            FileOutcome::Skipped { source, reason } => {
                println!("{} -> スキップ ({:?})", source.display(), reason);
            }
            FileOutcome::Failed { source, reason } => {
                println!("{} -> 失敗 ({reason})", source.display());
            }
        }
    }

    println!(
        "\n集計: scanned={} filtered={} hidden_skip={} placed={} duplicate={} skipped={} failed={} moved={} backup_failed={}",
        summary.scanned,
        summary.filtered_out,
        summary.skipped_hidden,
        summary.placed,
        summary.duplicates,
        summary.skipped,
        summary.failed,
        summary.moved,
        summary.backup_failed
    );

    if !summary.warnings.is_empty() {
        println!("\n警告:");
        for warning in &summary.warnings {
            println!("  {warning}");
        }
    }
}
