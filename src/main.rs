// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error};
use std::io::Write;
use std::path::PathBuf;

use termbase::app_config::{self, Config};
use termbase::app_controller::{Controller, ExportRequest, ImportRequest};
use termbase::database::models::TermFilter;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for TermFilter to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTermFilter {
    /// Every term
    All,
    /// Preferred terms only
    Preferred,
    /// Preferred and admitted terms
    #[value(name = "preferred+admitted")]
    PreferredAdmitted,
    /// Preferred, admitted and not recommended terms
    #[value(name = "preferred+admitted+not_recommended")]
    PreferredAdmittedNotRecommended,
}

impl From<CliTermFilter> for TermFilter {
    fn from(cli_filter: CliTermFilter) -> Self {
        match cli_filter {
            CliTermFilter::All => TermFilter::All,
            CliTermFilter::Preferred => TermFilter::Preferred,
            CliTermFilter::PreferredAdmitted => TermFilter::PreferredAdmitted,
            CliTermFilter::PreferredAdmittedNotRecommended => {
                TermFilter::PreferredAdmittedNotRecommended
            }
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a TBX file into a new glossary
    Import(ImportArgs),

    /// Export glossaries to a TBX file
    Export(ExportArgs),

    /// Manage registered languages
    #[command(subcommand)]
    Languages(LanguageCommands),

    /// Manage glossaries
    #[command(subcommand)]
    Glossaries(GlossaryCommands),

    /// Show database statistics
    Stats,

    /// Generate shell completions for termbase
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// TBX file to import
    #[arg(value_name = "FILE")]
    input_file: PathBuf,

    /// Name of the glossary to create (defaults to the document title)
    #[arg(short, long)]
    name: Option<String>,

    /// Glossary description (defaults to the document description)
    #[arg(short, long)]
    description: Option<String>,

    /// Source language code of the glossary (e.g., 'en', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Glossary to export, repeat to export several together
    #[arg(short, long = "glossary", value_name = "NAME", required = true)]
    glossaries: Vec<String>,

    /// Languages of interest, comma separated
    #[arg(short, long, value_delimiter = ',')]
    languages: Vec<String>,

    /// Export only the languages given with --languages
    #[arg(long, requires = "languages")]
    strict_languages: bool,

    /// Include definitions that are not finalized
    #[arg(short, long)]
    all_definitions: bool,

    /// Which terms to export, by administrative status
    #[arg(short, long, value_enum)]
    terms: Option<CliTermFilter>,

    /// Output file or directory (defaults to the suggested filename)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum LanguageCommands {
    /// Register a language
    Add {
        /// Language code (e.g., 'en', 'pt-BR')
        code: String,

        /// Display name (defaults to the ISO 639 name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List registered languages
    List,
}

#[derive(Subcommand, Debug)]
enum GlossaryCommands {
    /// List glossaries
    List,

    /// Delete a glossary and everything in it
    Delete {
        /// Glossary name
        name: String,
    },
}

/// Termbase - terminology store with TBX import and export
///
/// Stores glossaries of multilingual terminology in SQLite and exchanges
/// them as TBX (TermBase eXchange) documents.
#[derive(Parser, Debug)]
#[command(name = "termbase")]
#[command(version)]
#[command(about = "Terminology store with TBX import and export")]
#[command(long_about = "Termbase stores multilingual terminology and exchanges it as TBX documents.

EXAMPLES:
    termbase languages add en                          # Register English
    termbase import medical.tbx --name Medical         # Import a TBX file
    termbase export -g Medical                         # Export to Medical.tbx
    termbase export -g Medical -g Legal -o out/        # Export two glossaries together
    termbase export -g Medical -l en,fr --strict-languages --terms preferred
    termbase completions bash > termbase.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Database file (overrides the configuration)
    #[arg(long, global = true, env = "TERMBASE_DATABASE")]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "termbase", &mut std::io::stdout());
        return Ok(());
    }

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.into());
    }

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(database) = cli.database {
        config.database.path = Some(database);
    }
    match cli.log_level {
        Some(log_level) => config.log_level = log_level.into(),
        None => log::set_max_level(config.log_level.into()),
    }
    debug!("Using configuration {:?}", cli.config);

    let controller = Controller::with_config(config).context("Failed to open the termbase")?;

    match cli.command {
        Commands::Import(args) => {
            let request = ImportRequest {
                name: args.name,
                description: args.description,
                source_language: args.source_language,
            };
            let summary = controller.import_file(&args.input_file, request).await?;
            println!("Imported into glossary {}: {}", summary.glossary_id, summary);
        }
        Commands::Export(args) => {
            let request = ExportRequest {
                glossaries: args.glossaries,
                languages: args.languages,
                strict_languages: args.strict_languages,
                all_definitions: args.all_definitions.then_some(true),
                term_filter: args.terms.map(TermFilter::from),
                output: args.output,
            };
            let outcome = controller.export_to_file(request).await?;
            println!(
                "Wrote {} concepts and {} terms to {}",
                outcome.stats.concepts,
                outcome.stats.translations,
                outcome.path.display()
            );
        }
        Commands::Languages(LanguageCommands::Add { code, name }) => {
            let language = controller.register_language(&code, name.as_deref()).await?;
            println!("Registered {}", language);
        }
        Commands::Languages(LanguageCommands::List) => {
            for language in controller.list_languages().await? {
                println!("{:<8} {}", language.iso_code, language.name);
            }
        }
        Commands::Glossaries(GlossaryCommands::List) => {
            for glossary in controller.list_glossaries().await? {
                println!(
                    "{:<6} {:<30} {:<8} {}",
                    glossary.id, glossary.name, glossary.source_language, glossary.description
                );
            }
        }
        Commands::Glossaries(GlossaryCommands::Delete { name }) => {
            controller.delete_glossary(&name).await?;
            println!("Deleted glossary {}", name);
        }
        Commands::Stats => {
            println!("{}", controller.stats().await?);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
