// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use cefr_query::app_config::{self, Config, RandomStrategy};
use cefr_query::{
    ContentStore, DictionaryQuery, DictionarySearch, GrammarField, GrammarQuery, GrammarSearch,
};

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

/// CLI Wrapper for RandomStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliRandomStrategy {
    Store,
    Shuffle,
}

impl From<CliRandomStrategy> for RandomStrategy {
    fn from(cli_strategy: CliRandomStrategy) -> Self {
        match cli_strategy {
            CliRandomStrategy::Store => RandomStrategy::Store,
            CliRandomStrategy::Shuffle => RandomStrategy::Shuffle,
        }
    }
}

/// CLI Wrapper for GrammarField to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliGrammarField {
    Guideword,
    CanDoStatement,
    Example,
    SuperCategory,
    SubCategory,
}

impl From<CliGrammarField> for GrammarField {
    fn from(cli_field: CliGrammarField) -> Self {
        match cli_field {
            CliGrammarField::Guideword => GrammarField::Guideword,
            CliGrammarField::CanDoStatement => GrammarField::CanDoStatement,
            CliGrammarField::Example => GrammarField::Example,
            CliGrammarField::SuperCategory => GrammarField::SuperCategory,
            CliGrammarField::SubCategory => GrammarField::SubCategory,
        }
    }
}

#[derive(Args, Debug)]
struct PagingArgs {
    /// Maximum number of records to return
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,

    /// Number of matching records to skip
    #[arg(long, allow_negative_numbers = true)]
    offset: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum GrammarCommand {
    /// List grammar rules with optional filters
    List {
        /// CEFR level (A1..C2)
        #[arg(long)]
        level: Option<String>,

        /// Exact super category
        #[arg(long)]
        super_category: Option<String>,

        /// Exact sub category
        #[arg(long)]
        sub_category: Option<String>,

        /// Random order
        #[arg(short, long)]
        random: bool,

        /// Print a page object with total count instead of a plain list
        #[arg(long)]
        page: bool,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Search grammar rule text
    Search {
        /// Substring to look for (case-insensitive)
        pattern: String,

        /// Restrict the search to these fields
        #[arg(long = "field", value_enum)]
        fields: Vec<CliGrammarField>,

        /// CEFR level (A1..C2)
        #[arg(long)]
        level: Option<String>,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Show one grammar rule
    Show {
        id: i64,
    },

    /// List categories
    Categories {
        /// List the sub categories of this super category
        #[arg(long)]
        super_category: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum WordsCommand {
    /// List dictionary entries with optional filters
    List {
        /// CEFR level (a1..c2)
        #[arg(long)]
        level: Option<String>,

        /// Word class (noun, verb, ...)
        #[arg(long = "class")]
        word_class: Option<String>,

        /// Case-sensitive word prefix
        #[arg(long)]
        starts_with: Option<String>,

        /// Random order
        #[arg(short, long)]
        random: bool,

        /// Print a page object with total count instead of a plain list
        #[arg(long)]
        page: bool,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Search words by substring
    Search {
        /// Substring to look for (case-insensitive)
        pattern: String,

        /// CEFR level (a1..c2)
        #[arg(long)]
        level: Option<String>,

        /// Word class (noun, verb, ...)
        #[arg(long = "class")]
        word_class: Option<String>,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Show one dictionary entry
    Show {
        id: i64,
    },

    /// List the distinct word classes
    Classes,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query grammar rules
    #[command(subcommand)]
    Grammar(GrammarCommand),

    /// Query dictionary entries
    #[command(subcommand)]
    Words(WordsCommand),

    /// Show row counts and file size
    Stats,

    /// Generate shell completions for cefr-query
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// cefr-query - query CEFR grammar rules and vocabulary
#[derive(Parser, Debug)]
#[command(name = "cefr-query")]
#[command(version)]
#[command(about = "Query CEFR-graded grammar rules and dictionary entries")]
#[command(long_about = "cefr-query reads grammar rules and dictionary entries from a SQLite store and prints them as JSON.

EXAMPLES:
    cefr-query grammar list --level B1 --limit 5
    cefr-query grammar list --random --limit 3
    cefr-query grammar search \"present perfect\" --field guideword
    cefr-query words list --level a1 --class noun --starts-with ab
    cefr-query words search band
    cefr-query words show 42
    cefr-query completions bash > cefr-query.bash")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// SQLite database file (overrides the config file)
    #[arg(short, long, env = "CEFR_QUERY_DATABASE")]
    database: Option<PathBuf>,

    /// How random-order queries are randomized
    #[arg(long, value_enum)]
    random_strategy: Option<CliRandomStrategy>,

    /// Set logging level
    #[arg(short, long, value_enum)]
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
        // Filtering is left to log::max_level so it can be changed later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                color,
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

fn load_config(options: &CommandLineOptions) -> Result<Config> {
    let config_path = &options.config_path;

    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', using defaults.", config_path);
        Config::default()
    };

    // Override config with CLI options if provided
    if let Some(database) = &options.database {
        config.database.path = Some(database.clone());
    }
    if let Some(strategy) = &options.random_strategy {
        config.database.random_strategy = strategy.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

async fn run_grammar(store: &ContentStore, command: GrammarCommand) -> Result<()> {
    let repo = store.grammar();

    match command {
        GrammarCommand::List {
            level,
            super_category,
            sub_category,
            random,
            page,
            paging,
        } => {
            let query = GrammarQuery {
                level,
                super_category,
                sub_category,
                random,
                limit: paging.limit,
                offset: paging.offset,
            };
            if page {
                print_json(&repo.list_grammar_page(&query).await?)
            } else {
                print_json(&repo.list_grammar(&query).await?)
            }
        }
        GrammarCommand::Search {
            pattern,
            fields,
            level,
            paging,
        } => {
            let search = GrammarSearch {
                pattern,
                fields: fields.into_iter().map(Into::into).collect(),
                level,
                limit: paging.limit,
                offset: paging.offset,
            };
            print_json(&repo.search_grammar(&search).await?)
        }
        GrammarCommand::Show { id } => {
            let rule = repo.get_grammar_by_id(id).await?;
            if rule.is_none() {
                warn!("No grammar rule with id {}", id);
            }
            print_json(&rule)
        }
        GrammarCommand::Categories { super_category } => match super_category {
            Some(super_category) => {
                print_json(&repo.list_sub_categories(Some(&super_category)).await?)
            }
            None => print_json(&repo.list_super_categories().await?),
        },
    }
}

async fn run_words(store: &ContentStore, command: WordsCommand) -> Result<()> {
    let repo = store.dictionary();

    match command {
        WordsCommand::List {
            level,
            word_class,
            starts_with,
            random,
            page,
            paging,
        } => {
            let query = DictionaryQuery {
                level,
                word_class,
                starts_with,
                random,
                limit: paging.limit,
                offset: paging.offset,
            };
            if page {
                print_json(&repo.list_dictionary_page(&query).await?)
            } else {
                print_json(&repo.list_dictionary(&query).await?)
            }
        }
        WordsCommand::Search {
            pattern,
            level,
            word_class,
            paging,
        } => {
            let search = DictionarySearch {
                pattern,
                level,
                word_class,
                limit: paging.limit,
                offset: paging.offset,
            };
            print_json(&repo.search_dictionary(&search).await?)
        }
        WordsCommand::Show { id } => {
            let entry = repo.get_word_by_id(id).await?;
            if entry.is_none() {
                warn!("No dictionary entry with id {}", id);
            }
            print_json(&entry)
        }
        WordsCommand::Classes => print_json(&repo.list_word_classes().await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "cefr-query", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level((&config.log_level).into());

    let store = ContentStore::open(&config.database).context("Failed to open content store")?;

    let result = match cli.command {
        Commands::Grammar(command) => run_grammar(&store, command).await,
        Commands::Words(command) => run_words(&store, command).await,
        Commands::Stats => {
            let stats = store.stats().await?;
            info!("{}", stats);
            print_json(&stats)
        }
        Commands::Completions { .. } => Ok(()),
    };

    store.close();
    result
}
