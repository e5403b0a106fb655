/*!
 * seqport CLI - Command Line Interface
 */

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use console::Term;
use seqport::{
    commands::{
        ingest_fastq::{self, IngestFastqArgs},
        pull_raw_data::{self, PullRawDataArgs},
        CommandOutcome,
    },
    config::{LogConfig, LogLevel, RcFile, SodarSettings},
    core::{
        confirm::TerminalConfirmer,
        engine::DEFAULT_NUM_TRANSFERS,
        pattern::{DEFAULT_DEST_PATTERN, DEFAULT_SRC_REGEX},
        IrodsExecutor,
    },
    error::{Result, EXIT_SUCCESS},
    logging,
    sodar::SodarClient,
};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "seqport")]
#[command(version, about = "Bulk transfer of sequencing data between local storage and SODAR/iRODS", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.seqportrc.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevelArg,

    /// Write JSON logs to this file instead of stderr
    #[arg(long = "log", value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Never draw progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload FASTQ files and their MD5 sidecars into a remote collection
    IngestFastq {
        /// Source folders; `i:` or `davs://` sources are staged locally first
        #[arg(required = true, num_args = 1..)]
        sources: Vec<String>,

        /// Destination collection in iRODS
        destination: String,

        /// Number of files to transfer in parallel
        #[arg(long, default_value_t = DEFAULT_NUM_TRANSFERS)]
        num_parallel_transfers: usize,

        /// Assume all answers are yes
        #[arg(long)]
        yes: bool,

        /// Value of {date} in the remote directory pattern (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        remote_dir_date: Option<String>,

        /// Regular expression matched against each source path
        #[arg(long, default_value = DEFAULT_SRC_REGEX)]
        src_regex: String,

        /// Remote path below the destination, filled from the regex groups
        #[arg(long, default_value = DEFAULT_DEST_PATTERN)]
        remote_dir_pattern: String,

        /// Suffix appended to every remote file name
        #[arg(long, default_value = "")]
        add_suffix: String,

        /// Folder for staging remote sources
        #[arg(long, default_value = "temp/")]
        tmp: PathBuf,

        /// Fail on missing .md5 files instead of computing them
        #[arg(long)]
        no_fix_md5: bool,

        /// Only list what would be transferred
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Download the raw data folders of a project's libraries
    PullRawData {
        /// UUID of the SODAR project
        project_uuid: String,

        /// Directory to write the raw data to
        output_dir: String,

        /// SODAR URL (default: rc file, then SODAR_URL, then https://sodar.bihealth.org/)
        #[arg(long)]
        sodar_url: Option<String>,

        /// SODAR API token (default: rc file, then SODAR_API_TOKEN)
        #[arg(long)]
        sodar_api_token: Option<String>,

        /// Smallest batch number to pull
        #[arg(long, default_value_t = 0)]
        min_batch: u32,

        /// Value for irsync -N
        #[arg(long)]
        irsync_threads: Option<u32>,

        /// Number of folders to download in parallel
        #[arg(long, default_value_t = DEFAULT_NUM_TRANSFERS)]
        num_parallel_transfers: usize,

        /// Assume all answers are yes
        #[arg(long)]
        yes: bool,

        /// Only list what would be downloaded
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(outcome) => outcome.map(|o| o.exit_code()).unwrap_or(EXIT_SUCCESS),
        Err(e) => {
            error!(category = %e.category(), "{}", e);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// `None` for subcommands that do not transfer anything
fn run() -> Result<Option<CommandOutcome>> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "seqport", &mut std::io::stdout());
        return Ok(None);
    }

    let log_config = LogConfig {
        log_level: cli.log_level.into(),
        log_file: cli.log.clone(),
        verbose: cli.verbose,
    };
    if let Err(e) = logging::init_logging(&log_config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let show_progress = !cli.no_progress && Term::stderr().is_term();

    match cli.command {
        Commands::IngestFastq {
            sources,
            destination,
            num_parallel_transfers,
            yes,
            remote_dir_date,
            src_regex,
            remote_dir_pattern,
            add_suffix,
            tmp,
            no_fix_md5,
            dry_run,
        } => {
            let date = remote_dir_date
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
            let args = IngestFastqArgs {
                sources,
                destination,
                num_parallel_transfers,
                yes,
                remote_dir_date: date,
                src_regex,
                remote_dir_pattern,
                add_suffix,
                tmp,
                fix_md5: !no_fix_md5,
                dry_run,
                show_progress: show_progress && !dry_run,
            };
            let outcome = ingest_fastq::run(&args, &IrodsExecutor::new(), &TerminalConfirmer)?;
            print_dry_run(&outcome);
            Ok(Some(outcome))
        }
        Commands::PullRawData {
            project_uuid,
            output_dir,
            sodar_url,
            sodar_api_token,
            min_batch,
            irsync_threads,
            num_parallel_transfers,
            yes,
            dry_run,
        } => {
            let rc = RcFile::load(cli.config.as_deref())?;
            let settings = SodarSettings::resolve(sodar_url, sodar_api_token, &rc)?;
            tracing::info!("  settings: {:?}", settings);
            let client = SodarClient::new(&settings)?;
            let args = PullRawDataArgs {
                project_uuid,
                output_dir,
                min_batch,
                num_parallel_transfers,
                yes,
                dry_run,
                show_progress: show_progress && !dry_run,
            };
            let executor = IrodsExecutor::with_threads(irsync_threads);
            let outcome = pull_raw_data::run(&args, &client, &executor, &TerminalConfirmer)?;
            print_dry_run(&outcome);
            Ok(Some(outcome))
        }
        Commands::Completions { .. } => Ok(None),
    }
}

/// Dry-run listings go to stdout, one job per line
fn print_dry_run(outcome: &CommandOutcome) {
    if let CommandOutcome::DryRun { jobs } = outcome {
        for job in jobs {
            println!("{}", job);
        }
    }
}
