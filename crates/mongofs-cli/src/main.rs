use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mongofs_config::MongoFsConfig;

mod commands;

#[derive(Parser)]
#[command(name = "mongofs", version, about = "mongofs - MongoDB as a filesystem")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// MongoDB host (overrides the configuration file)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Database to expose at the root (overrides the configuration file)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Present documents as directories of field files
    #[arg(long, global = true)]
    field_access: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the database as a FUSE filesystem
    Mount {
        /// Directory to mount the filesystem at
        mountpoint: PathBuf,
        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,
    },
    /// List directory contents without mounting
    Ls {
        /// Path to list (defaults to /)
        path: Option<String>,
    },
    /// Show metadata for a path without mounting
    Stat {
        /// Path to inspect
        path: String,
    },
    /// Show effective configuration
    Config,
    /// Validate a configuration file
    Validate,
}

fn find_config() -> Option<PathBuf> {
    // 1. MONGOFS_CONFIG environment variable
    if let Ok(path) = std::env::var("MONGOFS_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. mongofs.yaml in current directory
    let cwd_config = PathBuf::from("mongofs.yaml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. ~/.config/mongofs/config.yaml
    if let Some(home) = dirs_next::home_dir() {
        let home_config = home.join(".config/mongofs/config.yaml");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

fn apply_overrides(config: &mut MongoFsConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(db) = &cli.db {
        config.database = db.clone();
    }
    if cli.field_access {
        config.field_access = true;
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.clone().or_else(find_config);

    if let Commands::Validate = &cli.command {
        let path = config_path.ok_or(
            "No configuration file found. Use --config, set MONGOFS_CONFIG, or create mongofs.yaml",
        )?;
        return commands::validate::run(&path);
    }

    // An absent config file is not an error: defaults expose the
    // `test` database on localhost.
    let mut config = match &config_path {
        Some(path) => MongoFsConfig::from_file(path)?,
        None => MongoFsConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    match cli.command {
        Commands::Mount {
            mountpoint,
            foreground,
        } => {
            let args = commands::mount::MountArgs {
                mountpoint,
                foreground,
            };
            commands::mount::run(config, args)
        }
        Commands::Ls { path } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let presenter = commands::connect(&config).await?;
                commands::ls::run(&presenter, path).await
            })
        }
        Commands::Stat { path } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let presenter = commands::connect(&config).await?;
                commands::stat::run(&presenter, &path).await
            })
        }
        Commands::Config => commands::config::run(&config),
        // Handled above before config loading; returning an error
        // instead of panicking if a code change ever reaches it.
        Commands::Validate => Err("Internal error: command should have been handled earlier".into()),
    }
}

fn print_error(e: &dyn std::error::Error) {
    eprintln!("Error: {}", e);
    let mut source = e.source();
    while let Some(s) = source {
        eprintln!("  caused by: {}", s);
        source = s.source();
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = err.exit_code();
            let code = if code < 0 {
                1u8
            } else if code > 255 {
                255u8
            } else {
                code as u8
            };
            return ExitCode::from(code);
        }
    };

    if let Err(e) = run(cli) {
        print_error(e.as_ref());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
