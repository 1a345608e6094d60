mod cli;

use persona::app::App;
use persona::config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "persona=trace,persona_db=debug".to_string()
        } else {
            "persona=info,persona_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Install => install(cli.config.as_deref()),
        Commands::Status { name, json } => status(cli.config.as_deref(), name.as_deref(), json),
        Commands::Backup => backup(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("persona {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn install(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let app = App::open(&config)?;

    let report = app.install()?;
    for (name, outcome) in &report {
        println!("{name}: {outcome}");
    }

    let declined = report.iter().filter(|(_, o)| !o.is_present()).count();
    if declined > 0 {
        anyhow::bail!("{declined} feature(s) did not install; they will be retried on the next run");
    }

    Ok(())
}

fn status(config_path: Option<&Path>, name: Option<&str>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let app = App::open(&config)?;
    let records = match name {
        Some(name) => vec![app.installer.record(name)?],
        None => app.installer.records()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No features recorded.");
        return Ok(());
    }

    for record in &records {
        let state = if record.success { "installed" } else { "failed" };
        print!(
            "{:<9} {}  ({})",
            state,
            record.name,
            record.installation_ts.format("%Y-%m-%d %H:%M:%S")
        );
        if let Some(ref who) = record.metadata.who {
            print!("  by {who}");
        }
        if let Some(ref owner) = record.locked_by {
            print!("  [locked by {owner}]");
        }
        println!();
    }

    Ok(())
}

fn backup(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let app = App::open(&config)?;

    match app.backup_now()? {
        Some(path) => println!("Backup written to {}", path.display()),
        None => println!("Backups are disabled in the configuration."),
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;

    println!("Configuration is valid.");
    println!("  Database:       {}", config.database.path.display());
    println!("  Registry:       {}", config.features.registry_path.display());
    println!("  Setup data:     {}", config.features.setup_data_dir.display());
    if config.backup.enabled {
        println!(
            "  Backups:        {} (keep {})",
            config.backup.dir.display(),
            config.backup.keep
        );
    } else {
        println!("  Backups:        disabled");
    }

    Ok(())
}
