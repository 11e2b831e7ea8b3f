//! CLI smoke entry point.
//!
//! Opens the configured store, brings its document to the current schema and
//! prints a one-line status per fact. Exits non-zero on any core error.

use homecare_core::{init_logging, open_store, CoreConfig, Repository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("homecare_core ping={}", homecare_core::ping());
    println!("homecare_core version={}", homecare_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let repo = Repository::new(open_store(&config)?);
    let report = repo.migrate_in_place()?;
    println!(
        "store slot={} from_version={} schema_version={} seeded={}",
        config.store_slot, report.from_version, report.to_version, report.seeded
    );
    println!("patients={}", repo.list_patients()?.len());
    println!("roles={}", repo.list_roles()?.len());

    repo.shutdown()?;
    Ok(())
}
