//! Command-line probe: load a note database and run one query.
//!
//! Usage: `notegraph_cli <db_path> <query>...`
//!
//! Logging is enabled when `NOTEGRAPH_LOG_DIR` names an absolute directory;
//! `NOTEGRAPH_LOG_LEVEL` overrides the build-mode default level.

use log::{error, info};
use notegraph_core::{
    core_version, init_logging, load_graph, search_notes, LogConfig, LoggingError, SearchOptions,
};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(db_path) = args.next() else {
        eprintln!("usage: notegraph_cli <db_path> <query>...");
        return ExitCode::from(2);
    };
    let query = args.collect::<Vec<_>>().join(" ");

    if let Err(err) = start_logging() {
        eprintln!("logging disabled: {err}");
    }

    match run(&db_path, &query) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging() -> Result<(), LoggingError> {
    match LogConfig::from_env()? {
        Some(config) => init_logging(&config),
        None => Ok(()),
    }
}

fn run(db_path: &str, query: &str) -> Result<(), String> {
    info!("event=cli_run module=cli status=start version={}", core_version());
    let conn = notegraph_core::db::open_db(db_path).map_err(|err| err.to_string())?;
    let graph = load_graph(&conn).map_err(|err| err.to_string())?;
    let hits = search_notes(&graph, query, &SearchOptions::default())
        .map_err(|err| err.to_string())?;

    for hit in &hits {
        println!("{}\t{}", hit.note_id, hit.path_titles.join(" / "));
    }
    info!("event=cli_run module=cli status=ok hits={}", hits.len());
    Ok(())
}
