//! Operator CLI for the flashcards store.
//!
//! # Responsibility
//! - Open (and migrate) the configured database outside the application.
//! - Run account-level maintenance as the affected user.
//!
//! Usage: `flashcards <version|migrate|register|stats|delete-account> [user-id]`

use flashcards_core::db::migrations::latest_version;
use flashcards_core::db::open_db;
use flashcards_core::{
    core_version, init_logging, AccountService, Principal, StoreConfig, UserId,
};
use log::error;
use std::process::ExitCode;
use uuid::Uuid;

const USAGE: &str = "usage: flashcards <version|migrate|register|stats|delete-account> [user-id]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).ok_or(USAGE)?;
    if command == "version" {
        println!("flashcards_core version={}", core_version());
        println!("flashcards_core schema_version={}", latest_version());
        return Ok(());
    }

    let config = StoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(logging) = config.logging() {
        init_logging(&logging).map_err(|err| err.to_string())?;
    }

    let conn = open_db(&config.db_path).map_err(|err| {
        error!("event=cli_open module=cli status=error error={err}");
        format!("cannot open `{}`: {err}", config.db_path.display())
    })?;

    if command == "migrate" {
        println!(
            "migrated `{}` to schema_version={}",
            config.db_path.display(),
            latest_version()
        );
        return Ok(());
    }

    let user_id = parse_user_id(args.get(1))?;
    let principal = Principal::user(user_id);
    let accounts = AccountService::try_new(&conn).map_err(|err| err.to_string())?;

    match command {
        "register" => {
            let created = accounts
                .register_user(&principal)
                .map_err(|err| err.to_string())?;
            println!("user={user_id} created={created}");
        }
        "stats" => {
            let counts = accounts
                .owned_counts(&principal)
                .map_err(|err| err.to_string())?;
            println!(
                "user={user_id} sessions={} flashcards={}",
                counts.sessions, counts.flashcards
            );
        }
        "delete-account" => {
            let removed = accounts
                .delete_account(&principal, user_id)
                .map_err(|err| format!("{} error: {err}", err.code()))?;
            println!(
                "deleted user={user_id} sessions={} flashcards={}",
                removed.sessions, removed.flashcards
            );
        }
        _ => return Err(USAGE.to_string()),
    }
    Ok(())
}

fn parse_user_id(value: Option<&String>) -> Result<UserId, String> {
    let value = value.ok_or_else(|| format!("missing user-id\n{USAGE}"))?;
    Uuid::parse_str(value.trim()).map_err(|err| format!("invalid user-id `{value}`: {err}"))
}
