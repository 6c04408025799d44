use anyhow::{anyhow, Context, Result};
use chirpy_db::{
    config::{StoreConfig, DEFAULT_DB_FILE},
    engine::Store,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

/// Command-line front end for the chirp store.
///
/// Opens the database file, runs one operation and prints the result as
/// JSON. Logging goes to stderr and is controlled by `RUST_LOG`.
///
/// # Example Usage
/// ```bash
/// cargo run -- --db ./database.json register ada@example.com hunter2
/// cargo run -- --db ./database.json chirp "hello world"
/// cargo run -- chirps
/// ```
fn main() -> Result<()> {
    let matches = cli().get_matches();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let store = Store::open_with(config_from(&matches)?)
        .context("failed to open database")?;

    match matches.subcommand() {
        Some(("chirp", sub)) => print_json(&store.chirps().create(arg(sub, "body")?)?),
        Some(("chirps", _)) => {
            let mut chirps = store.chirps().list()?;
            chirps.sort_by_key(|c| c.id);
            print_json(&chirps)
        }
        Some(("get-chirp", sub)) => print_json(&store.chirps().get(id_arg(sub)?)?),
        Some(("register", sub)) => {
            print_json(&store.users().create(arg(sub, "email")?, arg(sub, "password")?)?)
        }
        Some(("login", sub)) => {
            match store.users().authenticate(arg(sub, "email")?, arg(sub, "password")?) {
                Ok(user) => print_json(&user),
                Err(e) if e.is_authentication_failure() => Err(anyhow!("invalid email or password")),
                Err(e) => Err(e.into()),
            }
        }
        Some(("update-user", sub)) => print_json(&store.users().update(
            id_arg(sub)?,
            arg(sub, "email")?,
            arg(sub, "password")?,
        )?),
        Some(("users", _)) => {
            let mut users = store.users().list()?;
            users.sort_by_key(|u| u.id);
            print_json(&users)
        }
        _ => Err(anyhow!("no command given; see --help")),
    }
}

fn cli() -> Command {
    Command::new("chirpy_db")
        .about("File-backed store for chirps and user accounts")
        .subcommand_required(true)
        .arg(Arg::new("db")
            .long("db")
            .value_name("FILE")
            .env("CHIRPY_DB")
            .default_value(DEFAULT_DB_FILE)
            .help("Database file (created if missing)"))
        .arg(Arg::new("lock-timeout-ms")
            .long("lock-timeout-ms")
            .value_name("MS")
            .value_parser(clap::value_parser!(u64))
            .help("Give up waiting for the database lock after MS milliseconds"))
        .arg(Arg::new("censor")
            .long("censor")
            .value_name("WORD")
            .action(ArgAction::Append)
            .help("Word to replace with **** in new chirps (repeatable)"))
        .subcommand(Command::new("chirp")
            .about("Post a chirp")
            .arg(Arg::new("body").required(true)))
        .subcommand(Command::new("chirps").about("List all chirps"))
        .subcommand(Command::new("get-chirp")
            .about("Show one chirp")
            .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(u64))))
        .subcommand(Command::new("register")
            .about("Create a user")
            .arg(Arg::new("email").required(true))
            .arg(Arg::new("password").required(true)))
        .subcommand(Command::new("login")
            .about("Check an email and password")
            .arg(Arg::new("email").required(true))
            .arg(Arg::new("password").required(true)))
        .subcommand(Command::new("update-user")
            .about("Change a user's email and password")
            .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(u64)))
            .arg(Arg::new("email").required(true))
            .arg(Arg::new("password").required(true)))
        .subcommand(Command::new("users").about("List all users"))
}

fn config_from(matches: &ArgMatches) -> Result<StoreConfig> {
    let mut config = StoreConfig::new(arg(matches, "db")?);
    if let Some(ms) = matches.get_one::<u64>("lock-timeout-ms") {
        config = config.with_lock_timeout(Duration::from_millis(*ms));
    }
    if let Some(words) = matches.get_many::<String>("censor") {
        config = config.with_censored_words(words.cloned());
    }
    Ok(config)
}

fn arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{name}>"))
}

fn id_arg(matches: &ArgMatches) -> Result<u64> {
    matches
        .get_one::<u64>("id")
        .copied()
        .ok_or_else(|| anyhow!("missing argument <id>"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_config_from_args() {
        let matches = cli().get_matches_from([
            "chirpy_db",
            "--db",
            "/tmp/x.json",
            "--lock-timeout-ms",
            "50",
            "--censor",
            "fornax",
            "--censor",
            "sharbert",
            "chirps",
        ]);
        let config = config_from(&matches).unwrap();
        assert_eq!(config.path, std::path::PathBuf::from("/tmp/x.json"));
        assert_eq!(config.lock_timeout, Some(Duration::from_millis(50)));
        assert_eq!(config.censored_words, vec!["fornax", "sharbert"]);
    }
}
