//! Command line tool for inspecting and rewriting tracebook archives.

use std::env;
use std::process::ExitCode;

use tracebook::config::Settings;
use tracebook::error::{Result, TracebookError};
use tracebook::store::{MetaKey, Store, TYPE_TAG};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let settings = Settings::load()?;
    match args {
        [command, rest @ ..] => match (command.as_str(), rest) {
            ("info", [name]) => info(&settings, name),
            ("check", [name]) => check(&settings, name),
            ("copy", [source, target]) => copy(&settings, source, target),
            ("note", [name]) => show_note(&settings, name),
            ("note", [name, text @ ..]) => set_note(&settings, name, &text.join(" ")),
            _ => usage(),
        },
        [] => usage(),
    }
}

fn usage() -> Result<()> {
    eprintln!("usage: tracebook <command> [arguments]");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  info  <archive>            summarize an archive");
    eprintln!("  check <archive>            parse an archive and report problems");
    eprintln!("  copy  <source> <target>    rewrite an archive in canonical form");
    eprintln!("  note  <archive> [text...]  show or set the session note");
    Err(TracebookError::Config("missing or unknown command".to_owned()))
}

fn load(settings: &Settings, name: &str) -> Result<Store> {
    let mut store = Store::new();
    store.read(settings.resolve(name), false)?;
    Ok(store)
}

fn info(settings: &Settings, name: &str) -> Result<()> {
    let store = load(settings, name)?;
    println!("root  {}", store.root_key());
    if let Some(note) = store.note() {
        println!("note  {note}");
    }
    for (key, record) in store.data().iter() {
        let label = store
            .meta()
            .get(MetaKey::Named(key), TYPE_TAG)?
            .unwrap_or("-");
        let subkeys: Vec<&str> = record.subkeys().collect();
        println!(
            "{key}  {label}  {} rows  [{}]",
            record.rows(),
            subkeys.join(", ")
        );
    }
    Ok(())
}

fn check(settings: &Settings, name: &str) -> Result<()> {
    let store = load(settings, name)?;
    println!(
        "{}: parsed cleanly, {} keys",
        settings.resolve(name).display(),
        store.len()
    );
    Ok(())
}

fn copy(settings: &Settings, source: &str, target: &str) -> Result<()> {
    let store = load(settings, source)?;
    store.write(settings.resolve(target))
}

fn show_note(settings: &Settings, name: &str) -> Result<()> {
    let store = load(settings, name)?;
    match store.note() {
        Some(note) => println!("{note}"),
        None => println!("(no note)"),
    }
    Ok(())
}

fn set_note(settings: &Settings, name: &str, text: &str) -> Result<()> {
    let path = settings.resolve(name);
    let mut store = Store::new();
    store.read(&path, false)?;
    store.set_note(text)?;
    store.write(&path)
}
