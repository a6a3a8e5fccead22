use std::cell::Cell;
use std::io::{self, Write, stdout};
use std::panic;
use std::rc::Rc;
use std::{env, fs::File};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use simplelog::{LevelFilter, WriteLogger};

use twopress::event_source::KeyboardEventSource;
use twopress::{
    BindingTables, Command, CommandRegistry, DispatchContext, InstallOptions, KeyDispatcher,
    Keymaps, Registrar, Settings, Step,
};

fn main() -> Result<()> {
    WriteLogger::init(
        LevelFilter::Debug,
        simplelog::Config::default(),
        File::create("twopress.log")?,
    )?;

    let settings_path = env::args().nth(1);
    let settings = Settings::load_or_default(settings_path.as_deref());

    initialize_panic_handler();
    info!("Starting twopress demo");

    enable_raw_mode().map_err(|e| {
        error!("Failed to enable raw mode: {e}");
        anyhow::anyhow!(
            "Failed to initialize terminal: {e}\n\
             Make sure you are running twopress in a terminal, not from a pipe or redirection."
        )
    })?;

    let res = run(&settings);

    let _ = disable_raw_mode();
    if let Err(err) = &res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down twopress");
    res
}

fn run(settings: &Settings) -> Result<()> {
    let quit = Rc::new(Cell::new(false));
    let mut commands = CommandRegistry::new();
    for name in ["mark", "mark-all", "describe", "describe-twice", "zoom"] {
        commands.register(name, move |keys| say(&format!("{name} ({keys})")));
    }
    let quit_flag = Rc::clone(&quit);
    commands.register("quit", move |_| {
        quit_flag.set(true);
        Ok(())
    });

    let mut keymaps = Keymaps::new();
    let root = keymaps.root();
    let local = keymaps.new_table();
    keymaps.activate(local);
    keymaps.define(root, "q", Command::new("quit"))?;
    keymaps.define(root, "C-x .", Command::new("mark"))?;
    keymaps.define(root, "<f1>", Command::new("describe"))?;
    keymaps.define(root, "z", Command::new("zoom"))?;

    let mut registrar = Registrar::with_settings(settings).context("Invalid settings")?;
    registrar.install(
        &mut keymaps,
        root,
        "C-x .",
        Some(Command::new("mark-all")),
        InstallOptions::new().doc("Mark once, or everything when pressed twice"),
    )?;
    registrar.install(
        &mut keymaps,
        root,
        "<f1>",
        Some(Command::new("describe-twice")),
        InstallOptions::new(),
    )?;
    // No local binding for `z`: a single press falls through to the global one.
    registrar.install(
        &mut keymaps,
        local,
        "z",
        Some(Command::new("mark-all")),
        InstallOptions::new(),
    )?;

    for record in registrar.records() {
        say(&serde_json::to_string(record)?)?;
    }
    say("Try C-x . (twice), F1 (twice), z (twice). q quits.")?;

    let mut events = KeyboardEventSource::new();
    let mut dispatcher = KeyDispatcher::new();
    while !quit.get() {
        let mut ctx = DispatchContext {
            tables: &keymaps,
            events: &mut events,
            commands: &mut commands,
        };
        match dispatcher.process_next(&registrar, &mut ctx) {
            Ok(Step::Unbound(keys)) => say(&format!("{keys} is undefined"))?,
            Ok(_) => {}
            Err(err) => say(&format!("error: {err}"))?,
        }
    }
    Ok(())
}

fn say(line: &str) -> Result<()> {
    let mut out = stdout();
    write!(out, "{line}\r\n")?;
    out.flush()?;
    Ok(())
}

fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), crossterm::cursor::Show);
        default_hook(panic_info);
        std::process::exit(1);
    }));
}
