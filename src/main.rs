use std::{env, path::Path, process};

use anyhow::{Context, Result, bail};
use log::{LevelFilter, Log, Metadata, Record};
use rayon::prelude::*;

use tether::{
    Lua, RuntimeConfig,
    runtime::leak_detector,
};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// `Ok(false)` when a script failed.
fn run() -> Result<bool> {
    let mut args: Vec<String> = env::args().collect();
    let verbose = args.iter().any(|arg| arg == "--verbose");
    let trace = args.iter().any(|arg| arg == "--trace");
    let leak_detector = args.iter().any(|arg| arg == "--leak-detector");
    args.retain(|arg| arg != "--verbose" && arg != "--trace" && arg != "--leak-detector");
    let config = extract_config(&mut args)?;

    install_logger(if trace {
        LevelFilter::Trace
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });

    if args.len() < 2 {
        print_help();
        return Ok(true);
    }

    let ok = match args[1].as_str() {
        "-h" | "--help" | "help" => {
            print_help();
            true
        }
        "eval" => {
            if args.len() < 3 {
                bail!("Usage: tether eval <expr>");
            }
            eval_expression(&args[2..].join(" "), config)?
        }
        "run" => {
            if args.len() < 3 {
                bail!("Usage: tether run <file.lua>...");
            }
            run_files(&args[2..], &config)
        }
        other => bail!("unknown command `{}` (try `tether --help`)", other),
    };

    if leak_detector {
        print_leak_stats();
    }
    Ok(ok)
}

fn print_help() {
    println!(
        "\
Tether CLI

Usage:
  tether eval <expr>
  tether run <file.lua> [<file.lua> ...]

Flags:
  --config <file>    Load runtime limits from a JSON file
  --verbose          Log chunk loads and cache hits/misses
  --trace            Log registry and stack traffic
  --leak-detector    Print registry and allocation counters after the run
  -h, --help         Show this help message
"
    );
}

fn install_logger(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn extract_config(args: &mut Vec<String>) -> Result<RuntimeConfig> {
    let Some(index) = args.iter().position(|arg| arg == "--config") else {
        return Ok(RuntimeConfig::default());
    };
    if index + 1 >= args.len() {
        bail!("Usage: --config <file.json>");
    }
    let path = args.remove(index + 1);
    args.remove(index);
    RuntimeConfig::from_file(&path).with_context(|| format!("loading config {}", path))
}

fn eval_expression(expr: &str, config: RuntimeConfig) -> Result<bool> {
    let lua = Lua::with_config(config)?;
    let result = lua.eval(expr);
    if !result.ok() {
        eprintln!("{}", result.error_message());
        return Ok(false);
    }
    let rendered: Vec<String> = result.values().iter().map(|v| v.to_string()).collect();
    if !rendered.is_empty() {
        println!("{}", rendered.join("\t"));
    }
    Ok(true)
}

struct ScriptRun {
    output: String,
    error: Option<String>,
}

fn run_files(files: &[String], config: &RuntimeConfig) -> bool {
    let capture = RuntimeConfig {
        capture_output: true,
        ..config.clone()
    };
    let runs: Vec<ScriptRun> = files
        .par_iter()
        .map(|file| run_script(Path::new(file), &capture))
        .collect();

    let mut ok = true;
    for (file, run) in files.iter().zip(runs) {
        print!("{}", run.output);
        if let Some(error) = run.error {
            eprintln!("{}: {}", file, error);
            ok = false;
        }
    }
    ok
}

// Connections are not `Send`; each task opens its own.
fn run_script(path: &Path, config: &RuntimeConfig) -> ScriptRun {
    let lua = match Lua::with_config(config.clone()) {
        Ok(lua) => lua,
        Err(e) => {
            return ScriptRun {
                output: String::new(),
                error: Some(e.to_string()),
            };
        }
    };
    let result = lua.do_file(path);
    let error = (!result.ok()).then(|| result.error_message());
    drop(result);
    ScriptRun {
        output: lua.take_output(),
        error,
    }
}

fn print_leak_stats() {
    let stats = leak_detector::snapshot();
    eprintln!(
        "[leak] refs created={} released={} outstanding={} tables={} closures={} states={}",
        stats.refs_created,
        stats.refs_released,
        stats.refs_outstanding(),
        stats.tables,
        stats.closures,
        stats.states
    );
}
