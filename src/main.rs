// gust - A small parenthesized functional language with a bytecode compiler and stack VM
// Copyright (c) 2026 The Gust Authors. MIT licensed.

use std::env;
use std::fs;
use std::path::Path;
use std::process;
use std::sync::Mutex;

use gust_parser::Parser;
use gust_vm::{Compiler, Vm};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: gust [-debug <log_file>] <source_file>";

fn main() {
    let args: Vec<String> = env::args().collect();

    // Handle --version flag
    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Gust v0.1.0");
        return;
    }

    let mut debug_log: Option<String> = None;
    let mut source_file: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-debug" => {
                i += 1;
                match args.get(i) {
                    Some(path) => debug_log = Some(path.clone()),
                    None => {
                        eprintln!("Error: -debug expects a log file path\n{}", USAGE);
                        process::exit(1);
                    }
                }
            }
            arg if source_file.is_none() => source_file = Some(arg.to_string()),
            arg => {
                eprintln!("Error: unexpected argument '{}'\n{}", arg, USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    let source_file = match source_file {
        Some(file) => file,
        None => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = init_tracing(debug_log.as_deref()) {
        eprintln!("{}", e);
        process::exit(1);
    }

    if let Err(e) = run_file(&source_file) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Initialise diagnostics.
///
/// Filtering follows `GUST_LOG` (falling back to `RUST_LOG`). Without
/// `-debug`, diagnostics go to stderr at `warn` and above; with `-debug`,
/// everything from `debug` up is appended to the log file. Program output is
/// written by the VM directly and never passes through here.
fn init_tracing(log_file: Option<&str>) -> Result<(), String> {
    let default_level = if log_file.is_some() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_file {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Error opening log file '{}': {}", path, e))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
    }
    Ok(())
}

/// Compile and run a single source file.
fn run_file(file_path: &str) -> Result<(), String> {
    let path = Path::new(file_path);

    // Validate file extension
    match path.extension().and_then(|e| e.to_str()) {
        Some("gu") => {}
        Some(ext) => {
            return Err(format!(
                "Error: unsupported file extension '.{}' for '{}' (expected .gu)",
                ext, file_path
            ));
        }
        None => {
            return Err(format!(
                "Error: file '{}' has no extension (expected .gu)",
                file_path
            ));
        }
    }

    let source =
        fs::read_to_string(path).map_err(|e| format!("Error reading '{}': {}", file_path, e))?;

    let ast = Parser::parse_str(&source)
        .map_err(|e| format!("Error in '{}': {}", file_path, e))?;

    let program = Compiler::new()
        .compile(&ast)
        .map_err(|e| format!("Compile error in '{}': {}", file_path, e))?;
    tracing::debug!("disassembly:\n{}", program.disassemble());

    let mut vm = Vm::new(program);
    vm.run()
        .map_err(|e| format!("Runtime error in '{}': {}", file_path, e))
}
