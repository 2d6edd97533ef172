//! `kilnc` — command-line driver for the Kiln compiler.
//!
//! Resolves and lowers a program to LLVM IR, then optionally hands the
//! result to a system `cc`-family linker to produce (and, with `--run`,
//! immediately execute) a native binary.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use compiler::compilation::{Compilation, DEFAULT_TARGET_TRIPLE};

#[derive(Parser)]
#[command(name = "kilnc")]
#[command(version)]
#[command(about = "Ahead-of-time compiler for the Kiln language, targeting LLVM IR", long_about = None)]
struct Cli {
    /// Entry source file.
    file: PathBuf,

    /// Write the emitted LLVM IR to stdout instead of assembling/linking.
    #[arg(long)]
    emit_llvm: bool,

    /// Assemble and link the program, then execute it, propagating its exit code.
    #[arg(long)]
    run: bool,

    /// Output path for the emitted `.ll` file, or the linked binary when `--run` is not given.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Target triple passed through to the emitted IR's `target triple` line.
    #[arg(long, default_value = DEFAULT_TARGET_TRIPLE)]
    target: String,
}

fn main() {
    compiler::logging::init_from_env();
    let cli = Cli::parse();

    if let Err(message) = run(cli) {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let ir = Compilation::compile_file(&cli.file, &cli.target).map_err(|e| e.to_string())?;

    if cli.emit_llvm && !cli.run {
        match &cli.output {
            Some(path) => std::fs::write(path, &ir).map_err(|e| format!("failed to write {}: {e}", path.display()))?,
            None => print!("{ir}"),
        }
        return Ok(());
    }

    let ir_path = cli.output.clone().unwrap_or_else(|| cli.file.with_extension("ll"));
    std::fs::write(&ir_path, &ir).map_err(|e| format!("failed to write {}: {e}", ir_path.display()))?;

    if !cli.run {
        return Ok(());
    }

    let binary_path = ir_path.with_extension("");
    link(&ir_path, &binary_path)?;

    let status = process::Command::new(&binary_path)
        .status()
        .map_err(|e| format!("failed to execute {}: {e}", binary_path.display()))?;
    process::exit(status.code().unwrap_or(1));
}

fn link(ir_path: &PathBuf, binary_path: &PathBuf) -> Result<(), String> {
    let linker = find_linker()?;
    let output = process::Command::new(&linker)
        .arg(ir_path)
        .arg("-o")
        .arg(binary_path)
        .output()
        .map_err(|e| format!("failed to invoke {linker}: {e}"))?;

    if !output.status.success() {
        return Err(format!(
            "{linker} failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

fn find_linker() -> Result<String, String> {
    for candidate in ["clang", "gcc", "cc"] {
        if let Ok(output) = process::Command::new(candidate).arg("--version").output() {
            if output.status.success() {
                return Ok(candidate.to_string());
            }
        }
    }
    Err("no C compiler/linker found (tried: clang, gcc, cc)".to_string())
}
