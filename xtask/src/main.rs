//! # xtask - build automation for the workspace
//!
//! See [`HELP_TEXT`] for the list of commands.

use anyhow::{Result, bail};
use xshell::{Shell, cmd};

/// Help message printed by `cargo run -p xtask -- help`.
pub const HELP_TEXT: &str = r#"xtask

Usage:
  cargo run -p xtask -- <command>

Commands:
  help         Show this message
  fmt          Run rustfmt
  fmt-check    Check formatting (CI)
  clippy       Run clippy (workspace)
  test         Run tests through nextest, then doctests (workspace)
  e2e          Build the CLI and run the end-to-end tests only
  ci           Run fmt-check + clippy + build + test

Note:
  cargo-nextest is installed on the first test run if missing
"#;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "help".to_string());

    let sh = Shell::new()?;

    match cmd.as_str() {
        "help" | "-h" | "--help" => help(),
        "fmt" => Ok(cmd!(sh, "cargo fmt --all").run()?),
        "fmt-check" => Ok(cmd!(sh, "cargo fmt --all -- --check").run()?),
        "clippy" => Ok(cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?),
        "test" => test(&sh),
        "e2e" => {
            ensure_nextest(&sh)?;
            cmd!(sh, "cargo build -p irs-converter").run()?;
            cmd!(sh, "cargo nextest run -p e2e-tests").run()?;
            Ok(())
        }
        "ci" => {
            cmd!(sh, "cargo fmt --all -- --check").run()?;
            cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
            // e2e tests need the binaries on disk
            cmd!(sh, "cargo build --workspace").run()?;
            test(&sh)
        }
        other => bail!("Unknown command: {other}\n\nRun: cargo run -p xtask -- help"),
    }
}

fn help() -> Result<()> {
    println!("{HELP_TEXT}");
    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    ensure_nextest(sh)?;
    cmd!(sh, "cargo nextest run --workspace").run()?;
    // nextest does not run doctests
    cmd!(sh, "cargo test --workspace --doc").run()?;
    Ok(())
}

/// Installs cargo-nextest when `cargo nextest` is not available.
fn ensure_nextest(sh: &Shell) -> Result<()> {
    if cmd!(sh, "cargo nextest --version").quiet().run().is_ok() {
        return Ok(());
    }

    eprintln!("cargo-nextest not found, installing...");
    cmd!(sh, "cargo install cargo-nextest --locked").run()?;
    Ok(())
}
