//! `letfloat`: command-line driver for the let-floating pass.
//!
//! Reads one JavaScript file, floats its pure curried computations, and
//! prints the result to stdout (or rewrites the file with `--in-place`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use letfloat_core::{
    FloatConfig, FloatOutput, LetFloatError, LetFloatResult, MAX_INPUT_BYTES, SourceType,
};
use tracing::info;

/// Stack for the thread that parses and transforms the input.  The parser
/// caps nesting depth, and every pass recurses at most that deep.
const WORKER_STACK_BYTES: usize = 64 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "letfloat")]
#[command(about = "Hoist pure computations out of curried JavaScript closures")]
#[command(version)]
struct Cli {
    /// The JavaScript file to transform
    file: PathBuf,

    /// Rewrite the file instead of printing to stdout
    #[arg(long)]
    in_place: bool,

    /// Parse as an ES module regardless of extension or contents
    #[arg(long)]
    module: bool,

    /// Log every candidate decision to stderr
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }
    match run_on_worker(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("letfloat: error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_on_worker(cli: Cli) -> LetFloatResult<()> {
    let handle = std::thread::Builder::new()
        .name("letfloat-worker".to_owned())
        .stack_size(WORKER_STACK_BYTES)
        .spawn(move || run(&cli))?;
    match handle.join() {
        Ok(result) => result,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

fn run(cli: &Cli) -> LetFloatResult<()> {
    let source = read_source(&cli.file)?;
    let config = FloatConfig::default();
    let output = match forced_source_type(cli) {
        Some(source_type) => letfloat_core::float_source_as(&source, source_type, &config)?,
        None => letfloat_core::float_source_detect(&source, &config)?,
    };
    report(&cli.file, &output);
    if cli.in_place {
        std::fs::write(&cli.file, &output.code)?;
    } else {
        print!("{}", output.code);
    }
    Ok(())
}

/// Read `path`, refusing anything over [`MAX_INPUT_BYTES`] before reading it.
fn read_source(path: &Path) -> LetFloatResult<String> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_INPUT_BYTES {
        return Err(LetFloatError::InputTooLarge {
            size,
            limit: MAX_INPUT_BYTES,
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

fn forced_source_type(cli: &Cli) -> Option<SourceType> {
    let mjs = cli.file.extension().is_some_and(|ext| ext == "mjs");
    (cli.module || mjs).then_some(SourceType::Module)
}

fn report(path: &Path, output: &FloatOutput) {
    let r = &output.report;
    info!(
        file = %path.display(),
        candidates = r.candidates,
        floated = r.floated,
        rejected = r.rejected,
        helper = r.helper.as_deref().unwrap_or("-"),
        "done"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("letfloat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags() {
        let c = cli(&["--in-place", "-v", "a.js"]);
        assert!(c.in_place);
        assert!(c.verbose);
        assert!(!c.module);
        assert_eq!(c.file, PathBuf::from("a.js"));
        assert!(Cli::try_parse_from(["letfloat"]).is_err());
    }

    #[test]
    fn test_source_type_from_flag_or_extension() {
        assert_eq!(forced_source_type(&cli(&["a.mjs"])), Some(SourceType::Module));
        assert_eq!(forced_source_type(&cli(&["--module", "a.js"])), Some(SourceType::Module));
        assert_eq!(forced_source_type(&cli(&["a.js"])), None);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = read_source(Path::new("/nonexistent/letfloat/input.js")).unwrap_err();
        assert!(matches!(err, LetFloatError::Io(_)));
    }

    #[test]
    fn test_in_place_rewrite() {
        let dir = std::env::temp_dir().join(format!("letfloat-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("curried.js");
        std::fs::write(
            &file,
            "function main(x){return function(y){return function(z){return add(x)(y)+z}}}",
        )
        .unwrap();
        run(&cli(&["--in-place", file.to_str().unwrap()])).unwrap();
        let rewritten = std::fs::read_to_string(&file).unwrap();
        assert!(rewritten.contains("const add_y__fb = memo__fb("));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_deeply_nested_input_is_reported() {
        let dir = std::env::temp_dir().join(format!("letfloat-deep-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("deep.js");
        let n = 100_000;
        std::fs::write(&file, format!("var a = {}1{};", "[".repeat(n), "]".repeat(n))).unwrap();
        let err = run_on_worker(cli(&[file.to_str().unwrap()])).unwrap_err();
        assert!(err.to_string().starts_with("SyntaxError: nesting too deep"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
