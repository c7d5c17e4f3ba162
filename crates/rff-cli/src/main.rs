//! Command-line entry point: convert delimited text to the binary RFF
//! form, or check an existing RFF file for consistency.

use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::warn;

use rff::{format, Parser, RffError};

const USAGE: &str = "\
=== USAGE ===

1. Creating an RFF file from a TSV/CSV file:
   rff-cli <input.tsv> <output.rff>

2. Validating an existing RFF file:
   rff-cli -check <file.rff>
";

enum Mode {
    Usage,
    Check(String),
    Convert(String, String),
}

fn parse_args(args: &[String]) -> Result<Mode> {
    match args {
        [] => Ok(Mode::Usage),
        [flag, path] if flag == "-check" => Ok(Mode::Check(path.clone())),
        [input, output] => Ok(Mode::Convert(input.clone(), output.clone())),
        _ => bail!("expected <input.tsv> <output.rff>, or -check <file.rff>"),
    }
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let file = File::open(input).with_context(|| format!("opening '{}'", input.display()))?;
    let rff = Parser::default()
        .parse(BufReader::new(file))
        .with_context(|| format!("parsing '{}'", input.display()))?;

    if rff.is_truncated() {
        warn!(path = %input.display(), "input was truncated at a configured limit");
    }
    for cell in rff.unexpected_cells() {
        warn!(%cell, "cell beyond the declared column count");
    }

    let out = File::create(output).with_context(|| format!("creating '{}'", output.display()))?;
    let mut writer = BufWriter::new(out);
    format::write(&mut writer, &rff)
        .with_context(|| format!("writing '{}'", output.display()))?;
    writer.flush()?;

    println!(
        "wrote '{}': {} columns, {} lines, {} distinct values.",
        output.display(),
        rff.columns(),
        rff.lines(),
        rff.content().len() - 1,
    );
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let rff = format::read(&mut BufReader::new(file))
        .with_context(|| format!("reading '{}'", path.display()))?;
    rff.check_consistency()
        .with_context(|| format!("checking '{}'", path.display()))?;
    println!("file '{}' is well formed.", path.display());
    Ok(())
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    match parse_args(&args)? {
        Mode::Usage => {
            print!("{USAGE}");
            Ok(())
        }
        Mode::Check(path) => check(Path::new(&path)),
        Mode::Convert(input, output) => convert(Path::new(&input), Path::new(&output)),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<RffError>()
                .map_or(1, |e| u8::try_from(e.exit_code()).unwrap_or(1));
            ExitCode::from(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_args_prints_usage() {
        assert!(matches!(parse_args(&[]), Ok(Mode::Usage)));
    }

    #[test]
    fn check_mode() {
        let mode = parse_args(&strings(&["-check", "data.rff"])).expect("mode");
        assert!(matches!(mode, Mode::Check(path) if path == "data.rff"));
    }

    #[test]
    fn convert_mode() {
        let mode = parse_args(&strings(&["in.tsv", "out.rff"])).expect("mode");
        assert!(matches!(
            mode,
            Mode::Convert(input, output) if input == "in.tsv" && output == "out.rff"
        ));
    }

    #[test]
    fn excess_args_rejected() {
        assert!(parse_args(&strings(&["a", "b", "c"])).is_err());
        assert!(parse_args(&strings(&["only-one"])).is_err());
    }

    #[test]
    fn convert_then_check_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tsv = dir.path().join("input.tsv");
        let rff = dir.path().join("output.rff");
        std::fs::write(&tsv, b"a\tb\n1\t2\n").expect("write tsv");

        convert(&tsv, &rff).expect("convert");
        check(&rff).expect("check");
    }

    #[test]
    fn check_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.rff");
        std::fs::write(&path, [9, 9, 9]).expect("write");
        assert!(check(&path).is_err());
    }
}
