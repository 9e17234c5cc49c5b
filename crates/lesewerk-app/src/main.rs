// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lesewerk — searchable-PDF conversion.
//
// Entry point. Initialises logging, parses the command line, and drives one
// conversion. The report is printed to stdout as JSON; progress goes to
// stderr so the two can be piped separately.

use std::path::PathBuf;
use std::process::ExitCode;

use lesewerk_core::config::ConversionConfig;
use lesewerk_core::types::ConversionResponse;
use lesewerk_document::render::PdfiumRenderer;
use lesewerk_ocr::registry::EngineRegistry;
use lesewerk_pipeline::orchestrator::Pipeline;

const USAGE: &str = "usage: lesewerk <input.pdf> <output.pdf> \
[--dpi N] [--threshold X] [--engines a,b]";

struct CliArgs {
    input: PathBuf,
    output: PathBuf,
    config: ConversionConfig,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut positional: Vec<&str> = Vec::new();
    let mut config = ConversionConfig::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dpi" => {
                let value = iter.next().ok_or("--dpi requires a value")?;
                config.dpi = value.parse().map_err(|_| format!("invalid dpi: {value}"))?;
            }
            "--threshold" => {
                let value = iter.next().ok_or("--threshold requires a value")?;
                config.confidence_threshold = value
                    .parse()
                    .map_err(|_| format!("invalid threshold: {value}"))?;
            }
            "--engines" => {
                let value = iter.next().ok_or("--engines requires a value")?;
                config.engines = value.split(',').map(str::to_string).collect();
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            path => positional.push(path),
        }
    }

    match positional.as_slice() {
        [input, output] => Ok(CliArgs {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            config,
        }),
        _ => Err("expected exactly two paths: <input.pdf> <output.pdf>".to_string()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    tracing::info!(input = %cli.input.display(), "Lesewerk starting");

    let result = PdfiumRenderer::new().and_then(|renderer| {
        let registry = EngineRegistry::new();
        let pipeline = Pipeline::new(renderer, &registry);
        let mut progress = |current: usize, total: usize, message: &str| {
            eprintln!("[{current}/{total}] {message}");
        };
        pipeline.run(&cli.input, &cli.output, &cli.config, Some(&mut progress))
    });

    let success = result.is_ok();
    let response = ConversionResponse::from(result);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize report: {err}");
            return ExitCode::FAILURE;
        }
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_paths_and_defaults() {
        let cli = parse_args(&args(&["in.pdf", "out.pdf"])).unwrap();
        assert_eq!(cli.input, PathBuf::from("in.pdf"));
        assert_eq!(cli.output, PathBuf::from("out.pdf"));
        assert_eq!(cli.config.dpi, 300);
        assert_eq!(cli.config.engines, vec!["ocrs".to_string()]);
    }

    #[test]
    fn parses_flags_in_any_position() {
        let cli = parse_args(&args(&[
            "--dpi", "150", "in.pdf", "--engines", "ocrs,other", "out.pdf", "--threshold", "0.7",
        ]))
        .unwrap();
        assert_eq!(cli.config.dpi, 150);
        assert!((cli.config.confidence_threshold - 0.7).abs() < 1e-6);
        assert_eq!(cli.config.engines, vec!["ocrs".to_string(), "other".to_string()]);
    }

    #[test]
    fn rejects_missing_output() {
        assert!(parse_args(&args(&["in.pdf"])).is_err());
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(parse_args(&args(&["in.pdf", "out.pdf", "--verbose"])).is_err());
    }

    #[test]
    fn rejects_non_numeric_dpi() {
        assert!(parse_args(&args(&["in.pdf", "out.pdf", "--dpi", "high"])).is_err());
    }
}
