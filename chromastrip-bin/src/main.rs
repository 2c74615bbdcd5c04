//! Group hex colors by perceptual similarity and print them as an ordered palette strip.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{io, process::ExitCode, time::Instant};

use chromastrip::{HexColor, Palette, PaletteError};
use clap::Parser;
use colored::Colorize;
use palette::Srgb;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Record the running time of a function and log the elapsed time
macro_rules! time {
    ($name: literal, $func_call: expr) => {{
        let start = Instant::now();
        let result = $func_call;
        tracing::info!("{} took {}ms", $name, start.elapsed().as_millis());
        result
    }};
}

/// Error cases for reading colors and generating their palette
#[derive(Debug, Error)]
enum CliError {
    /// Failed to read the colors from stdin
    #[error("failed to read colors from stdin: {0}")]
    Stdin(#[from] io::Error),
    /// The colors or options were rejected
    #[error(transparent)]
    Palette(#[from] PaletteError),
    /// Failed to serialize the palette
    #[error("failed to serialize the palette: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to build the thread pool
    #[cfg(feature = "threads")]
    #[error("failed to build the thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn main() -> ExitCode {
    let options = Options::parse();

    init_logging(options.verbose);

    let result = run_generate_and_print_palette(&options);

    // Returning Result<_> uses Debug printing instead of Display
    if let Err(e) = result {
        eprintln!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Log to stderr, honoring `RUST_LOG` if it is set
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Builds a thread pool and then runs `generate_and_print_palette`
#[cfg(feature = "threads")]
fn run_generate_and_print_palette(options: &Options) -> Result<(), CliError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()?;

    pool.install(|| generate_and_print_palette(options))
}

/// Runs `generate_and_print_palette` on a single thread
#[cfg(not(feature = "threads"))]
fn run_generate_and_print_palette(options: &Options) -> Result<(), CliError> {
    generate_and_print_palette(options)
}

/// Read the colors, generate their palette, and print the result using the given options
fn generate_and_print_palette(options: &Options) -> Result<(), CliError> {
    // Input
    let colors = if options.colors.is_empty() {
        read_lines(io::stdin().lock())?
    } else {
        options.colors.clone()
    };

    // Processing
    chromastrip::initialize();
    let palette = time!(
        "Palette generation",
        chromastrip::build_palette(&colors, options.k, &options.palette_options())
    )?;

    // Output
    print_palette(&palette, options)
}

/// Read one color per line, trimming whitespace and skipping blank lines
fn read_lines(reader: impl io::BufRead) -> io::Result<Vec<String>> {
    let mut colors = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            colors.push(line.to_owned());
        }
    }
    Ok(colors)
}

/// Print the given palette based off the provided options
fn print_palette(palette: &Palette, options: &Options) -> Result<(), CliError> {
    match options.output {
        FormatOutput::Json => println!("{}", serde_json::to_string_pretty(palette)?),

        FormatOutput::Hex => color_format_print(palette, options, " ", |color| color.as_str().to_owned()),

        FormatOutput::Rgb => color_format_print(palette, options, " ", |color| {
            let Srgb { red, green, blue, .. } = color.srgb();
            format!("({red},{green},{blue})")
        }),

        FormatOutput::Swatch => format_print(palette, options, "", |color| {
            let srgb = color.srgb();
            "   ".on_truecolor(srgb.red, srgb.green, srgb.blue).to_string()
        }),
    }

    Ok(())
}

/// The lines of colors to print: one per cluster if grouping, otherwise the whole strip
fn lines<'a>(palette: &'a Palette, options: &Options) -> Vec<Vec<&'a HexColor>> {
    let mut lines = if options.group {
        palette
            .clusters()
            .filter(|cluster| !cluster.is_empty())
            .map(|cluster| cluster.iter().collect::<Vec<_>>())
            .collect::<Vec<_>>()
    } else {
        vec![palette.colors.iter().collect()]
    };

    if options.reverse {
        lines.reverse();
        for line in &mut lines {
            line.reverse();
        }
    }

    lines
}

/// Print all colors using the given format
fn format_print(palette: &Palette, options: &Options, delimiter: &str, format: impl Fn(&HexColor) -> String) {
    for line in lines(palette, options) {
        println!(
            "{}",
            line.into_iter().map(&format).collect::<Vec<_>>().join(delimiter)
        );
    }
}

/// Format, colorize, and then print the text for all colors
fn color_format_print(palette: &Palette, options: &Options, delimiter: &str, format: impl Fn(&HexColor) -> String) {
    match options.colorize {
        Some(ColorizeOutput::Fg) => format_print(palette, options, delimiter, |color| {
            let srgb = color.srgb();
            format(color).truecolor(srgb.red, srgb.green, srgb.blue).to_string()
        }),

        Some(ColorizeOutput::Bg) => format_print(palette, options, delimiter, |color| {
            let srgb = color.srgb();
            format(color).on_truecolor(srgb.red, srgb.green, srgb.blue).to_string()
        }),

        None => format_print(palette, options, delimiter, format),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        chromastrip::Backend::new()
            .build_palette(&["#FF0000", "#00FF00", "#0000FF", "#FF0001"], 2, &chromastrip::Options::default())
            .unwrap()
    }

    fn codes<'a>(lines: &[Vec<&'a HexColor>]) -> Vec<Vec<&'a str>> {
        lines
            .iter()
            .map(|line| line.iter().map(|color| color.as_str()).collect())
            .collect()
    }

    #[test]
    fn stdin_lines_are_trimmed_and_blank_lines_skipped() {
        let input = "  #FF0000\n\n#00ff00  \r\n\t\n#0000FF";
        let colors = read_lines(input.as_bytes()).unwrap();
        assert_eq!(colors, ["#FF0000", "#00ff00", "#0000FF"]);
    }

    #[test]
    fn single_line_by_default() {
        let palette = palette();
        let options = Options::parse_from(["chromastrip"]);

        let lines = lines(&palette, &options);
        assert_eq!(codes(&lines), [palette.hex_codes()]);
    }

    #[test]
    fn grouped_lines_follow_clusters() {
        let palette = palette();
        let options = Options::parse_from(["chromastrip", "--group"]);

        let expected = palette
            .clusters()
            .filter(|cluster| !cluster.is_empty())
            .map(|cluster| cluster.iter().map(HexColor::as_str).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        assert_eq!(codes(&lines(&palette, &options)), expected);
    }

    #[test]
    fn reverse_reverses_everything() {
        let palette = palette();
        let options = Options::parse_from(["chromastrip", "--reverse"]);

        let mut expected = palette.hex_codes();
        expected.reverse();

        assert_eq!(codes(&lines(&palette, &options)), [expected]);
    }
}
