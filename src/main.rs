//! expediente – command-line case-file batch → PDF converter.
//!
//! Usage:
//!   expediente <input.json> [output.pdf] [--font-dir DIR] [--builtin-fonts]
//!              [--title "Cartera"] [--no-trailing-break] [--layout-json PATH]
//!
//! If `output.pdf` is omitted the PDF is written next to the input file with
//! the same stem (e.g. `cartera.json` → `cartera.pdf`).

use std::{env, fs, path::Path, path::PathBuf, process};

use expediente_pdf::pipeline::{generate_pdf, PipelineConfig};
use expediente_pdf::resources::{ReportResources, DEFAULT_FONT_DIR};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut font_dir: Option<PathBuf> = None;
    let mut builtin_fonts = false;
    let mut trailing_break = true;
    let mut layout_path: Option<PathBuf> = None;
    let mut title: Option<String> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--builtin-fonts" => builtin_fonts = true,
            "--no-trailing-break" => trailing_break = false,
            "--title" | "-t" => title = Some(required_value(&mut iter, arg, &args[0])),
            "--font-dir" => font_dir = Some(required_value(&mut iter, arg, &args[0]).into()),
            "--layout-json" => layout_path = Some(required_value(&mut iter, arg, &args[0]).into()),
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    // Default output: same directory + same stem as input, but with .pdf
    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension("pdf");
        o
    });

    // Fonts are loaded once, before any input is read.
    let resources = if builtin_fonts {
        ReportResources::builtin()
    } else {
        let dir = font_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_DIR));
        match ReportResources::from_font_dir(&dir) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{e}");
                eprintln!("Pass --font-dir DIR or --builtin-fonts.");
                process::exit(2);
            }
        }
    };

    let payload: serde_json::Value = match fs::read_to_string(&input)
        .map_err(expediente_pdf::Error::from)
        .and_then(|s| serde_json::from_str(&s).map_err(expediente_pdf::Error::from))
    {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    // Default title: stem of the input filename.
    let default_title = input
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| PipelineConfig::default().title);

    let config = PipelineConfig {
        title: title.unwrap_or(default_title),
        trailing_page_break: trailing_break,
        ..PipelineConfig::default()
    };

    match generate_pdf(&payload, &resources, &config) {
        Ok((bytes, layout)) => {
            write_or_exit(&output, &bytes);
            if let Some(path) = &layout_path {
                write_or_exit(path, layout.to_json().as_bytes());
            }
            let pages = layout.pages.len();
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                output.display(),
                bytes.len(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error generating PDF: {e}");
            process::exit(1);
        }
    }
}

fn required_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

/// Write `bytes` to `path`, creating the parent directory if necessary.
fn write_or_exit(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("expediente – case-file batch to PDF report (expediente-pdf)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.json> [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.json>         JSON list of case-file records");
    eprintln!("  [output.pdf]         Output path  (default: same stem as input with .pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --font-dir DIR       Directory holding Inter.ttf and Inter-Bold.ttf (default: {DEFAULT_FONT_DIR})");
    eprintln!("  --builtin-fonts      Use the PDF base-14 Helvetica faces instead");
    eprintln!("  --title, -t          Document title in PDF metadata (default: input filename stem)");
    eprintln!("  --no-trailing-break  Do not end the document with a blank page");
    eprintln!("  --layout-json PATH   Also write the computed page layout as JSON");
    eprintln!("  --help               Print this message");
}
