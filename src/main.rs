//! Command-line driver: replace the text of one shape in a VSDX file.
//!
//! # Usage
//!
//! ```sh
//! vsdx-shape-text drawing.vsdx --value Shape2 --text "Danny Nguyen"
//! ```
//!
//! List the package parts first:
//! ```sh
//! vsdx-shape-text ~/Desktop --list-parts
//! ```

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use vsdx_shape_text::opc::rel_types;
use vsdx_shape_text::{Error, Package, ShapeTextEdit, WriteMode};

/// Replace the text of a named shape inside a Visio package
#[derive(Parser, Debug)]
#[command(name = "vsdx-shape-text", version)]
struct Args {
    /// VSDX file, or a folder whose first .vsdx file is used
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Attribute value selecting the shape
    #[arg(short, long, value_name = "VALUE", requires = "text")]
    value: Option<String>,

    /// Replacement text
    #[arg(short, long, value_name = "TEXT", requires = "value")]
    text: Option<String>,

    /// Attribute compared against VALUE
    #[arg(long, value_name = "NAME", default_value = "NameU")]
    attr: String,

    /// Local name of the elements searched
    #[arg(long, default_value = "Shape")]
    tag: String,

    /// Write a temporary copy and rename it over the original
    #[arg(long)]
    atomic: bool,

    /// Print every part and its content type
    #[arg(long)]
    list_parts: bool,

    /// Relationship type from the package root to the document part
    #[arg(long, value_name = "URI", default_value = rel_types::VISIO_DOCUMENT)]
    document_rel: String,

    /// Relationship type from the document part to the pages part
    #[arg(long, value_name = "URI", default_value = rel_types::VISIO_PAGES)]
    pages_rel: String,

    /// Relationship type from the pages part to the page
    #[arg(long, value_name = "URI", default_value = rel_types::VISIO_PAGE)]
    page_rel: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = locate_container(&args.path)?;

    if args.list_parts {
        let package = Package::open(&path)?;
        for (uri, content_type) in package.list_parts() {
            println!("Package part: {}", uri);
            println!("Content type: {}", content_type);
        }
        package.close()?;
    }

    let (Some(value), Some(text)) = (&args.value, &args.text) else {
        if !args.list_parts {
            return Err("nothing to do: pass --value and --text, or --list-parts".into());
        }
        return Ok(());
    };

    let mode = if args.atomic {
        WriteMode::Atomic
    } else {
        WriteMode::InPlace
    };
    let report = ShapeTextEdit::new(value.as_str(), text.as_str())
        .attribute(args.attr.as_str())
        .tag(args.tag.as_str())
        .relationship_types(
            args.document_rel.as_str(),
            args.pages_rel.as_str(),
            args.page_rel.as_str(),
        )
        .write_mode(mode)
        .apply(&path)?;

    match report.previous_text {
        Some(previous) => println!(
            "{}: {}=\"{}\" text \"{}\" -> \"{}\"",
            report.page, args.attr, value, previous, text
        ),
        None => println!("{}: {}=\"{}\" text set to \"{}\"", report.page, args.attr, value, text),
    }
    Ok(())
}

/// A file path is used as is; a folder yields its first `.vsdx` file by name
fn locate_container(path: &Path) -> Result<PathBuf, Error> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("vsdx"))
        })
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::ContainerNotFound(path.join("*.vsdx")))
}
