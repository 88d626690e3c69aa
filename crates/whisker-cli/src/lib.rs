//! CLI logic for the Whisker template engine.
//!
//! This module renders a template file against a JSON or TOML model,
//! registering a directory of partials first.

pub mod error_adapter;

mod args;
mod config;
mod model;

pub use args::Args;

use std::{fs, io, path::Path};

use log::{debug, info, warn};

use whisker::{Engine, WhiskerError};

/// Run the Whisker CLI application
///
/// # Errors
///
/// Returns `WhiskerError` for:
/// - File I/O errors
/// - Configuration and model data loading errors
/// - Template and partial compile errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), WhiskerError> {
    info!(input_path = args.input; "Rendering template");

    let config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;
    let model = model::load_model(args.data.as_ref())?;

    let partials_dir = args
        .partials
        .clone()
        .or_else(|| config.partials().directory().map(str::to_string));
    let extension = config.partials().extension().to_string();

    let engine = Engine::new(config);
    if let Some(dir) = partials_dir {
        let count = register_partials(&engine, Path::new(&dir), &extension)?;
        info!(directory = dir, count = count; "Registered partials");
    }

    let template = engine.compile(&source)?;
    let output = template.render(&model)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            info!(output_file = path; "Output written successfully");
        }
        None => {
            io::Write::write_all(&mut io::stdout().lock(), output.as_bytes())?;
        }
    }

    Ok(())
}

/// Register every `*.{extension}` file in `dir` as a partial named by its file stem.
fn register_partials(engine: &Engine, dir: &Path, extension: &str) -> Result<usize, WhiskerError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()?;
    paths.sort();

    let mut count = 0;
    for path in paths {
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(path = path.display().to_string(); "Skipping partial with a non UTF-8 name");
            continue;
        };

        debug!(name = name, path = path.display().to_string(); "Registering partial");
        let source = fs::read_to_string(&path)?;
        if engine.register_partial(name, &source)? {
            count += 1;
        }
    }

    Ok(count)
}
