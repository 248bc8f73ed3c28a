// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! plans-to-gbxml - build an OBJ model and a gbXML document from
//! floor plan and elevation feature sets.
//!
//! Each `--plan` and `--elevation` file holds one feature set object or an
//! array of them. Tolerances come from `GBXML_LITE_*` environment variables;
//! `--unit` and `--name` override the matching variables.

use anyhow::{Context, Result};
use clap::Parser;
use gbxml_lite_gbxml::OutputUnit;
use gbxml_lite_processing::{
    generate, read_feature_sets, write_artifacts, ImageFeatureSet, PipelineConfig,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plans-to-gbxml", version)]
struct Args {
    /// Floor plan feature set JSON (repeatable)
    #[arg(long = "plan", required = true)]
    plans: Vec<PathBuf>,

    /// Elevation feature set JSON (repeatable)
    #[arg(long = "elevation")]
    elevations: Vec<PathBuf>,

    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Output length unit: meters or feet
    #[arg(long)]
    unit: Option<OutputUnit>,

    /// Building name written to the gbXML document
    #[arg(long)]
    name: Option<String>,
}

fn read_all(paths: &[PathBuf]) -> Result<Vec<ImageFeatureSet>> {
    let mut sets = Vec::new();
    for path in paths {
        sets.extend(read_feature_sets(path)?);
    }
    Ok(sets)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,gbxml_lite=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(unit) = args.unit {
        config.gbxml.unit = unit;
    }
    if let Some(name) = args.name {
        config.gbxml.building_name = name;
    }

    let plans = read_all(&args.plans)?;
    let elevations = read_all(&args.elevations)?;
    tracing::info!(
        plans = plans.len(),
        elevations = elevations.len(),
        unit = config.gbxml.unit.length_unit(),
        "Starting generation"
    );

    let output = generate(&plans, &elevations, &config).context("generation failed")?;

    for warning in &output.warnings {
        eprintln!("warning: {}", warning);
    }
    if let Some(violation) = &output.schema_violation {
        eprintln!("warning: gbXML written with a schema violation: {}", violation);
    }

    let artifacts = write_artifacts(&output, &args.output_dir)
        .with_context(|| format!("writing artifacts to {}", args.output_dir.display()))?;

    println!("{}", artifacts.model_path.display());
    println!("{}", artifacts.gbxml_path.display());
    Ok(())
}
