// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use gbxml_lite_reconstruct::{reconstruct, write_obj, ImageFeatureSet, SolidModel, Warning};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const MODEL_FILE_NAME: &str = "building_model.obj";
pub const GBXML_FILE_NAME: &str = "building_model.gbxml";
pub const WARNINGS_FILE_NAME: &str = "building_model.warnings.json";

/// Everything one generation run produces
#[derive(Debug, Clone)]
pub struct GenerateOutput {
    /// OBJ text of the solid model
    pub model_file: String,
    /// gbXML text, written even when it breaks a schema rule
    pub gbxml_file: String,
    pub warnings: Vec<Warning>,
    pub schema_violation: Option<gbxml_lite_gbxml::Error>,
    pub model: SolidModel,
}

impl GenerateOutput {
    /// Warnings as a JSON array
    pub fn warnings_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.warnings)
    }
}

/// Paths of the files written by [`write_artifacts`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub model_path: PathBuf,
    pub gbxml_path: PathBuf,
    pub warnings_path: PathBuf,
}

/// Reconstruct the building and render both artifacts in memory.
///
/// Nothing is written to disk; a fatal reconstruction error leaves no
/// partial output behind.
pub fn generate(
    floor_plans: &[ImageFeatureSet],
    elevations: &[ImageFeatureSet],
    config: &PipelineConfig,
) -> Result<GenerateOutput> {
    let start = Instant::now();

    let built = reconstruct(floor_plans, elevations, &config.reconstruction)?;
    let model_file = write_obj(&built.model);
    let exported = gbxml_lite_gbxml::export(&built.model, &config.gbxml);

    tracing::info!(
        floors = built.model.floors.len(),
        triangles = built.model.mesh.triangle_count(),
        warnings = built.warnings.len(),
        schema_valid = exported.violation.is_none(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Generated building model"
    );

    Ok(GenerateOutput {
        model_file,
        gbxml_file: exported.xml,
        warnings: built.warnings,
        schema_violation: exported.violation,
        model: built.model,
    })
}

/// Write the OBJ, gbXML and warning report into `dir`, creating it if needed.
pub fn write_artifacts(output: &GenerateOutput, dir: impl AsRef<Path>) -> Result<Artifacts> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| ProcessingError::io(dir, e))?;

    let artifacts = Artifacts {
        model_path: dir.join(MODEL_FILE_NAME),
        gbxml_path: dir.join(GBXML_FILE_NAME),
        warnings_path: dir.join(WARNINGS_FILE_NAME),
    };
    let report = output
        .warnings_json()
        .map_err(|source| ProcessingError::Json {
            path: artifacts.warnings_path.clone(),
            source,
        })?;

    for (path, contents) in [
        (&artifacts.model_path, &output.model_file),
        (&artifacts.gbxml_path, &output.gbxml_file),
        (&artifacts.warnings_path, &report),
    ] {
        std::fs::write(path, contents).map_err(|e| ProcessingError::io(path, e))?;
    }

    tracing::debug!(dir = %dir.display(), "Wrote artifacts");
    Ok(artifacts)
}
