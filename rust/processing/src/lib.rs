// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end generation: feature sets in, OBJ and gbXML out.
//!
//! ```rust,ignore
//! use gbxml_lite_processing::{generate, read_feature_sets, write_artifacts, PipelineConfig};
//!
//! let plans = read_feature_sets("plans.json")?;
//! let output = generate(&plans, &[], &PipelineConfig::from_env())?;
//! write_artifacts(&output, "out")?;
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{ProcessingError, Result};
pub use input::{parse_feature_sets, read_feature_sets};
pub use gbxml_lite_reconstruct::{ImageFeatureSet, Warning};
pub use pipeline::{
    generate, write_artifacts, Artifacts, GenerateOutput, GBXML_FILE_NAME, MODEL_FILE_NAME,
    WARNINGS_FILE_NAME,
};
