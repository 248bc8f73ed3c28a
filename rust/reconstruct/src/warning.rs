// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recoverable conditions reported alongside a best-effort model

use crate::types::{FeatureRef, Orientation};
use serde::Serialize;
use std::fmt;

/// Where an unplaced opening was recorded
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum DeferredTo {
    Wall { wall: FeatureRef },
    Floor { floor: usize },
    Model,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum Warning {
    /// At least one floor fell back to the default height
    HeightInferenceDegraded { reason: String, default_height: f64 },
    /// An opening matched no wall within tolerance and was deferred
    UnmatchedOpening {
        opening: FeatureRef,
        #[serde(skip_serializing_if = "Option::is_none")]
        orientation: Option<Orientation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        distance: Option<f64>,
        deferred_to: DeferredTo,
    },
    /// An opening was moved or shrunk to fit its wall
    OpeningClamped { opening: FeatureRef, wall: FeatureRef },
    /// A feature could not be used as given
    DegenerateFeature { feature: FeatureRef, reason: String },
    /// Neither walls nor rooms gave a roof outline
    RoofOutlineMissing { floor: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::HeightInferenceDegraded {
                reason,
                default_height,
            } => write!(
                f,
                "Height inference degraded ({}); using default floor height {:.3}",
                reason, default_height
            ),
            Warning::UnmatchedOpening {
                opening,
                orientation,
                distance,
                deferred_to,
            } => {
                write!(f, "Opening {} matched no wall", opening)?;
                if let Some(orientation) = orientation {
                    write!(f, " on the {} façade", orientation)?;
                }
                if let Some(distance) = distance {
                    write!(f, " (closest {:.3} away)", distance)?;
                }
                match deferred_to {
                    DeferredTo::Wall { wall } => write!(f, "; deferred to wall {}", wall),
                    DeferredTo::Floor { floor } => write!(f, "; deferred to floor {}", floor),
                    DeferredTo::Model => write!(f, "; deferred to the model"),
                }
            }
            Warning::OpeningClamped { opening, wall } => {
                write!(f, "Opening {} clamped to the bounds of wall {}", opening, wall)
            }
            Warning::DegenerateFeature { feature, reason } => {
                write!(f, "Degenerate feature {}: {}", feature, reason)
            }
            Warning::RoofOutlineMissing { floor } => {
                write!(f, "No roof outline on topmost floor {}; roof omitted", floor)
            }
        }
    }
}
