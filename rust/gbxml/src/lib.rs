// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! gbXML export for reconstructed buildings
//!
//! [`map_model`] turns a [`SolidModel`] into a typed [`GbXmlDocument`]:
//! storeys, one space per room, typed surfaces with adjacency and openings.
//! The document becomes an [`XmlElement`] tree, is checked by [`validate`]
//! and written by [`write_document`]. A schema violation never blocks the
//! export; it is returned next to the text.
//!
//! ```rust,ignore
//! use gbxml_lite_gbxml::{export, GbxmlConfig};
//!
//! let exported = export(&model, &GbxmlConfig::default());
//! std::fs::write("building_model.gbxml", &exported.xml)?;
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod mapper;
pub mod validate;
pub mod xml;

pub use config::{GbxmlConfig, Location, OutputUnit};
pub use document::{
    Building, BuildingStorey, Campus, GbXmlDocument, Opening, OpeningType, RectangularGeometry,
    Space, Surface, SurfaceType,
};
pub use error::{Error, Result};
pub use mapper::map_model;
pub use validate::validate;
pub use xml::{format_number, write_document, XmlElement};

use gbxml_lite_reconstruct::SolidModel;

/// A rendered gbXML document
#[derive(Debug, Clone)]
pub struct GbxmlExport {
    pub document: GbXmlDocument,
    pub xml: String,
    /// First schema rule the document breaks, if any
    pub violation: Option<Error>,
}

/// Map, validate and serialize a solid model.
pub fn export(model: &SolidModel, config: &GbxmlConfig) -> GbxmlExport {
    let document = map_model(model, config);
    let tree = document.to_xml();
    let violation = validate(&tree).err();
    if let Some(err) = &violation {
        tracing::warn!(error = %err, "gbXML document failed schema validation");
    }

    GbxmlExport {
        xml: write_document(&tree),
        document,
        violation,
    }
}
