// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// First rule violation found in a gbXML tree, located by XPath
    #[error("gbXML schema violation at {xpath}: {message}")]
    SchemaValidation { xpath: String, message: String },
}

impl Error {
    pub fn schema(xpath: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SchemaValidation {
            xpath: xpath.into(),
            message: message.into(),
        }
    }

    pub fn xpath(&self) -> &str {
        match self {
            Error::SchemaValidation { xpath, .. } => xpath,
        }
    }
}
