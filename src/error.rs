//! Errors
//! Everything that can go wrong between reading a document and producing a selection plan.
//! All of these are ordinary values scoped to one request.

use std::fmt;
use thiserror::Error;

/// Which part of an address an error refers to.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Part {
    Measures,
    Staves,
    Beats,
    Completeness,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Part::Measures => write!(f, "measures"),
            &Part::Staves => write!(f, "staves"),
            &Part::Beats => write!(f, "beats"),
            &Part::Completeness => write!(f, "completeness"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The address string doesn't match the grammar for its axis.
    #[error("malformed {part} address at {fragment:?}: {reason}")]
    MalformedAddress {
        part: Part,
        fragment: String,
        reason: String,
    },

    /// The address is well formed but refers to something the document doesn't have.
    #[error("{part} out of range: {detail}")]
    OutOfRange { part: Part, detail: String },

    /// The document's declarations can't be tied to the measures they apply to.
    #[error("structural error: {0}")]
    StructuralError(String),

    /// The document uses an encoding we don't handle, e.g. mixed meter.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The document isn't well-formed XML.
    #[error("can't read document: {0}")]
    Xml(#[from] roxmltree::Error),
}

impl Error {
    pub fn malformed(part: Part, fragment: &str, reason: &str) -> Error {
        Error::MalformedAddress {
            part,
            fragment: fragment.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn out_of_range(part: Part, detail: String) -> Error {
        Error::OutOfRange { part, detail }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
