//! MEI addressing.
//! Parse addresses naming measures, staves and beats, work out where staff layout and meter change
//! in an MEI document, and resolve one against the other into a plan of what to extract.

pub mod address;
pub mod address_lexer;
pub mod config;
pub mod document;
pub mod error;
pub mod metadata;
pub mod resolver;
pub mod selection;


pub use crate::address::{Atom, Axis, Selector};
pub use crate::document::MeiDocument;
pub use crate::error::{Error, Part, Result};
pub use crate::metadata::{ChangeMap, DocumentInfo};
pub use crate::selection::{
    BeatSpan, Completeness, SelectedMeasure, SelectedRun, SelectedStaff, SelectionPlan,
};

/// Where staff layout and meter change in this document.
pub fn build_metadata(document: &MeiDocument) -> Result<ChangeMap> {
    metadata::build(document)
}

/// Parse one axis of an address.
pub fn parse_address(axis: Axis, input: &str) -> Result<Selector> {
    address_lexer::parse(axis, input)
}

/// Resolve parsed selectors against a change map.
pub fn resolve(
    measures: &Selector,
    staves: &Selector,
    beats: &Selector,
    completeness: Completeness,
    change_map: &ChangeMap,
) -> Result<SelectionPlan> {
    resolver::resolve(measures, staves, beats, completeness, change_map)
}

/// What can be addressed in this document.
pub fn document_info(document: &MeiDocument) -> Result<DocumentInfo> {
    Ok(DocumentInfo::from_change_map(&build_metadata(document)?))
}

/// Everything from MEI text and address strings to a plan.
/// The address is checked before the document is read. No completeness means the default.
pub fn select(
    text: &str,
    measures: &str,
    staves: &str,
    beats: &str,
    completeness: Option<&str>,
) -> Result<SelectionPlan> {
    let measures = parse_address(Axis::Measures, measures)?;
    let staves = parse_address(Axis::Staves, staves)?;
    let beats = parse_address(Axis::Beats, beats)?;
    let completeness = match completeness {
        Some(value) => value.parse::<Completeness>()?,
        None => Completeness::default(),
    };

    let document = MeiDocument::parse(text)?;
    let change_map = build_metadata(&document)?;

    resolve(&measures, &staves, &beats, completeness, &change_map)
}
