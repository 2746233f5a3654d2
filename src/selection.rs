//! Selection
//! The resolved, concrete description of what to extract. This is all the extraction step gets.

use crate::error::{Error, Part, Result};
use serde_derive::Serialize;
use std::fmt;
use std::str::FromStr;

/// How boundary material is kept when the selection is cut out of the document.
#[derive(Debug, PartialEq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Completeness {
    Raw,
    Signature,
    Nospace,
    Cut,
}

impl Completeness {
    pub const ALL: [Completeness; 4] = [
        Completeness::Raw,
        Completeness::Signature,
        Completeness::Nospace,
        Completeness::Cut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            &Completeness::Raw => "raw",
            &Completeness::Signature => "signature",
            &Completeness::Nospace => "nospace",
            &Completeness::Cut => "cut",
        }
    }
}

impl Default for Completeness {
    fn default() -> Completeness {
        Completeness::Raw
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Completeness {
    type Err = Error;

    fn from_str(value: &str) -> Result<Completeness> {
        Completeness::ALL
            .iter()
            .find(|c| c.as_str() == value)
            .cloned()
            .ok_or_else(|| {
                Error::malformed(
                    Part::Completeness,
                    value,
                    "expected one of raw, signature, nospace, cut",
                )
            })
    }
}

/// Which beats of a measure are selected.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatSpan {
    /// The whole measure.
    Whole,

    /// From `start` to `end`, both 1-based and possibly fractional.
    /// No `end` means through to the end of the measure's meter.
    Partial { start: f64, end: Option<f64> },
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SelectedStaff {
    /// 1-based position in the staff group in effect.
    pub index: u32,
    pub label: String,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SelectedMeasure {
    /// 1-based ordinal in document order.
    pub index: u32,
    pub label: String,
    pub staves: Vec<SelectedStaff>,
    pub beats: BeatSpan,
}

/// The measures from one measures term, in order.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SelectedRun {
    pub measures: Vec<SelectedMeasure>,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SelectionPlan {
    pub runs: Vec<SelectedRun>,
    pub completeness: Completeness,
}

impl SelectionPlan {
    /// Every selected measure ordinal, run by run.
    pub fn measure_indices(&self) -> Vec<u32> {
        self.runs
            .iter()
            .flat_map(|run| run.measures.iter().map(|m| m.index))
            .collect()
    }

    pub fn measure(&self, index: u32) -> Option<&SelectedMeasure> {
        self.runs
            .iter()
            .flat_map(|run| run.measures.iter())
            .find(|m| m.index == index)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
