//! Metadata
//! Where staff layout and meter change over the course of a document.
//!
//! Each `scoreDef` applies from the closest following measure until it's superseded. Rather than
//! chasing forward from every declaration we index the document once, in document order, and
//! record only the measures where something changes.

use crate::document::{self, MeiDocument};
use crate::error::{Error, Result};
use crate::selection::Completeness;
use lazy_static::lazy_static;
use regex::Regex;
use roxmltree::{Node, NodeId};
use serde_derive::Serialize;
use std::collections::{BTreeMap, HashMap};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Sparse record of staff and meter declarations, keyed by 1-based measure ordinal.
/// A key at m means the value is in effect from m until the next key.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ChangeMap {
    pub measure_labels: Vec<String>,
    pub staff_changes: BTreeMap<u32, Vec<String>>,
    pub beat_changes: BTreeMap<u32, u32>,
}

impl ChangeMap {
    pub fn measure_count(&self) -> u32 {
        self.measure_labels.len() as u32
    }

    pub fn measure_label(&self, measure: u32) -> &str {
        if measure == 0 {
            return "";
        }

        self.measure_labels
            .get(measure as usize - 1)
            .map(|label| label.as_str())
            .unwrap_or("")
    }

    /// Staff labels in effect at this measure. Empty if nothing has been declared yet.
    pub fn staves_at(&self, measure: u32) -> &[String] {
        self.staff_changes
            .range(..=measure)
            .next_back()
            .map(|(_, labels)| labels.as_slice())
            .unwrap_or(&[])
    }

    /// Beats per measure in effect at this measure, if any meter has been declared.
    pub fn beats_at(&self, measure: u32) -> Option<u32> {
        self.beat_changes
            .range(..=measure)
            .next_back()
            .map(|(_, beats)| *beats)
    }
}

/// Position of every node in document order, and which measure comes next from each position.
struct DocumentOrder<'a, 'input> {
    nodes: Vec<Node<'a, 'input>>,
    ordinals: HashMap<NodeId, u32>,

    // next_measure[p] is the ordinal of the first measure at or after position p.
    next_measure: Vec<Option<u32>>,
}

impl<'a, 'input> DocumentOrder<'a, 'input> {
    fn new(music: Node<'a, 'input>) -> DocumentOrder<'a, 'input> {
        let nodes: Vec<Node> = music.descendants().collect();

        let mut ordinals = HashMap::new();
        for node in nodes.iter().filter(|n| document::is_element(n, "measure")) {
            let ordinal = ordinals.len() as u32 + 1;
            ordinals.insert(node.id(), ordinal);
        }

        let mut next_measure = vec![None; nodes.len() + 1];
        for position in (0..nodes.len()).rev() {
            next_measure[position] = match ordinals.get(&nodes[position].id()) {
                Some(ordinal) => Some(*ordinal),
                None => next_measure[position + 1],
            };
        }

        DocumentOrder {
            nodes,
            ordinals,
            next_measure,
        }
    }

    /// The measure a declaration at this position applies to.
    /// The measure it sits in, if any, otherwise the first one after it and its subtree.
    fn target_measure(&self, position: usize) -> Result<u32> {
        let node = self.nodes[position];

        if let Some(enclosing) = node
            .ancestors()
            .skip(1)
            .find(|n| document::is_element(n, "measure"))
        {
            if let Some(ordinal) = self.ordinals.get(&enclosing.id()) {
                return Ok(*ordinal);
            }
        }

        let after = position + node.descendants().count();

        self.next_measure[after].ok_or_else(|| {
            Error::StructuralError(format!(
                "could not locate measure after score definition (scoreDef) {}",
                describe(node)
            ))
        })
    }
}

/// Something to identify a node by in messages.
fn describe(node: Node) -> String {
    match node.attribute(("http://www.w3.org/XML/1998/namespace", "id")) {
        Some(id) => format!("{:?}", id),
        None => format!("at byte {}", node.range().start),
    }
}

fn parse_count(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(Error::UnsupportedEncoding(format!(
            "meter count {:?} is not a whole number of beats",
            value
        ))),
    }
}

/// Beats per measure declared here, if the declaration says anything about meter.
fn meter_count(score_def: Node) -> Result<Option<u32>> {
    if let Some(count) = score_def.attribute("meter.count") {
        return parse_count(count).map(Some);
    }

    if document::descendants_named(score_def, "meterSigGrp")
        .next()
        .is_some()
    {
        return Err(Error::UnsupportedEncoding(
            "mixed meter is not supported".to_string(),
        ));
    }

    let signatures: Vec<Node> = document::descendants_named(score_def, "meterSig").collect();

    match signatures.len() {
        0 => Ok(None),
        1 => match signatures[0].attribute("count") {
            Some(count) => parse_count(count).map(Some),
            None => Err(Error::UnsupportedEncoding(
                "could not locate meter and compute beats".to_string(),
            )),
        },
        _ => Err(Error::UnsupportedEncoding(
            "mixed meter is not supported".to_string(),
        )),
    }
}

type LabelStrategy = fn(Node) -> Option<String>;

/// Tried in order, first answer wins.
const LABEL_STRATEGIES: [LabelStrategy; 3] =
    [label_attribute, label_element, abbreviated_label_attribute];

fn label_attribute(staff_def: Node) -> Option<String> {
    staff_def.attribute("label").map(String::from)
}

/// Text of `label` children, each text node whitespace-normalized, joined with a space.
/// Blank children still answer, with an empty label.
fn label_element(staff_def: Node) -> Option<String> {
    let children: Vec<Node> = document::children_named(staff_def, "label").collect();
    if children.is_empty() {
        return None;
    }

    let parts: Vec<String> = children
        .into_iter()
        .flat_map(|label| document::descendant_text(label))
        .filter(|text| !text.trim().is_empty())
        .map(|text| WHITESPACE.replace_all(text.trim(), " ").into_owned())
        .collect();

    Some(parts.join(" "))
}

fn abbreviated_label_attribute(staff_def: Node) -> Option<String> {
    staff_def.attribute("label.abbr").map(String::from)
}

pub fn staff_label(staff_def: Node) -> String {
    LABEL_STRATEGIES
        .iter()
        .filter_map(|strategy| strategy(staff_def))
        .next()
        .unwrap_or_default()
}

/// Staff labels declared here, if the declaration defines a staff group.
fn staff_labels(score_def: Node) -> Option<Vec<String>> {
    if document::children_named(score_def, "staffGrp")
        .next()
        .is_none()
    {
        return None;
    }

    Some(
        document::descendants_named(score_def, "staffDef")
            .map(staff_label)
            .collect(),
    )
}

/// Build the change map for a document in one pass over its declarations.
pub fn build(mei: &MeiDocument) -> Result<ChangeMap> {
    let music = mei.music()?;
    let order = DocumentOrder::new(music);

    let mut result = ChangeMap {
        measure_labels: mei.measure_labels()?,
        ..ChangeMap::default()
    };

    for (position, node) in order.nodes.iter().enumerate() {
        if !document::is_element(node, "scoreDef") {
            continue;
        }

        let target = order.target_measure(position)?;

        if let Some(count) = meter_count(*node)? {
            tracing::debug!("meter of {} beats from measure {}", count, target);
            if let Some(previous) = result.beat_changes.insert(target, count) {
                tracing::warn!(
                    "meter of {} beats at measure {} replaced by {}",
                    previous,
                    target,
                    count
                );
            }
        }

        if let Some(labels) = staff_labels(*node) {
            tracing::debug!("{} staves from measure {}", labels.len(), target);
            if result.staff_changes.insert(target, labels).is_some() {
                tracing::warn!("staff group at measure {} replaced", target);
            }
        }
    }

    Ok(result)
}

/// Summary of a document for clients working out what they can address.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct DocumentInfo {
    #[serde(rename = "measures")]
    pub measure_count: u32,

    pub measure_labels: Vec<String>,

    #[serde(rename = "staves")]
    pub staff_change_map: BTreeMap<u32, Vec<String>>,

    #[serde(rename = "beats")]
    pub beat_change_map: BTreeMap<u32, u32>,

    #[serde(rename = "completeness")]
    pub supported_completeness_values: Vec<Completeness>,
}

impl DocumentInfo {
    pub fn from_change_map(change_map: &ChangeMap) -> DocumentInfo {
        DocumentInfo {
            measure_count: change_map.measure_count(),
            measure_labels: change_map.measure_labels.clone(),
            staff_change_map: change_map.staff_changes.clone(),
            beat_change_map: change_map.beat_changes.clone(),
            supported_completeness_values: Completeness::ALL.to_vec(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
