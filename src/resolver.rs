//! Resolver
//! Combine parsed selectors with a document's change map to produce a selection plan.
//!
//! Each measures term becomes one run. Beats only constrain the first and last measure of a run,
//! everything in between is taken whole. Beats terms pair up with measures terms by position; a
//! single beats term applies to every run.

use crate::address::{Atom, Axis, Selector};
use crate::error::{Error, Part, Result};
use crate::metadata::ChangeMap;
use crate::selection::{
    BeatSpan, Completeness, SelectedMeasure, SelectedRun, SelectedStaff, SelectionPlan,
};

fn nested_list(axis: Axis, term: &Selector) -> Error {
    Error::malformed(axis.part(), &term.to_address(axis), "nested list")
}

/// Resolve a 1-based index atom against the number of things available.
/// `what` names the thing for messages, e.g. "measure".
fn index_atom(part: Part, atom: Atom, count: u32, what: &str) -> Result<u32> {
    let index = match atom {
        Atom::Start => 1,
        Atom::End => count,
        Atom::Index(index) => index,
        Atom::Decimal(_) => {
            return Err(Error::malformed(
                part,
                &atom.to_string(),
                "decimals are only allowed for beats",
            ))
        }
    };

    if index < 1 || index > count {
        return Err(Error::out_of_range(
            part,
            format!("{} {} requested but there are {}", what, atom, count),
        ));
    }

    Ok(index)
}

fn ordered(part: Part, from: u32, to: u32, what: &str) -> Result<(u32, u32)> {
    if from > to {
        Err(Error::out_of_range(
            part,
            format!("{} range {}-{} runs backwards", what, from, to),
        ))
    } else {
        Ok((from, to))
    }
}

/// First and last measure of a measures term. None when there's nothing to select.
fn measure_bounds(term: &Selector, count: u32) -> Result<Option<(u32, u32)>> {
    let part = Part::Measures;

    match term {
        &Selector::All => {
            if count == 0 {
                Ok(None)
            } else {
                Ok(Some((1, count)))
            }
        }

        // An extended single measure carries on to the end of the document.
        &Selector::Single { at, extended } => {
            let first = index_atom(part, at, count, "measure")?;
            let last = if extended { count } else { first };
            Ok(Some((first, last)))
        }

        &Selector::Range { from, to, .. } => {
            let from = index_atom(part, from, count, "measure")?;
            let to = index_atom(part, to, count, "measure")?;
            ordered(part, from, to, "measure").map(Some)
        }

        &Selector::List(_) => Err(nested_list(Axis::Measures, term)),
    }
}

fn beat_position(atom: Atom, meter: u32, measure: u32) -> Result<f64> {
    let position = match atom {
        Atom::Start => 1.0,
        Atom::End => meter as f64,
        Atom::Index(index) => index as f64,
        Atom::Decimal(value) => value,
    };

    // A position anywhere inside the last beat is fine.
    if !position.is_finite() || position < 1.0 || position >= meter as f64 + 1.0 {
        return Err(Error::out_of_range(
            Part::Beats,
            format!(
                "beat {} requested at measure {} which has {} beats",
                atom, measure, meter
            ),
        ));
    }

    Ok(position)
}

/// Beats selected at a boundary measure. With `open_end` the span runs to the end of the meter.
fn beat_span(
    term: &Selector,
    measure: u32,
    open_end: bool,
    change_map: &ChangeMap,
) -> Result<BeatSpan> {
    let (from, to) = match term {
        &Selector::All => return Ok(BeatSpan::Whole),
        &Selector::Single { at, .. } => (at, at),
        &Selector::Range { from, to, .. } => (from, to),
        &Selector::List(_) => return Err(nested_list(Axis::Beats, term)),
    };

    let meter = change_map.beats_at(measure).ok_or_else(|| {
        Error::out_of_range(
            Part::Beats,
            format!("no meter is in effect at measure {}", measure),
        )
    })?;

    let start = beat_position(from, meter, measure)?;
    let end = beat_position(to, meter, measure)?;

    if end < start {
        return Err(Error::out_of_range(
            Part::Beats,
            format!(
                "beat range {}-{} runs backwards at measure {}",
                from, to, measure
            ),
        ));
    }

    let end = if open_end { None } else { Some(end) };

    if start <= 1.0 && end.map_or(true, |end| end >= meter as f64) {
        Ok(BeatSpan::Whole)
    } else {
        Ok(BeatSpan::Partial { start, end })
    }
}

/// Staves selected at one measure, in the order asked for, repeats included.
fn resolve_staves(
    term: &Selector,
    labels: &[String],
    measure: u32,
) -> Result<Vec<SelectedStaff>> {
    let part = Part::Staves;
    let count = labels.len() as u32;
    let what = format!("staff at measure {}:", measure);

    let staff = |index: u32| SelectedStaff {
        index,
        label: labels[index as usize - 1].clone(),
    };

    let mut result = vec![];

    for item in term.terms() {
        match item {
            &Selector::All => result.extend((1..=count).map(staff)),

            &Selector::Single { extended: true, .. } | &Selector::Range { extended: true, .. } => {
                return Err(Error::malformed(
                    part,
                    &item.to_address(Axis::Staves),
                    "'+' is not allowed here",
                ))
            }

            &Selector::Single { at, .. } => {
                result.push(staff(index_atom(part, at, count, &what)?));
            }

            &Selector::Range { from, to, .. } => {
                let from = index_atom(part, from, count, &what)?;
                let to = index_atom(part, to, count, &what)?;
                let (from, to) = ordered(part, from, to, &what)?;
                result.extend((from..=to).map(staff));
            }

            &Selector::List(_) => return Err(nested_list(Axis::Staves, item)),
        }
    }

    Ok(result)
}

fn resolve_run(
    measure_term: &Selector,
    beat_term: &Selector,
    staves: &Selector,
    change_map: &ChangeMap,
) -> Result<SelectedRun> {
    let (first, last) = match measure_bounds(measure_term, change_map.measure_count())? {
        Some(bounds) => bounds,
        None => return Ok(SelectedRun { measures: vec![] }),
    };

    // `k+` opens the first measure and runs on whole to the end of the document.
    // `a-b+` opens the last measure instead.
    let (single_extended, range_extended) = match measure_term {
        &Selector::Single { extended, .. } => (extended, false),
        &Selector::Range { extended, .. } => (false, extended),
        _ => (false, false),
    };
    let beats_extended = beat_term.is_extended();

    let mut measures = Vec::with_capacity((last - first + 1) as usize);

    for index in first..=last {
        let beats = if index == first {
            let open_end = beats_extended || single_extended || (range_extended && first == last);
            beat_span(beat_term, index, open_end, change_map)?
        } else if index == last && !single_extended {
            beat_span(beat_term, index, beats_extended || range_extended, change_map)?
        } else {
            BeatSpan::Whole
        };

        measures.push(SelectedMeasure {
            index,
            label: change_map.measure_label(index).to_string(),
            staves: resolve_staves(staves, change_map.staves_at(index), index)?,
            beats,
        });
    }

    Ok(SelectedRun { measures })
}

/// Resolve measures, staves and beats selectors into a selection plan.
/// Nothing is mutated; the same change map can serve any number of resolutions at once.
pub fn resolve(
    measures: &Selector,
    staves: &Selector,
    beats: &Selector,
    completeness: Completeness,
    change_map: &ChangeMap,
) -> Result<SelectionPlan> {
    let measure_terms = measures.terms();
    let beat_terms = beats.terms();

    let beat_terms = if beat_terms.len() == measure_terms.len() {
        beat_terms
    } else if beat_terms.len() == 1 {
        vec![beat_terms[0]; measure_terms.len()]
    } else {
        return Err(Error::malformed(
            Part::Beats,
            &beats.to_address(Axis::Beats),
            &format!(
                "{} beat terms for {} measure terms",
                beat_terms.len(),
                measure_terms.len()
            ),
        ));
    };

    let mut runs = Vec::with_capacity(measure_terms.len());
    for (measure_term, beat_term) in measure_terms.iter().zip(beat_terms.iter()) {
        runs.push(resolve_run(measure_term, beat_term, staves, change_map)?);
    }

    tracing::debug!(
        "resolved {} runs, {} measures",
        runs.len(),
        runs.iter().map(|run| run.measures.len()).sum::<usize>()
    );

    Ok(SelectionPlan { runs, completeness })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_lexer::parse;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    /// Ten measures, four beats, two staves, from the start.
    fn quartet() -> ChangeMap {
        let mut change_map = ChangeMap::default();
        change_map.measure_labels = (1..=10).map(|n| n.to_string()).collect();
        change_map.beat_changes.insert(1, 4);
        change_map
            .staff_changes
            .insert(1, labels(&["Violin", "Viola"]));
        change_map
    }

    /// Ten measures with nothing declared.
    fn bare() -> ChangeMap {
        let mut change_map = ChangeMap::default();
        change_map.measure_labels = vec![String::new(); 10];
        change_map
    }

    fn address(
        measures: &str,
        staves: &str,
        beats: &str,
        change_map: &ChangeMap,
    ) -> Result<SelectionPlan> {
        resolve(
            &parse(Axis::Measures, measures)?,
            &parse(Axis::Staves, staves)?,
            &parse(Axis::Beats, beats)?,
            Completeness::default(),
            change_map,
        )
    }

    fn out_of_range(result: Result<SelectionPlan>, expected: Part) {
        match result {
            Err(Error::OutOfRange { part, .. }) => assert_eq!(part, expected),
            other => assert!(false, "Expected {} out of range, got {:?}", expected, other),
        }
    }

    #[test]
    fn single_measure_selects_only_itself() {
        let change_map = quartet();

        for k in 1..=10 {
            let plan = address(&k.to_string(), "all", "@all", &change_map).unwrap();
            assert_eq!(plan.measure_indices(), vec![k]);
        }
    }

    #[test]
    fn measures_outside_document() {
        let change_map = quartet();

        out_of_range(address("0", "all", "@all", &change_map), Part::Measures);
        out_of_range(address("11", "all", "@all", &change_map), Part::Measures);
        out_of_range(address("5-3", "all", "@all", &change_map), Part::Measures);
        out_of_range(address("end-start", "all", "@all", &change_map), Part::Measures);
    }

    #[test]
    fn symbolic_measures() {
        let change_map = quartet();

        let plan = address("start-3,end", "all", "@all", &change_map).unwrap();
        assert_eq!(plan.measure_indices(), vec![1, 2, 3, 10]);
        assert_eq!(plan.runs.len(), 2);

        let plan = address("all", "1", "@all", &change_map).unwrap();
        assert_eq!(plan.measure_indices(), (1..=10).collect::<Vec<u32>>());
    }

    #[test]
    fn repeated_measures_are_kept() {
        let plan = address("2,2", "all", "@all", &quartet()).unwrap();
        assert_eq!(plan.measure_indices(), vec![2, 2]);
    }

    #[test]
    fn nothing_declared() {
        let change_map = bare();

        let plan = address("2-4", "all", "@all", &change_map).unwrap();
        assert_eq!(plan.measure_indices(), vec![2, 3, 4]);
        for measure in plan.runs[0].measures.iter() {
            assert!(measure.staves.is_empty());
            assert_eq!(measure.beats, BeatSpan::Whole);
        }

        out_of_range(address("2-4", "1", "@all", &change_map), Part::Staves);
        out_of_range(address("2-4", "all", "@1-2", &change_map), Part::Beats);
    }

    #[test]
    fn staves_in_requested_order() {
        let change_map = quartet();

        let plan = address("1", "2,1,1", "@all", &change_map).unwrap();
        let staves: Vec<(u32, &str)> = plan.runs[0].measures[0]
            .staves
            .iter()
            .map(|s| (s.index, s.label.as_str()))
            .collect();
        assert_eq!(staves, vec![(2, "Viola"), (1, "Violin"), (1, "Violin")]);

        let plan = address("1", "start-end", "@all", &change_map).unwrap();
        assert_eq!(plan.runs[0].measures[0].staves.len(), 2);

        out_of_range(address("1", "3", "@all", &change_map), Part::Staves);
        out_of_range(address("1", "2-1", "@all", &change_map), Part::Staves);
    }

    #[test]
    fn staves_follow_changes() {
        let mut change_map = quartet();
        change_map
            .staff_changes
            .insert(4, labels(&["Violin", "Viola", "Cello"]));

        let plan = address("3-4", "end", "@all", &change_map).unwrap();
        assert_eq!(plan.measure(3).unwrap().staves[0].label, "Viola");
        assert_eq!(plan.measure(4).unwrap().staves[0].label, "Cello");

        out_of_range(address("3-4", "3", "@all", &change_map), Part::Staves);
    }

    #[test]
    fn extended_staves_are_rejected() {
        let staves = Selector::single(Atom::Index(1)).extended();
        let result = resolve(
            &Selector::single(Atom::Index(1)),
            &staves,
            &Selector::All,
            Completeness::Raw,
            &quartet(),
        );

        match result {
            Err(Error::MalformedAddress { part, .. }) => assert_eq!(part, Part::Staves),
            other => assert!(false, "Unexpected {:?}", other),
        }
    }

    #[test]
    fn beats_at_boundaries() {
        let change_map = quartet();

        let plan = address("2-4", "all", "@2-3", &change_map).unwrap();
        let partial = BeatSpan::Partial {
            start: 2.0,
            end: Some(3.0),
        };
        assert_eq!(plan.measure(2).unwrap().beats, partial);
        assert_eq!(plan.measure(3).unwrap().beats, BeatSpan::Whole);
        assert_eq!(plan.measure(4).unwrap().beats, partial);

        let plan = address("2", "all", "@1.5-2.75", &change_map).unwrap();
        assert_eq!(
            plan.measure(2).unwrap().beats,
            BeatSpan::Partial {
                start: 1.5,
                end: Some(2.75)
            }
        );

        let plan = address("2", "all", "@start-end", &change_map).unwrap();
        assert_eq!(plan.measure(2).unwrap().beats, BeatSpan::Whole);

        let plan = address("2", "all", "@4.5", &change_map).unwrap();
        assert_eq!(
            plan.measure(2).unwrap().beats,
            BeatSpan::Partial {
                start: 4.5,
                end: Some(4.5)
            },
            "Anywhere inside the last beat is allowed."
        );
    }

    #[test]
    fn beats_outside_meter() {
        let change_map = quartet();

        out_of_range(address("2", "all", "@5", &change_map), Part::Beats);
        out_of_range(address("2", "all", "@0-2", &change_map), Part::Beats);
        out_of_range(address("2", "all", "@3-2", &change_map), Part::Beats);
        out_of_range(address("2", "all", "@1-5+", &change_map), Part::Beats);
        out_of_range(address("2", "all", "@3-2+", &change_map), Part::Beats);
        out_of_range(address("2-3+", "all", "@3-2", &change_map), Part::Beats);

        let not_a_beat = Selector::single(Atom::Decimal(f64::NAN));
        let measures = parse(Axis::Measures, "2").unwrap();
        out_of_range(
            resolve(
                &measures,
                &Selector::All,
                &not_a_beat,
                Completeness::Raw,
                &change_map,
            ),
            Part::Beats,
        );
    }

    #[test]
    fn beat_extension() {
        let change_map = quartet();

        let plan = address("2-3", "all", "@2+", &change_map).unwrap();
        let open = BeatSpan::Partial {
            start: 2.0,
            end: None,
        };
        assert_eq!(plan.measure(2).unwrap().beats, open);
        assert_eq!(plan.measure(3).unwrap().beats, open);

        let plan = address("2", "all", "@1+", &change_map).unwrap();
        assert_eq!(plan.measure(2).unwrap().beats, BeatSpan::Whole);
    }

    #[test]
    fn measure_extension() {
        let change_map = quartet();

        let plan = address("4+", "all", "@2+", &change_map).unwrap();
        assert_eq!(plan.measure_indices(), (4..=10).collect::<Vec<u32>>());
        assert_eq!(
            plan.measure(4).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: None
            }
        );
        for index in 5..=10 {
            assert_eq!(plan.measure(index).unwrap().beats, BeatSpan::Whole);
        }

        // An extended range keeps its measures and carries on from its start beat in the last one.
        let plan = address("2-3+", "all", "@2-3", &change_map).unwrap();
        assert_eq!(plan.measure_indices(), vec![2, 3]);
        assert_eq!(
            plan.measure(2).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: Some(3.0)
            }
        );
        assert_eq!(
            plan.measure(3).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: None
            }
        );

        let plan = address("2-5+", "all", "@2-3", &change_map).unwrap();
        assert_eq!(plan.measure(4).unwrap().beats, BeatSpan::Whole);
        assert_eq!(
            plan.measure(5).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: None
            }
        );

        let plan = address("3-3+", "all", "@2-3", &change_map).unwrap();
        assert_eq!(
            plan.measure(3).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: None
            }
        );
    }

    #[test]
    fn beat_terms_pair_with_measure_terms() {
        let change_map = quartet();

        let plan = address("1,3", "all", "@2,@3", &change_map).unwrap();
        assert_eq!(
            plan.measure(1).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: Some(2.0)
            }
        );
        assert_eq!(
            plan.measure(3).unwrap().beats,
            BeatSpan::Partial {
                start: 3.0,
                end: Some(3.0)
            }
        );

        let plan = address("1,3,5", "all", "@2", &change_map).unwrap();
        assert_eq!(plan.measure_indices(), vec![1, 3, 5]);
        assert_eq!(plan.measure(5).unwrap().beats, plan.measure(1).unwrap().beats);

        match address("1,3,5", "all", "@2,@3", &change_map) {
            Err(Error::MalformedAddress { part, .. }) => assert_eq!(part, Part::Beats),
            other => assert!(false, "Unexpected {:?}", other),
        }
    }

    #[test]
    fn meter_changes_apply_per_boundary() {
        let mut change_map = quartet();
        change_map.beat_changes.insert(6, 3);

        out_of_range(address("5-7", "all", "@1-4", &change_map), Part::Beats);

        let plan = address("5-7", "all", "@2-end", &change_map).unwrap();
        assert_eq!(
            plan.measure(5).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: Some(4.0)
            }
        );
        assert_eq!(
            plan.measure(7).unwrap().beats,
            BeatSpan::Partial {
                start: 2.0,
                end: Some(3.0)
            }
        );
    }

    #[test]
    fn completeness_passes_through() {
        let change_map = quartet();
        let plan = resolve(
            &Selector::All,
            &Selector::All,
            &Selector::All,
            Completeness::Signature,
            &change_map,
        )
        .unwrap();

        assert_eq!(plan.completeness, Completeness::Signature);
    }

    #[test]
    fn empty_document() {
        let change_map = ChangeMap::default();

        let plan = address("all", "all", "@all", &change_map).unwrap();
        assert!(plan.measure_indices().is_empty());

        out_of_range(address("1", "all", "@all", &change_map), Part::Measures);
    }
}
