//! Address
//! The parsed form of one axis of an address. `start` and `end` stay symbolic here: what they
//! mean depends on the document, so they're only given numbers by the resolver.

use crate::error::Part;
use std::fmt;

/// The three independent axes of an address.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Axis {
    Measures,
    Staves,
    Beats,
}

impl Axis {
    pub fn part(&self) -> Part {
        match self {
            &Axis::Measures => Part::Measures,
            &Axis::Staves => Part::Staves,
            &Axis::Beats => Part::Beats,
        }
    }

    /// Only beats can address a position inside a beat.
    pub fn allows_decimal(&self) -> bool {
        *self == Axis::Beats
    }

    /// Staves can't be extended with `+`.
    pub fn allows_extension(&self) -> bool {
        *self != Axis::Staves
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        match name {
            "measures" => Some(Axis::Measures),
            "staves" => Some(Axis::Staves),
            "beats" => Some(Axis::Beats),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.part())
    }
}

/// One endpoint of a selection.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Atom {
    Start,
    End,

    /// 1-based index: a measure ordinal, a staff number or a beat.
    Index(u32),

    /// A position inside a beat, e.g. 2.5. Beats only.
    Decimal(f64),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Atom::Start => write!(f, "start"),
            &Atom::End => write!(f, "end"),
            &Atom::Index(i) => write!(f, "{}", i),

            // Keep a decimal point on whole values so they read back as decimals.
            &Atom::Decimal(d) if d.fract() == 0.0 => write!(f, "{:.1}", d),
            &Atom::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// A selector term for one axis.
#[derive(Debug, PartialEq, Clone)]
pub enum Selector {
    All,

    Single { at: Atom, extended: bool },

    Range { from: Atom, to: Atom, extended: bool },

    /// Terms in the order given. Duplicates are kept.
    List(Vec<Selector>),
}

impl Selector {
    pub fn single(at: Atom) -> Selector {
        Selector::Single {
            at,
            extended: false,
        }
    }

    pub fn range(from: Atom, to: Atom) -> Selector {
        Selector::Range {
            from,
            to,
            extended: false,
        }
    }

    /// The same term with the `+` extension marker set.
    /// `All` and lists have nothing to extend and come back unchanged.
    pub fn extended(self) -> Selector {
        match self {
            Selector::Single { at, .. } => Selector::Single { at, extended: true },
            Selector::Range { from, to, .. } => Selector::Range {
                from,
                to,
                extended: true,
            },
            other => other,
        }
    }

    pub fn is_extended(&self) -> bool {
        match self {
            &Selector::Single { extended, .. } => extended,
            &Selector::Range { extended, .. } => extended,
            _ => false,
        }
    }

    /// Flatten into the sequence of non-list terms, in order.
    pub fn terms(&self) -> Vec<&Selector> {
        match self {
            &Selector::List(ref items) => items.iter().flat_map(|item| item.terms()).collect(),
            other => vec![other],
        }
    }

    /// Render in the address grammar of the given axis.
    pub fn to_address(&self, axis: Axis) -> String {
        let prefix = if axis == Axis::Beats { "@" } else { "" };

        self.terms()
            .iter()
            .map(|term| {
                let body = match term {
                    &&Selector::All => "all".to_string(),
                    &&Selector::Single { at, .. } => at.to_string(),
                    &&Selector::Range { from, to, .. } => format!("{}-{}", from, to),
                    &&Selector::List(_) => String::new(),
                };

                let suffix = if term.is_extended() { "+" } else { "" };

                format!("{}{}{}", prefix, body, suffix)
            })
            .collect::<Vec<String>>()
            .join(",")
    }
}
