//! Address Lexer
//! Scan one axis of an address into a `Selector`.
//! The grammar is regular so this is a single left-to-right pass with no backtracking. Scanning
//! stops at the first error and nothing partial is returned.

use crate::address::{Atom, Axis, Selector};
use crate::error::{Error, Result};

/// Context required to scan an address string.
/// Context object is immutable for simpler state and testing.
#[derive(Debug, PartialEq, Clone, Copy)]
struct Context<'a> {
    /// The address as a slice of chars so we can peek.
    c: &'a [char],

    // Length of string.
    l: usize,

    // The current index of the string during scanning.
    i: usize,

    axis: Axis,
}

impl<'a> Context<'a> {
    fn new(c: &'a [char], axis: Axis) -> Context<'a> {
        let l = c.len();

        Context { c, l, i: 0, axis }
    }

    /// Are there this many characters available?
    fn has(&self, chars: usize) -> bool {
        self.i + chars <= self.l
    }

    fn peek(&self) -> Option<char> {
        if self.has(1) {
            Some(self.c[self.i])
        } else {
            None
        }
    }

    /// Skip this many characters.
    fn skip(self, amount: usize) -> Context<'a> {
        let i = self.i + amount;
        Context { i, ..self }
    }

    /// Does the remaining input start with this keyword?
    fn starts_with(&self, word: &str) -> bool {
        let mut length = 0;
        for (offset, expected) in word.chars().enumerate() {
            if !self.has(offset + 1) || self.c[self.i + offset] != expected {
                return false;
            }
            length += 1;
        }

        length > 0
    }
}

/// Types of errors. As specific as possible so the message helps whoever typed the address.
#[derive(Debug, PartialEq)]
enum LexError {
    /// Nothing at all to scan.
    EmptyAddress,

    /// Each beats term must start with '@'.
    ExpectedBeatMarker,

    /// Expected a number, `start` or `end`.
    ExpectedAtom,

    /// A decimal point with no digits after it.
    ExpectedFraction,

    /// Decimals only make sense for beats.
    DecimalNotAllowed,

    /// `+` on staves, or on `all`.
    ExtensionNotAllowed,

    /// Doesn't fit in a u32.
    NumberTooLarge,

    /// A separator with nothing after it.
    TrailingSeparator,

    UnexpectedChar(char),
}

impl LexError {
    fn reason(&self) -> String {
        match self {
            &LexError::EmptyAddress => "address is empty".to_string(),
            &LexError::ExpectedBeatMarker => "expected '@' before beat term".to_string(),
            &LexError::ExpectedAtom => "expected a number, 'start' or 'end'".to_string(),
            &LexError::ExpectedFraction => "expected digits after decimal point".to_string(),
            &LexError::DecimalNotAllowed => "decimals are only allowed for beats".to_string(),
            &LexError::ExtensionNotAllowed => "'+' is not allowed here".to_string(),
            &LexError::NumberTooLarge => "number too large".to_string(),
            &LexError::TrailingSeparator => "trailing ','".to_string(),
            &LexError::UnexpectedChar(c) => format!("unexpected {:?}", c),
        }
    }
}

/// Either a new context and a value, or the context where things went wrong.
type LexResult<'a, T> = std::result::Result<(Context<'a>, T), (Context<'a>, LexError)>;

/// Read an unsigned integer or, where the axis allows, a decimal.
fn read_number(ctx: Context) -> LexResult<Atom> {
    let start = ctx.i;

    let whole_length = ctx.c[ctx.i..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();

    let ctx = ctx.skip(whole_length);

    if ctx.peek() == Some('.') {
        if !ctx.axis.allows_decimal() {
            return Err((Context { i: start, ..ctx }, LexError::DecimalNotAllowed));
        }

        let ctx = ctx.skip(1);
        let fraction_length = ctx.c[ctx.i..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();

        if fraction_length == 0 {
            return Err((ctx, LexError::ExpectedFraction));
        }

        let ctx = ctx.skip(fraction_length);
        let text: String = ctx.c[start..ctx.i].iter().collect();

        return match text.parse::<f64>() {
            Ok(value) => Ok((ctx, Atom::Decimal(value))),
            Err(_) => Err((Context { i: start, ..ctx }, LexError::ExpectedAtom)),
        };
    }

    let text: String = ctx.c[start..ctx.i].iter().collect();
    match text.parse::<u32>() {
        Ok(value) => Ok((ctx, Atom::Index(value))),
        Err(_) => Err((Context { i: start, ..ctx }, LexError::NumberTooLarge)),
    }
}

/// Read a single endpoint.
fn read_atom(ctx: Context) -> LexResult<Atom> {
    match ctx.peek() {
        Some(c) if c.is_ascii_digit() => read_number(ctx),
        Some(_) if ctx.starts_with("start") => Ok((ctx.skip(5), Atom::Start)),
        Some(_) if ctx.starts_with("end") => Ok((ctx.skip(3), Atom::End)),
        _ => Err((ctx, LexError::ExpectedAtom)),
    }
}

/// After a term we must be at a separator or the end.
fn expect_term_end<'a, T>(ctx: Context<'a>, value: T) -> LexResult<'a, T> {
    match ctx.peek() {
        None | Some(',') => Ok((ctx, value)),
        Some('+') => Err((ctx, LexError::ExtensionNotAllowed)),
        Some(c) => Err((ctx, LexError::UnexpectedChar(c))),
    }
}

/// Read one term: `all`, an atom, or a range, with an optional `+`.
fn read_term(ctx: Context) -> LexResult<Selector> {
    let ctx = if ctx.axis == Axis::Beats {
        match ctx.peek() {
            Some('@') => ctx.skip(1),
            _ => return Err((ctx, LexError::ExpectedBeatMarker)),
        }
    } else {
        ctx
    };

    if ctx.starts_with("all") {
        return expect_term_end(ctx.skip(3), Selector::All);
    }

    let (ctx, from) = read_atom(ctx)?;

    let (ctx, selector) = if ctx.peek() == Some('-') {
        let (ctx, to) = read_atom(ctx.skip(1))?;
        (ctx, Selector::range(from, to))
    } else {
        (ctx, Selector::single(from))
    };

    if ctx.peek() == Some('+') {
        if !ctx.axis.allows_extension() {
            return Err((ctx, LexError::ExtensionNotAllowed));
        }

        return expect_term_end(ctx.skip(1), selector.extended());
    }

    expect_term_end(ctx, selector)
}

/// Read a comma-separated list of terms.
fn read_address(ctx: Context) -> LexResult<Vec<Selector>> {
    if !ctx.has(1) {
        return Err((ctx, LexError::EmptyAddress));
    }

    let mut terms = vec![];
    let mut ctx = ctx;

    loop {
        let (new_ctx, term) = read_term(ctx)?;
        terms.push(term);
        ctx = new_ctx;

        match ctx.peek() {
            None => break,
            Some(',') => {
                ctx = ctx.skip(1);
                if !ctx.has(1) {
                    return Err((ctx, LexError::TrailingSeparator));
                }
            }
            Some(c) => return Err((ctx, LexError::UnexpectedChar(c))),
        }
    }

    Ok((ctx, terms))
}

/// The term around an error position, for the error message.
fn fragment(chars: &[char], at: usize) -> String {
    let at = usize::min(at, chars.len());

    let start = chars[..at]
        .iter()
        .rposition(|c| *c == ',')
        .map(|p| p + 1)
        .unwrap_or(0);

    let end = chars
        .iter()
        .enumerate()
        .skip(usize::max(at, start) + 1)
        .find(|&(_, c)| *c == ',')
        .map(|(p, _)| p)
        .unwrap_or(chars.len());

    let end = usize::max(end, start);
    let result: String = chars[start..end].iter().collect();

    if result.is_empty() {
        chars.iter().collect()
    } else {
        result
    }
}

/// Parse one axis of an address.
/// A single term comes back as that term, more than one as a `Selector::List`.
pub fn parse(axis: Axis, input: &str) -> Result<Selector> {
    let chars = input.chars().collect::<Vec<char>>();

    match read_address(Context::new(&chars, axis)) {
        Ok((_, mut terms)) => {
            if terms.len() == 1 {
                Ok(terms.remove(0))
            } else {
                Ok(Selector::List(terms))
            }
        }
        Err((ctx, error)) => Err(Error::malformed(
            axis.part(),
            &fragment(&chars, ctx.i),
            &error.reason(),
        )),
    }
}
