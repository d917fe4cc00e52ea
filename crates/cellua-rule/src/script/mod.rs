//! Sandboxed rule scripts.
//!
//! A script is a header of `key: value` lines followed by a
//! `transition:` section holding one expression:
//!
//! ```text
//! name: life
//! states: 1          // state width in bits
//! range: 1
//! metric: moore      // or vonneumann
//! symmetry: none     // reflect | permute | rotate | full
//! aware: false       // true unlocks pos[i] and gen
//! budget: 10000      // fuel per cell
//! transition:
//!   let n = live;
//!   if state != 0 then n == 2 || n == 3 else n == 3
//! ```
//!
//! An optional `mask: (1, 0) (-1, 0) ...` line replaces the range-derived
//! neighborhood with explicit offsets.
//!
//! The language has integers, arithmetic, comparisons, `if`/`then`/`else`
//! and `let` bindings, and nothing else: no assignment, loops, I/O, clock
//! or randomness, so every script is a pure function of its inputs.
//! Available inputs are `state`, `live` (live-neighbor count), `size`
//! (neighbor count), `nb[i]`, and for aware scripts `pos[i]` and `gen`;
//! functions are `count(v)`, `sum()`, `min(a, b)`, `max(a, b)`, `abs(a)`
//! and `bit(x, i)`.
//!
//! Arithmetic is checked; overflow, division by zero, out-of-range
//! indexing and negative results fail the cell with
//! [`RuleError::ExecutionFailed`], and running out of fuel fails it with
//! [`RuleError::ResourceLimit`].

mod error;
mod eval;
mod lexer;
mod parser;

use std::collections::HashSet;

use cellua_core::{CellState, Coord, RuleError, StateCodec};
use cellua_space::{Metric, NeighborhoodShape, SymmetryGroup};
use lazy_static::lazy_static;
use regex::Regex;

pub use error::{ScriptError, Span};

use crate::rule::{Awareness, CellContext, Rule};
use parser::Program;

/// Fuel available per cell unless the script sets `budget`.
pub const DEFAULT_BUDGET: u64 = 10_000;

lazy_static! {
    /// One parenthesized offset in a `mask:` value.
    static ref OFFSET_PATTERN: Regex = Regex::new(r"\(([^()]*)\)").unwrap();
}

/// A rule defined by a script.
///
/// # Examples
///
/// ```
/// use cellua_rule::{CellContext, Rule, ScriptRule};
///
/// let rule = ScriptRule::parse(
///     "name: increment\nstates: 6\nrange: 0\ntransition:\n(state + 1) % 64\n",
/// )
/// .unwrap();
/// assert_eq!(rule.state_bits(), 6);
/// assert_eq!(rule.apply(&CellContext::new(63, &[])).unwrap(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct ScriptRule {
    name: String,
    source: String,
    shape: NeighborhoodShape,
    state_bits: u8,
    awareness: Awareness,
    budget: u64,
    program: Program,
}

impl ScriptRule {
    /// Parse and check a script.
    ///
    /// Everything that can be checked statically is: header values, the
    /// transition's syntax, every name it uses, function arities, and use
    /// of `pos`/`gen` without `aware: true`. The shape itself is validated
    /// against the universe when the rule is loaded.
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut header = Header::default();
        let mut seen = HashSet::new();
        let mut offset = 0;
        let mut transition = None;

        for (idx, raw) in source.split_inclusive('\n').enumerate() {
            let line_no = idx + 1;
            let start = offset;
            offset += raw.len();
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            let header_err = |reason: String| ScriptError::Header {
                line: line_no,
                reason,
            };
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| header_err(format!("expected `key: value`, found {line:?}")))?;
            let key = key.trim();
            if key == "transition" {
                let colon = raw.find(':').unwrap_or(0) + 1;
                transition = Some(start + colon);
                break;
            }
            if !seen.insert(key.to_string()) {
                return Err(header_err(format!("`{key}` given twice")));
            }
            header.set(key, value.trim()).map_err(header_err)?;
        }

        let body_start = transition.ok_or(ScriptError::MissingTransition)?;
        let program =
            parser::parse_transition(&source[body_start..], body_start, header.aware)?;

        let shape = NeighborhoodShape {
            range: header.range,
            metric: header.metric,
            mask: header.mask,
            symmetry: header.symmetry,
        };
        Ok(Self {
            name: header.name,
            source: source.to_string(),
            shape,
            state_bits: header.states,
            awareness: if header.aware {
                Awareness::PositionTime
            } else {
                Awareness::Stateless
            },
            budget: header.budget,
            program,
        })
    }

    /// Fuel available per cell.
    pub fn budget(&self) -> u64 {
        self.budget
    }
}

impl Rule for ScriptRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> &NeighborhoodShape {
        &self.shape
    }

    fn state_bits(&self) -> u8 {
        self.state_bits
    }

    fn awareness(&self) -> Awareness {
        self.awareness
    }

    fn source(&self) -> Option<&str> {
        Some(&self.source)
    }

    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
        eval::run(&self.program, ctx, self.budget)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(i) => &line[..i],
        None => line,
    }
}

struct Header {
    name: String,
    states: u8,
    range: u32,
    metric: Metric,
    symmetry: SymmetryGroup,
    aware: bool,
    mask: Option<Vec<Coord>>,
    budget: u64,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            name: "script".into(),
            states: 1,
            range: 1,
            metric: Metric::Chebyshev,
            symmetry: SymmetryGroup::None,
            aware: false,
            mask: None,
            budget: DEFAULT_BUDGET,
        }
    }
}

impl Header {
    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "name" if !value.is_empty() => self.name = value.to_string(),
            "name" => return Err("`name` must not be empty".into()),
            "states" => {
                self.states = value
                    .parse::<u8>()
                    .ok()
                    .filter(|&b| StateCodec::new(b).is_some())
                    .ok_or_else(|| format!("`states` must be a bit width in 1..=64, got {value:?}"))?;
            }
            "range" => {
                self.range = value
                    .parse()
                    .map_err(|_| format!("`range` must be a non-negative integer, got {value:?}"))?;
            }
            "metric" => {
                self.metric = Metric::from_name(value)
                    .ok_or_else(|| format!("unknown metric {value:?}"))?;
            }
            "symmetry" => {
                self.symmetry = SymmetryGroup::from_name(value)
                    .ok_or_else(|| format!("unknown symmetry {value:?}"))?;
            }
            "aware" => {
                self.aware = match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(format!("`aware` must be true or false, got {value:?}")),
                };
            }
            "budget" => {
                self.budget = value
                    .parse::<u64>()
                    .ok()
                    .filter(|&b| b > 0)
                    .ok_or_else(|| format!("`budget` must be a positive integer, got {value:?}"))?;
            }
            "mask" => self.mask = Some(parse_mask(value)?),
            _ => return Err(format!("unknown key `{key}`")),
        }
        Ok(())
    }
}

fn parse_mask(value: &str) -> Result<Vec<Coord>, String> {
    let leftover = OFFSET_PATTERN.replace_all(value, "");
    if leftover.chars().any(|c| !c.is_whitespace() && c != ',') {
        return Err(format!("`mask` must be a list of `(x, y, ...)` offsets, got {value:?}"));
    }
    let mut offsets: Vec<Coord> = Vec::new();
    for caps in OFFSET_PATTERN.captures_iter(value) {
        let offset = caps[1]
            .split(',')
            .map(|t| t.trim().parse::<i64>())
            .collect::<Result<Coord, _>>()
            .map_err(|_| format!("bad offset ({})", &caps[1]))?;
        if offsets.first().is_some_and(|first| first.len() != offset.len()) {
            return Err("mask offsets must all have the same number of axes".into());
        }
        offsets.push(offset);
    }
    if offsets.is_empty() {
        return Err("`mask` must list at least one offset".into());
    }
    Ok(offsets)
}
