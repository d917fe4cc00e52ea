//! Life-like birth/survival rules in any dimension.

use std::fmt;

use cellua_core::{CellState, RuleError};
use cellua_space::{Metric, NeighborhoodShape};
use lazy_static::lazy_static;
use regex::Regex;

use crate::rule::{CellContext, Rule};

lazy_static! {
    /// `B<counts>/S<counts>`, optionally followed by `/R<range>` and
    /// `/N<M|V>` (Moore or von Neumann).
    static ref RULESTRING_PATTERN: Regex =
        Regex::new(r"^[Bb]([0-9,]*)/[Ss]([0-9,]*)(?:/[Rr]([0-9]+))?(?:/[Nn]([MmVv]))?$").unwrap();
}

/// A malformed rulestring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulestringError {
    /// The rejected input.
    pub input: String,
    /// What went wrong.
    pub reason: String,
}

impl fmt::Display for RulestringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rulestring {:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for RulestringError {}

/// A two-state outer-totalistic rule.
///
/// A quiescent cell becomes live when its live-neighbor count is in the
/// birth set; a live cell stays live when its count is in the survival
/// set. Works for any dimension count and range.
///
/// Counts are written as digits (`B3/S23`) or, when any count exceeds 9,
/// as comma lists (`B5,6/S4,5,6,10`). Birth on zero neighbors (`B0`) is
/// rejected: empty space always stays empty.
///
/// # Examples
///
/// ```
/// use cellua_rule::{CellContext, Rule, TotalisticRule};
///
/// let life = TotalisticRule::parse("B3/S23").unwrap();
/// assert_eq!(life.to_string(), "B3/S23");
/// let three = [1, 1, 1, 0, 0, 0, 0, 0];
/// assert_eq!(life.apply(&CellContext::new(0, &three)).unwrap(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TotalisticRule {
    name: String,
    birth: Vec<usize>,
    survival: Vec<usize>,
    shape: NeighborhoodShape,
}

impl TotalisticRule {
    /// Conway's Game of Life.
    pub fn life() -> Self {
        Self::new(vec![3], vec![2, 3], NeighborhoodShape::moore(1))
            .unwrap_or_else(|_| unreachable!("B3/S23 is valid"))
    }

    /// Build from explicit count sets.
    pub fn new(
        birth: Vec<usize>,
        survival: Vec<usize>,
        shape: NeighborhoodShape,
    ) -> Result<Self, RulestringError> {
        let mut birth = birth;
        let mut survival = survival;
        birth.sort_unstable();
        birth.dedup();
        survival.sort_unstable();
        survival.dedup();
        let mut rule = Self {
            name: String::new(),
            birth,
            survival,
            shape,
        };
        rule.name = rule.to_string();
        if rule.birth.first() == Some(&0) {
            return Err(RulestringError {
                input: rule.name,
                reason: "birth on zero live neighbors is not supported".into(),
            });
        }
        Ok(rule)
    }

    /// Parse a rulestring such as `B3/S23` or `B5,6/S4,5/R2/NV`.
    pub fn parse(s: &str) -> Result<Self, RulestringError> {
        let err = |reason: &str| RulestringError {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let captures = RULESTRING_PATTERN
            .captures(s.trim())
            .ok_or_else(|| err("expected B<counts>/S<counts>[/R<range>][/N<M|V>]"))?;

        let counts = |text: &str| -> Result<Vec<usize>, RulestringError> {
            if text.contains(',') {
                text.split(',')
                    .filter(|t| !t.is_empty())
                    .map(|t| t.parse::<usize>().map_err(|_| err("count out of range")))
                    .collect()
            } else {
                Ok(text
                    .chars()
                    .filter_map(|c| c.to_digit(10))
                    .map(|d| d as usize)
                    .collect())
            }
        };
        let birth = counts(&captures[1])?;
        let survival = counts(&captures[2])?;
        let range = match captures.get(3) {
            Some(m) => m.as_str().parse::<u32>().map_err(|_| err("range out of range"))?,
            None => 1,
        };
        let metric = match captures.get(4).map(|m| m.as_str()) {
            Some("V" | "v") => Metric::Manhattan,
            _ => Metric::Chebyshev,
        };
        let shape = NeighborhoodShape {
            range,
            metric,
            ..NeighborhoodShape::moore(range)
        };
        Self::new(birth, survival, shape).map_err(|e| RulestringError {
            input: s.to_string(),
            reason: e.reason,
        })
    }

    /// Live-neighbor counts that give birth.
    pub fn birth(&self) -> &[usize] {
        &self.birth
    }

    /// Live-neighbor counts that survive.
    pub fn survival(&self) -> &[usize] {
        &self.survival
    }
}

impl fmt::Display for TotalisticRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_counts = |f: &mut fmt::Formatter<'_>, counts: &[usize]| -> fmt::Result {
            if counts.iter().any(|&c| c > 9) {
                let list: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", list.join(","))
            } else {
                counts.iter().try_for_each(|c| write!(f, "{c}"))
            }
        };
        write!(f, "B")?;
        write_counts(f, &self.birth)?;
        write!(f, "/S")?;
        write_counts(f, &self.survival)?;
        if self.shape.range != 1 {
            write!(f, "/R{}", self.shape.range)?;
        }
        if self.shape.metric == Metric::Manhattan {
            write!(f, "/NV")?;
        }
        Ok(())
    }
}

impl Rule for TotalisticRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> &NeighborhoodShape {
        &self.shape
    }

    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
        let live = ctx.live_neighbors();
        let set = if ctx.state == 0 {
            &self.birth
        } else {
            &self.survival
        };
        Ok(set.binary_search(&live).is_ok() as CellState)
    }
}
