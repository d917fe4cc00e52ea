//! Fuel-metered evaluation of parsed transitions.

use cellua_core::{CellState, RuleError};

use super::parser::{BinOp, Builtin, Expr, Func, Program, Sequence, UnOp};
use crate::rule::CellContext;

/// Evaluate `program` for one cell, spending at most `budget` fuel.
///
/// Every expression node costs one unit; `count` and `sum` additionally
/// cost one unit per neighbor.
pub(crate) fn run(
    program: &Program,
    ctx: &CellContext<'_>,
    budget: u64,
) -> Result<CellState, RuleError> {
    let mut machine = Machine {
        ctx,
        locals: Vec::with_capacity(program.lets.len()),
        fuel: budget,
        budget,
    };
    for binding in &program.lets {
        let value = machine.eval(binding)?;
        machine.locals.push(value);
    }
    let result = machine.eval(&program.body)?;
    CellState::try_from(result).map_err(|_| fail(format!("result {result} is not a valid state")))
}

fn fail(reason: String) -> RuleError {
    RuleError::ExecutionFailed { reason }
}

fn overflow() -> RuleError {
    fail("arithmetic overflow".into())
}

#[derive(Clone, Copy)]
enum Indexed<'c> {
    States(&'c [CellState]),
    Coords(&'c [i64]),
}

struct Machine<'c> {
    ctx: &'c CellContext<'c>,
    locals: Vec<i128>,
    fuel: u64,
    budget: u64,
}

impl Machine<'_> {
    fn charge(&mut self, cost: u64) -> Result<(), RuleError> {
        self.fuel = self
            .fuel
            .checked_sub(cost)
            .ok_or(RuleError::ResourceLimit {
                budget: self.budget,
            })?;
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<i128, RuleError> {
        self.charge(1)?;
        match expr {
            Expr::Int(v) => Ok(*v),
            Expr::Local(slot) => Ok(self.locals[*slot]),
            Expr::Builtin(b) => self.builtin(*b),
            Expr::Index(seq, index) => {
                let i = self.eval(index)?;
                self.index(*seq, i)
            }
            Expr::Unary(op, operand) => {
                let v = self.eval(operand)?;
                match op {
                    UnOp::Neg => v.checked_neg().ok_or_else(overflow),
                    UnOp::Not => Ok((v == 0) as i128),
                }
            }
            Expr::Binary(BinOp::And, l, r) => {
                Ok((self.eval(l)? != 0 && self.eval(r)? != 0) as i128)
            }
            Expr::Binary(BinOp::Or, l, r) => {
                Ok((self.eval(l)? != 0 || self.eval(r)? != 0) as i128)
            }
            Expr::Binary(op, l, r) => {
                let a = self.eval(l)?;
                let b = self.eval(r)?;
                binary(*op, a, b)
            }
            Expr::If(cond, then, otherwise) => {
                if self.eval(cond)? != 0 {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call(func, args) => self.call(*func, args),
        }
    }

    fn builtin(&self, b: Builtin) -> Result<i128, RuleError> {
        Ok(match b {
            Builtin::State => self.ctx.state as i128,
            Builtin::Live => self.ctx.live_neighbors() as i128,
            Builtin::Size => self.ctx.neighbors.len() as i128,
            Builtin::Gen => match self.ctx.generation {
                Some(g) => g.0 as i128,
                None => return Err(fail("generation is not available".into())),
            },
        })
    }

    fn index(&self, seq: Sequence, i: i128) -> Result<i128, RuleError> {
        let (name, values) = match seq {
            Sequence::Neighbors => ("nb", Indexed::States(self.ctx.neighbors)),
            Sequence::Position => match self.ctx.position {
                Some(p) => ("pos", Indexed::Coords(p)),
                None => return Err(fail("position is not available".into())),
            },
        };
        let len = match values {
            Indexed::States(v) => v.len(),
            Indexed::Coords(v) => v.len(),
        };
        let idx = usize::try_from(i)
            .ok()
            .filter(|&idx| idx < len)
            .ok_or_else(|| fail(format!("index {i} out of bounds for `{name}` of length {len}")))?;
        Ok(match values {
            Indexed::States(v) => v[idx] as i128,
            Indexed::Coords(v) => v[idx] as i128,
        })
    }

    fn call(&mut self, func: Func, args: &[Expr]) -> Result<i128, RuleError> {
        let mut values = [0i128; 2];
        for (slot, arg) in values.iter_mut().zip(args) {
            *slot = self.eval(arg)?;
        }
        let [a, b] = values;
        match func {
            Func::Count => {
                self.charge(self.ctx.neighbors.len() as u64)?;
                Ok(self
                    .ctx
                    .neighbors
                    .iter()
                    .filter(|&&s| s as i128 == a)
                    .count() as i128)
            }
            Func::Sum => {
                self.charge(self.ctx.neighbors.len() as u64)?;
                // At most 4096 neighbors of at most 2^64 - 1 each: no overflow.
                Ok(self.ctx.neighbors.iter().map(|&s| s as i128).sum())
            }
            Func::Min => Ok(a.min(b)),
            Func::Max => Ok(a.max(b)),
            Func::Abs => a.checked_abs().ok_or_else(overflow),
            Func::Bit => match u32::try_from(b) {
                Ok(shift) if shift < 128 => Ok((a >> shift) & 1),
                _ => Err(fail(format!("bit index {b} out of range"))),
            },
        }
    }
}

fn binary(op: BinOp, a: i128, b: i128) -> Result<i128, RuleError> {
    let truth = |c: bool| Ok(c as i128);
    match op {
        BinOp::Eq => truth(a == b),
        BinOp::Ne => truth(a != b),
        BinOp::Lt => truth(a < b),
        BinOp::Le => truth(a <= b),
        BinOp::Gt => truth(a > b),
        BinOp::Ge => truth(a >= b),
        BinOp::Add => a.checked_add(b).ok_or_else(overflow),
        BinOp::Sub => a.checked_sub(b).ok_or_else(overflow),
        BinOp::Mul => a.checked_mul(b).ok_or_else(overflow),
        BinOp::Div | BinOp::Rem if b == 0 => Err(fail("division by zero".into())),
        BinOp::Div => a.checked_div_euclid(b).ok_or_else(overflow),
        BinOp::Rem => a.checked_rem_euclid(b).ok_or_else(overflow),
        BinOp::And => truth(a != 0 && b != 0),
        BinOp::Or => truth(a != 0 || b != 0),
    }
}
