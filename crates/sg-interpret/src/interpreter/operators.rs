use crate::error::interpretation_error;
use crate::value::Value;
use sg_core::bail;
use sg_core::error::Result;
use sg_core::ir::BinOp;
use std::cmp::Ordering;

pub(super) fn evaluate_binop(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinOp::Add => binop_add(lhs, rhs),
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => binop_arithmetic(op, lhs, rhs),
        BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => binop_ordering(op, lhs, rhs),
        BinOp::And => Ok(Value::Bool(lhs.as_bool()? && rhs.as_bool()?)),
        BinOp::Or => Ok(Value::Bool(lhs.as_bool()? || rhs.as_bool()?)),
    }
}

fn binop_add(lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::String(l), r) => Ok(Value::String(format!("{l}{r}"))),
        (l, r) => binop_arithmetic(BinOp::Add, l, r),
    }
}

fn binop_arithmetic(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => int_op(op, l, r).map(Value::Int),
        (Value::Long(l), Value::Long(r)) => long_op(op, l, r).map(Value::Long),
        (Value::Int(l), Value::Long(r)) => long_op(op, i64::from(l), r).map(Value::Long),
        (Value::Long(l), Value::Int(r)) => long_op(op, l, i64::from(r)).map(Value::Long),
        (l, r) => bail!(
            "unsupported operands for '{}': {} and {}",
            op.symbol(),
            l.type_name(),
            r.type_name()
        ),
    }
}

fn int_op(op: BinOp, l: i32, r: i32) -> Result<i32> {
    match op {
        BinOp::Add => Ok(l.wrapping_add(r)),
        BinOp::Sub => Ok(l.wrapping_sub(r)),
        BinOp::Mul => Ok(l.wrapping_mul(r)),
        BinOp::Div => l
            .checked_div(r)
            .ok_or_else(|| interpretation_error("division by zero")),
        BinOp::Rem => l
            .checked_rem(r)
            .ok_or_else(|| interpretation_error("division by zero")),
        other => bail!("'{}' is not an arithmetic operator", other.symbol()),
    }
}

fn long_op(op: BinOp, l: i64, r: i64) -> Result<i64> {
    match op {
        BinOp::Add => Ok(l.wrapping_add(r)),
        BinOp::Sub => Ok(l.wrapping_sub(r)),
        BinOp::Mul => Ok(l.wrapping_mul(r)),
        BinOp::Div => l
            .checked_div(r)
            .ok_or_else(|| interpretation_error("division by zero")),
        BinOp::Rem => l
            .checked_rem(r)
            .ok_or_else(|| interpretation_error("division by zero")),
        other => bail!("'{}' is not an arithmetic operator", other.symbol()),
    }
}

fn binop_ordering(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    let ordering = match (&lhs, &rhs) {
        (Value::Int(l), Value::Int(r)) => l.cmp(r),
        (Value::Long(l), Value::Long(r)) => l.cmp(r),
        (Value::Int(l), Value::Long(r)) => i64::from(*l).cmp(r),
        (Value::Long(l), Value::Int(r)) => l.cmp(&i64::from(*r)),
        (Value::String(l), Value::String(r)) => l.cmp(r),
        _ => bail!(
            "cannot compare {} with {}",
            lhs.type_name(),
            rhs.type_name()
        ),
    };
    Ok(Value::Bool(match op {
        BinOp::Lt => ordering == Ordering::Less,
        BinOp::Le => ordering != Ordering::Greater,
        BinOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }))
}
