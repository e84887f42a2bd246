//! Arithmetic operators: `+ - * / ^ %% %/%`, binary and unary.
//!
//! Operands are recycled to the longer length. Logical and integer
//! operands give an integer result except for `/` and `^`, which always
//! give double. Integer overflow is NA with a warning.

use subset_r_vm_runtime::attributes::propagate_binary;
use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::recycle::{recycle, RECYCLE_WARNING};
use subset_r_vm_runtime::{
    Element, NaCheck, RComplex, RError, RResult, Value, Vector, DOUBLE_NA, INT_NA,
};

use crate::builtins::{
    BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{doubles_of, finish, ints_of, map_elements, NON_NUMERIC_BINARY};

pub(crate) const INT_OVERFLOW_WARNING: &str = "NAs produced by integer overflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
    IntDiv,
}

impl ArithOp {
    fn always_double(self) -> bool {
        matches!(self, ArithOp::Div | ArithOp::Pow)
    }

    /// Integer result and whether it overflowed. Division by zero in `%%`
    /// and `%/%` is NA without overflow.
    fn int(self, a: i32, b: i32) -> (i32, bool) {
        let r = match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Mod => {
                if b == 0 {
                    return (INT_NA, false);
                }
                let m = a % b;
                Some(if m != 0 && (m < 0) != (b < 0) { m + b } else { m })
            }
            ArithOp::IntDiv => {
                if b == 0 {
                    return (INT_NA, false);
                }
                let q = a / b;
                Some(if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q })
            }
            ArithOp::Div | ArithOp::Pow => return (INT_NA, false),
        };
        match r {
            Some(v) if v != INT_NA => (v, false),
            _ => (INT_NA, true),
        }
    }

    fn double(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Pow => a.powf(b),
            ArithOp::Mod => {
                if b == 0.0 {
                    f64::NAN
                } else {
                    a - (a / b).floor() * b
                }
            }
            ArithOp::IntDiv => (a / b).floor(),
        }
    }

    /// Result when an operand is NA. `x^0` and `1^x` are 1 even then.
    fn double_na(self, a: f64, b: f64) -> f64 {
        if self == ArithOp::Pow && (b == 0.0 || a == 1.0) {
            1.0
        } else {
            DOUBLE_NA
        }
    }

    fn complex(self, a: RComplex, b: RComplex) -> RResult<RComplex> {
        Ok(match self {
            ArithOp::Add => RComplex::new(a.re + b.re, a.im + b.im),
            ArithOp::Sub => RComplex::new(a.re - b.re, a.im - b.im),
            ArithOp::Mul => RComplex::new(a.re * b.re - a.im * b.im, a.re * b.im + a.im * b.re),
            ArithOp::Div => {
                let d = b.re * b.re + b.im * b.im;
                RComplex::new(
                    (a.re * b.re + a.im * b.im) / d,
                    (a.im * b.re - a.re * b.im) / d,
                )
            }
            ArithOp::Pow => {
                if b.re == 0.0 && b.im == 0.0 {
                    RComplex::new(1.0, 0.0)
                } else if a.re == 0.0 && a.im == 0.0 {
                    RComplex::new(0.0, 0.0)
                } else {
                    let (ln_r, theta) = (a.modulus().ln(), a.im.atan2(a.re));
                    let re = b.re * ln_r - b.im * theta;
                    let im = b.im * ln_r + b.re * theta;
                    let m = re.exp();
                    RComplex::new(m * im.cos(), m * im.sin())
                }
            }
            ArithOp::Mod | ArithOp::IntDiv => {
                return Err(RError::type_error("invalid operation on complex numbers"))
            }
        })
    }
}

// ==================== Guards ====================

fn int_operand(s: &ArgShape) -> bool {
    s.is_logical() || s.is_integer() || *s == ArgShape::Null
}

fn real_operand(s: &ArgShape) -> bool {
    s.is_numeric() || *s == ArgShape::Null
}

fn complex_operand(s: &ArgShape) -> bool {
    real_operand(s) || s.is_complex()
}

fn unary_operand(s: &[ArgShape]) -> bool {
    matches!(s, [x, ArgShape::Missing] if x.is_numeric() || x.is_complex())
}

fn int_operands(s: &[ArgShape]) -> bool {
    matches!(s, [a, b] if int_operand(a) && int_operand(b))
}

fn double_scalars(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::Double, ArgShape::Double])
}

fn double_operands(s: &[ArgShape]) -> bool {
    matches!(s, [a, b] if real_operand(a) && real_operand(b) && (a.is_double() || b.is_double()))
        && !double_scalars(s)
}

fn complex_operands(s: &[ArgShape]) -> bool {
    matches!(s, [a, b] if complex_operand(a) && complex_operand(b) && (a.is_complex() || b.is_complex()))
}

// ==================== Kernels ====================

/// Recycle `l` and `r`, applying `f` to pairs without NA and `on_na` to
/// pairs with one.
fn elementwise<T, U, F, G>(
    session: &mut Session,
    l: &Vector<T>,
    r: &Vector<T>,
    mut f: F,
    mut on_na: G,
) -> RResult<Vector<U>>
where
    T: Element,
    U: Element,
    F: FnMut(&T, &T) -> RResult<U>,
    G: FnMut(&T, &T) -> U,
{
    let rec = recycle(&[l.len(), r.len()]);
    let attributes = propagate_binary(l, r, rec.len())?;
    if rec.is_ragged() {
        session.warning(RECYCLE_WARNING);
    }
    let (ls, rs) = (l.as_slice(), r.as_slice());
    let mut na = NaCheck::new();
    na.enable_vector(l);
    na.enable_vector(r);
    let mut data = Vec::with_capacity(rec.len());
    for i in 0..rec.len() {
        let (a, b) = (&ls[rec.index(0, i)], &rs[rec.index(1, i)]);
        let y = if na.check(a) | na.check(b) {
            on_na(a, b)
        } else {
            f(a, b)?
        };
        na.record(&y);
        data.push(y);
    }
    // on_na may produce non-NA values, so completeness is taken from the
    // outputs
    let mut out = Vector::new(data, false).with_attributes(attributes);
    out.recompute_complete();
    Ok(out)
}

fn arith_int(session: &mut Session, op: ArithOp, args: &[Value]) -> RResult<Value> {
    if op.always_double() {
        return arith_double(session, op, args);
    }
    let (l, r) = (ints_of(&args[0])?, ints_of(&args[1])?);
    let mut overflow = false;
    let out = elementwise(
        session,
        &l,
        &r,
        |a: &i32, b: &i32| {
            let (v, o) = op.int(*a, *b);
            overflow |= o;
            Ok(v)
        },
        |_, _| INT_NA,
    )?;
    if overflow {
        session.warning(INT_OVERFLOW_WARNING);
    }
    Ok(finish(out))
}

fn arith_double(session: &mut Session, op: ArithOp, args: &[Value]) -> RResult<Value> {
    let (l, r) = (doubles_of(&args[0])?, doubles_of(&args[1])?);
    let out = elementwise(
        session,
        &l,
        &r,
        |a: &f64, b: &f64| Ok(op.double(*a, *b)),
        |a: &f64, b: &f64| op.double_na(*a, *b),
    )?;
    Ok(finish(out))
}

fn arith_double_scalars(session: &mut Session, op: ArithOp, args: &[Value]) -> RResult<Value> {
    match (&args[0], &args[1]) {
        (Value::Double(a), Value::Double(b)) if a.is_na() || b.is_na() => {
            Ok(Value::Double(op.double_na(*a, *b)))
        }
        (Value::Double(a), Value::Double(b)) => Ok(Value::Double(op.double(*a, *b))),
        _ => arith_double(session, op, args),
    }
}

fn arith_complex(session: &mut Session, op: ArithOp, args: &[Value]) -> RResult<Value> {
    let mut coercer = Coercer::strict();
    let (l, r) = (coercer.complex(&args[0])?, coercer.complex(&args[1])?);
    let out = elementwise(
        session,
        &l,
        &r,
        |a: &RComplex, b: &RComplex| op.complex(*a, *b),
        |_, _| RComplex::na(),
    )?;
    Ok(finish(out))
}

fn arith_unary(_: &mut Session, op: ArithOp, args: &[Value]) -> RResult<Value> {
    let x = &args[0];
    match op {
        ArithOp::Add => match x {
            Value::Logical(_) | Value::LogicalVector(_) => Ok(finish(ints_of(x)?)),
            _ => Ok(x.clone()),
        },
        ArithOp::Sub => match x {
            Value::Double(_) | Value::DoubleVector(_) => {
                Ok(finish(map_elements(&doubles_of(x)?, |d: &f64| -d)))
            }
            Value::Complex(_) | Value::ComplexVector(_) => {
                let v = Coercer::strict().complex(x)?;
                Ok(finish(map_elements(&v, |c: &RComplex| {
                    RComplex::new(-c.re, -c.im)
                })))
            }
            _ => Ok(finish(map_elements(&ints_of(x)?, |i: &i32| -i))),
        },
        _ => Err(RError::type_error("invalid unary operator")),
    }
}

macro_rules! arith_builtin {
    ($static:ident, $module:ident, $id:ident, $name:literal, $op:expr) => {
        mod $module {
            use super::*;

            pub(super) fn unary(session: &mut Session, args: &[Value]) -> RResult<Value> {
                arith_unary(session, $op, args)
            }

            pub(super) fn int(session: &mut Session, args: &[Value]) -> RResult<Value> {
                arith_int(session, $op, args)
            }

            pub(super) fn double_scalars(session: &mut Session, args: &[Value]) -> RResult<Value> {
                arith_double_scalars(session, $op, args)
            }

            pub(super) fn double(session: &mut Session, args: &[Value]) -> RResult<Value> {
                arith_double(session, $op, args)
            }

            pub(super) fn complex(session: &mut Session, args: &[Value]) -> RResult<Value> {
                arith_complex(session, $op, args)
            }
        }

        pub(crate) static $static: BuiltinDescriptor = BuiltinDescriptor {
            id: BuiltinId::$id,
            name: $name,
            kind: BuiltinKind::Primitive,
            parameters: &[
                Parameter::new("e1"),
                Parameter::new("e2").optional(ParamDefault::Missing),
            ],
            specializations: &[
                Specialization {
                    name: concat!(stringify!($module), "_unary"),
                    guard: unary_operand,
                    body: $module::unary,
                },
                Specialization {
                    name: concat!(stringify!($module), "_int"),
                    guard: int_operands,
                    body: $module::int,
                },
                Specialization {
                    name: concat!(stringify!($module), "_double_scalars"),
                    guard: double_scalars,
                    body: $module::double_scalars,
                },
                Specialization {
                    name: concat!(stringify!($module), "_double"),
                    guard: double_operands,
                    body: $module::double,
                },
                Specialization {
                    name: concat!(stringify!($module), "_complex"),
                    guard: complex_operands,
                    body: $module::complex,
                },
            ],
            type_error: Some(NON_NUMERIC_BINARY),
        };
    };
}

arith_builtin!(ADD, add, Add, "+", ArithOp::Add);
arith_builtin!(SUB, sub, Sub, "-", ArithOp::Sub);
arith_builtin!(MUL, mul, Mul, "*", ArithOp::Mul);
arith_builtin!(DIV, div, Div, "/", ArithOp::Div);
arith_builtin!(POW, pow, Pow, "^", ArithOp::Pow);
arith_builtin!(MOD, modulo, Mod, "%%", ArithOp::Mod);
arith_builtin!(INT_DIV, int_div, IntDiv, "%/%", ArithOp::IntDiv);
