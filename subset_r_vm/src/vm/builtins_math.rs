//! Elementwise math builtins: `abs`, `sqrt`, `floor`, `ceiling`, `round`,
//! `signif`, `exp`, `log`.
//!
//! NA input gives NA of the result type without calling the math
//! function. NaN and infinities go through the function untouched, so a
//! NaN stays NaN. Attributes are carried over unchanged.

use num_traits::ToPrimitive;
use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::{Element, Logical, RComplex, RResult, Value, DOUBLE_NA, INT_NA};

use crate::builtins::{
    ArgCast, BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{
    doubles_of, finish, int_arg, ints_of, map_elements, NANS_PRODUCED, NON_NUMERIC_MATH,
};

// ==================== Guards ====================

fn int_like(s: &ArgShape) -> bool {
    s.is_logical() || s.is_integer()
}

fn logical_scalar(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::Logical])
}

fn int_scalar(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::Integer])
}

fn double_scalar(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::Double])
}

fn int_like_vector(s: &[ArgShape]) -> bool {
    matches!(s, [x] if int_like(x) && !x.is_scalar())
}

fn double_vector(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::DoubleVector])
}

fn int_like_any(s: &[ArgShape]) -> bool {
    matches!(s, [x] if int_like(x))
}

fn double_any(s: &[ArgShape]) -> bool {
    matches!(s, [x] if x.is_double())
}

fn complex_any(s: &[ArgShape]) -> bool {
    matches!(s, [x] if x.is_complex())
}

fn int_like_digits(s: &[ArgShape]) -> bool {
    matches!(s, [x, d] if int_like(x) && d.is_integer())
}

fn double_digits(s: &[ArgShape]) -> bool {
    matches!(s, [x, d] if x.is_double() && d.is_integer())
}

fn complex_digits(s: &[ArgShape]) -> bool {
    matches!(s, [x, d] if x.is_complex() && d.is_integer())
}

// ==================== Kernels ====================

/// Double function over logical, integer or double input. Warns when a
/// number maps to NaN.
fn math_double(session: &mut Session, x: &Value, f: fn(f64) -> f64) -> RResult<Value> {
    let v = doubles_of(x)?;
    let mut nan = false;
    let out = map_elements(&v, |d: &f64| {
        let y = f(*d);
        nan |= y.is_nan() && !d.is_nan();
        y
    });
    if nan {
        session.warning(NANS_PRODUCED);
    }
    Ok(finish(out))
}

fn math_complex(x: &Value, f: fn(RComplex) -> RComplex) -> RResult<Value> {
    let v = Coercer::strict().complex(x)?;
    Ok(finish(map_elements(&v, |c: &RComplex| f(*c))))
}

fn complex_sqrt(c: RComplex) -> RComplex {
    let r = c.modulus();
    let re = ((r + c.re) / 2.0).sqrt();
    let im = ((r - c.re) / 2.0).sqrt();
    RComplex::new(re, if c.im < 0.0 { -im } else { im })
}

fn complex_exp(c: RComplex) -> RComplex {
    let m = c.re.exp();
    RComplex::new(m * c.im.cos(), m * c.im.sin())
}

fn complex_log(c: RComplex) -> RComplex {
    RComplex::new(c.modulus().ln(), c.im.atan2(c.re))
}

/// Round to `digits` decimal places. Of the two neighbouring candidates the
/// one closer to `x` wins; an exact tie goes to the even last digit.
pub(crate) fn round_digits(x: f64, digits: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    if digits == 0 {
        return x.round_ties_even();
    }
    if digits > 308 {
        return x;
    }
    let p = 10f64.powi(digits.abs());
    if p.is_infinite() {
        // every finite double is nearer zero than 10^309
        return 0.0_f64.copysign(x);
    }
    let scale = |v: f64| if digits > 0 { v * p } else { v / p };
    let unscale = |v: f64| if digits > 0 { v / p } else { v * p };
    let scaled = scale(x);
    if !scaled.is_finite() {
        return x;
    }
    let (lo, hi) = (scaled.floor(), scaled.ceil());
    if lo == hi {
        return x;
    }
    let (x_lo, x_hi) = (unscale(lo), unscale(hi));
    let (d_lo, d_hi) = (x - x_lo, x_hi - x);
    if d_lo < d_hi {
        x_lo
    } else if d_hi < d_lo {
        x_hi
    } else if lo % 2.0 == 0.0 {
        x_lo
    } else {
        x_hi
    }
}

/// Round to `digits` significant digits, halves away from zero.
pub(crate) fn signif_digits(x: f64, digits: i32) -> f64 {
    if !x.is_finite() || x == 0.0 || digits > 22 {
        return x;
    }
    let digits = digits.max(1);
    let magnitude = x.abs().log10().floor() as i32;
    let places = digits - 1 - magnitude;
    if places >= 0 {
        let p = 10f64.powi(places);
        let y = (x * p).round() / p;
        if y.is_finite() {
            y
        } else {
            x
        }
    } else {
        let q = 10f64.powi(-places);
        (x / q).round() * q
    }
}

// i32::MIN is the integer NA, so it needs no separate range check.
fn double_to_int_or_na(d: f64) -> i32 {
    d.to_i32().unwrap_or(INT_NA)
}

// ==================== abs ====================

fn abs_logical(_: &mut Session, args: &[Value]) -> RResult<Value> {
    match &args[0] {
        Value::Logical(Logical::NA) => Ok(Value::Integer(INT_NA)),
        Value::Logical(l) => Ok(Value::Integer(l.as_int())),
        other => abs_int_vector_impl(other),
    }
}

fn abs_int(_: &mut Session, args: &[Value]) -> RResult<Value> {
    match args[0] {
        Value::Integer(x) if x.is_na() => Ok(Value::Integer(INT_NA)),
        Value::Integer(x) => Ok(Value::Integer(x.abs())),
        ref other => abs_int_vector_impl(other),
    }
}

fn abs_double(_: &mut Session, args: &[Value]) -> RResult<Value> {
    match args[0] {
        Value::Double(x) if x.is_na() => Ok(Value::Double(DOUBLE_NA)),
        Value::Double(x) => Ok(Value::Double(x.abs())),
        ref other => abs_double_vector_impl(other),
    }
}

fn abs_int_vector_impl(x: &Value) -> RResult<Value> {
    Ok(finish(map_elements(&ints_of(x)?, |i: &i32| i.abs())))
}

fn abs_double_vector_impl(x: &Value) -> RResult<Value> {
    Ok(finish(map_elements(&doubles_of(x)?, |d: &f64| d.abs())))
}

fn abs_int_vector(_: &mut Session, args: &[Value]) -> RResult<Value> {
    abs_int_vector_impl(&args[0])
}

fn abs_double_vector(_: &mut Session, args: &[Value]) -> RResult<Value> {
    abs_double_vector_impl(&args[0])
}

fn abs_complex(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let v = Coercer::strict().complex(&args[0])?;
    Ok(finish(map_elements(&v, |c: &RComplex| c.modulus())))
}

pub(crate) static ABS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Abs,
    name: "abs",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[
        Specialization {
            name: "abs_logical",
            guard: logical_scalar,
            body: abs_logical,
        },
        Specialization {
            name: "abs_int",
            guard: int_scalar,
            body: abs_int,
        },
        Specialization {
            name: "abs_double",
            guard: double_scalar,
            body: abs_double,
        },
        Specialization {
            name: "abs_int_vector",
            guard: int_like_vector,
            body: abs_int_vector,
        },
        Specialization {
            name: "abs_double_vector",
            guard: double_vector,
            body: abs_double_vector,
        },
        Specialization {
            name: "abs_complex",
            guard: complex_any,
            body: abs_complex,
        },
    ],
    type_error: Some(NON_NUMERIC_MATH),
};

// ==================== sqrt, exp, log ====================

fn sqrt_double(session: &mut Session, args: &[Value]) -> RResult<Value> {
    if let Value::Double(x) = args[0] {
        if x.is_na() {
            return Ok(Value::Double(DOUBLE_NA));
        }
        if x < 0.0 {
            session.warning(NANS_PRODUCED);
        }
        return Ok(Value::Double(x.sqrt()));
    }
    math_double(session, &args[0], f64::sqrt)
}

fn sqrt_int(session: &mut Session, args: &[Value]) -> RResult<Value> {
    math_double(session, &args[0], f64::sqrt)
}

fn sqrt_complex(_: &mut Session, args: &[Value]) -> RResult<Value> {
    math_complex(&args[0], complex_sqrt)
}

pub(crate) static SQRT: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Sqrt,
    name: "sqrt",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[
        Specialization {
            name: "sqrt_int",
            guard: int_like_any,
            body: sqrt_int,
        },
        Specialization {
            name: "sqrt_double",
            guard: double_any,
            body: sqrt_double,
        },
        Specialization {
            name: "sqrt_complex",
            guard: complex_any,
            body: sqrt_complex,
        },
    ],
    type_error: Some(NON_NUMERIC_MATH),
};

fn exp_numeric(session: &mut Session, args: &[Value]) -> RResult<Value> {
    math_double(session, &args[0], f64::exp)
}

fn exp_complex(_: &mut Session, args: &[Value]) -> RResult<Value> {
    math_complex(&args[0], complex_exp)
}

pub(crate) static EXP: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Exp,
    name: "exp",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[
        Specialization {
            name: "exp_numeric",
            guard: int_like_or_double,
            body: exp_numeric,
        },
        Specialization {
            name: "exp_complex",
            guard: complex_any,
            body: exp_complex,
        },
    ],
    type_error: Some(NON_NUMERIC_MATH),
};

fn int_like_or_double(s: &[ArgShape]) -> bool {
    matches!(s, [x] if x.is_numeric())
}

fn log_numeric(session: &mut Session, args: &[Value]) -> RResult<Value> {
    math_double(session, &args[0], f64::ln)
}

fn log_complex(_: &mut Session, args: &[Value]) -> RResult<Value> {
    math_complex(&args[0], complex_log)
}

pub(crate) static LOG: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Log,
    name: "log",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[
        Specialization {
            name: "log_numeric",
            guard: int_like_or_double,
            body: log_numeric,
        },
        Specialization {
            name: "log_complex",
            guard: complex_any,
            body: log_complex,
        },
    ],
    type_error: Some(NON_NUMERIC_MATH),
};

// ==================== floor, ceiling ====================

fn floor_numeric(session: &mut Session, args: &[Value]) -> RResult<Value> {
    math_double(session, &args[0], f64::floor)
}

fn ceiling_numeric(session: &mut Session, args: &[Value]) -> RResult<Value> {
    math_double(session, &args[0], f64::ceil)
}

pub(crate) static FLOOR: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Floor,
    name: "floor",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "floor_numeric",
        guard: int_like_or_double,
        body: floor_numeric,
    }],
    type_error: Some(NON_NUMERIC_MATH),
};

pub(crate) static CEILING: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Ceiling,
    name: "ceiling",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "ceiling_numeric",
        guard: int_like_or_double,
        body: ceiling_numeric,
    }],
    type_error: Some(NON_NUMERIC_MATH),
};

// ==================== round, signif ====================

/// Integer input stays integer. NA digits give NA.
fn int_digits_op(args: &[Value], op: fn(f64, i32) -> f64, keep_from: i32) -> RResult<Value> {
    let digits = int_arg(&args[1], "digits")?;
    let v = ints_of(&args[0])?;
    if digits.is_na() {
        return Ok(finish(map_elements(&v, |_| INT_NA)));
    }
    if digits >= keep_from {
        return Ok(finish(map_elements(&v, |i: &i32| *i)));
    }
    Ok(finish(map_elements(&v, |i: &i32| {
        double_to_int_or_na(op(*i as f64, digits))
    })))
}

fn double_digits_op(args: &[Value], op: fn(f64, i32) -> f64) -> RResult<Value> {
    let digits = int_arg(&args[1], "digits")?;
    let v = doubles_of(&args[0])?;
    if digits.is_na() {
        return Ok(finish(map_elements(&v, |_| DOUBLE_NA)));
    }
    Ok(finish(map_elements(&v, |d: &f64| op(*d, digits))))
}

fn complex_digits_op(args: &[Value], op: fn(f64, i32) -> f64) -> RResult<Value> {
    let digits = int_arg(&args[1], "digits")?;
    let v = Coercer::strict().complex(&args[0])?;
    if digits.is_na() {
        return Ok(finish(map_elements(&v, |_| RComplex::na())));
    }
    Ok(finish(map_elements(&v, |c: &RComplex| {
        RComplex::new(op(c.re, digits), op(c.im, digits))
    })))
}

fn round_int(_: &mut Session, args: &[Value]) -> RResult<Value> {
    int_digits_op(args, round_digits, 0)
}

fn round_double(_: &mut Session, args: &[Value]) -> RResult<Value> {
    if let (Value::Double(x), Value::Integer(0)) = (&args[0], &args[1]) {
        return Ok(Value::Double(if x.is_na() {
            DOUBLE_NA
        } else {
            x.round_ties_even()
        }));
    }
    double_digits_op(args, round_digits)
}

fn round_complex(_: &mut Session, args: &[Value]) -> RResult<Value> {
    complex_digits_op(args, round_digits)
}

pub(crate) static ROUND: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Round,
    name: "round",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("digits")
            .optional(ParamDefault::Integer(0))
            .cast(ArgCast::ToInteger),
    ],
    specializations: &[
        Specialization {
            name: "round_int",
            guard: int_like_digits,
            body: round_int,
        },
        Specialization {
            name: "round_double",
            guard: double_digits,
            body: round_double,
        },
        Specialization {
            name: "round_complex",
            guard: complex_digits,
            body: round_complex,
        },
    ],
    type_error: Some(NON_NUMERIC_MATH),
};

fn signif_int(_: &mut Session, args: &[Value]) -> RResult<Value> {
    // ten digits cover every integer
    int_digits_op(args, signif_digits, 10)
}

fn signif_double(_: &mut Session, args: &[Value]) -> RResult<Value> {
    double_digits_op(args, signif_digits)
}

fn signif_complex(_: &mut Session, args: &[Value]) -> RResult<Value> {
    complex_digits_op(args, signif_digits)
}

pub(crate) static SIGNIF: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Signif,
    name: "signif",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("digits")
            .optional(ParamDefault::Integer(6))
            .cast(ArgCast::ToInteger),
    ],
    specializations: &[
        Specialization {
            name: "signif_int",
            guard: int_like_digits,
            body: signif_int,
        },
        Specialization {
            name: "signif_double",
            guard: double_digits,
            body: signif_double,
        },
        Specialization {
            name: "signif_complex",
            guard: complex_digits,
            body: signif_complex,
        },
    ],
    type_error: Some(NON_NUMERIC_MATH),
};
