//! Reductions (`sum`, `prod`, `max`, `min`, `all`, `any`), their parallel
//! forms (`pmax`, `pmin`) and NA predicates (`is.na`, `anyNA`).
//!
//! Reductions take any number of atomic arguments through `...` and
//! never carry attributes over to their result.

use subset_r_vm_runtime::attributes::Attributes;
use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::recycle::{recycle, Recycling};
use subset_r_vm_runtime::{
    compare_strings, Element, Logical, RComplex, RError, RResult, RString, RType, Value, Vector,
    DOUBLE_NA, INT_NA,
};

use crate::builtins::{
    BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{doubles_of, dots_values, finish, flag_arg, ints_of, strings_of};

pub(crate) const SUM_OVERFLOW_WARNING: &str = "integer overflow - use sum(as.numeric(.))";
pub(crate) const FRACTIONAL_RECYCLE_WARNING: &str = "an argument will be fractionally recycled";

// ==================== Guards ====================

fn no_values(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::Null, flag] if flag.is_logical())
}

fn dots_values_and_flag(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::List, flag] if flag.is_logical())
}

fn one_arg(s: &[ArgShape]) -> bool {
    s.len() == 1
}

fn one_arg_and_flag(s: &[ArgShape]) -> bool {
    matches!(s, [_, flag] if flag.is_logical())
}

// ==================== Operand typing ====================

/// Common type of the reduction operands; character and complex are only
/// accepted where the caller allows them.
fn operand_type(values: &[Value], allow_complex: bool, allow_string: bool) -> RResult<RType> {
    let mut result = RType::Logical;
    for v in values {
        let t = v.rtype();
        let ok = match t {
            RType::Null | RType::Logical | RType::Integer | RType::Double => true,
            RType::Complex => allow_complex,
            RType::Character => allow_string,
            _ => false,
        };
        if !ok {
            return Err(RError::type_error(format!(
                "invalid 'type' ({}) of argument",
                t.type_name()
            )));
        }
        result = result.join(t)?;
    }
    Ok(result)
}

// ==================== sum, prod ====================

fn sum_ints(session: &mut Session, values: &[Value], na_rm: bool) -> RResult<Value> {
    let mut total: i64 = 0;
    for v in values {
        for x in ints_of(v)?.iter() {
            if x.is_na() {
                if na_rm {
                    continue;
                }
                return Ok(Value::Integer(INT_NA));
            }
            total += i64::from(*x);
        }
    }
    match i32::try_from(total) {
        Ok(t) if t != INT_NA => Ok(Value::Integer(t)),
        _ => {
            session.warning(SUM_OVERFLOW_WARNING);
            Ok(Value::Integer(INT_NA))
        }
    }
}

fn sum_doubles(values: &[Value], na_rm: bool) -> RResult<Value> {
    let mut total = 0.0_f64;
    let mut seen_na = false;
    for v in values {
        for x in doubles_of(v)?.iter() {
            if na_rm && x.is_nan() {
                continue;
            }
            seen_na |= x.is_na();
            total += *x;
        }
    }
    Ok(Value::Double(if seen_na { DOUBLE_NA } else { total }))
}

fn sum_complex(values: &[Value], na_rm: bool) -> RResult<Value> {
    let mut total = RComplex::new(0.0, 0.0);
    for v in values {
        for z in Coercer::strict().complex(v)?.iter() {
            if z.is_na() {
                if na_rm {
                    continue;
                }
                return Ok(Value::Complex(RComplex::na()));
            }
            total = RComplex::new(total.re + z.re, total.im + z.im);
        }
    }
    Ok(Value::Complex(total))
}

fn sum_empty(_: &mut Session, args: &[Value]) -> RResult<Value> {
    flag_arg(&args[1], "na.rm")?;
    Ok(Value::Integer(0))
}

fn sum_values(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let values = dots_values(&args[0]);
    let na_rm = flag_arg(&args[1], "na.rm")?;
    match operand_type(&values, true, false)? {
        RType::Complex => sum_complex(&values, na_rm),
        RType::Double => sum_doubles(&values, na_rm),
        _ => sum_ints(session, &values, na_rm),
    }
}

fn prod_empty(_: &mut Session, args: &[Value]) -> RResult<Value> {
    flag_arg(&args[1], "na.rm")?;
    Ok(Value::Double(1.0))
}

fn prod_values(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let values = dots_values(&args[0]);
    let na_rm = flag_arg(&args[1], "na.rm")?;
    if operand_type(&values, true, false)? == RType::Complex {
        let mut total = RComplex::new(1.0, 0.0);
        for v in &values {
            for z in Coercer::strict().complex(v)?.iter() {
                if z.is_na() {
                    if na_rm {
                        continue;
                    }
                    return Ok(Value::Complex(RComplex::na()));
                }
                total = RComplex::new(
                    total.re * z.re - total.im * z.im,
                    total.re * z.im + total.im * z.re,
                );
            }
        }
        return Ok(Value::Complex(total));
    }
    let mut total = 1.0_f64;
    let mut seen_na = false;
    for v in &values {
        for x in doubles_of(v)?.iter() {
            if na_rm && x.is_nan() {
                continue;
            }
            seen_na |= x.is_na();
            total *= *x;
        }
    }
    Ok(Value::Double(if seen_na { DOUBLE_NA } else { total }))
}

pub(crate) static SUM: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Sum,
    name: "sum",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "sum_empty",
            guard: no_values,
            body: sum_empty,
        },
        Specialization {
            name: "sum_values",
            guard: dots_values_and_flag,
            body: sum_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

pub(crate) static PROD: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Prod,
    name: "prod",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "prod_empty",
            guard: no_values,
            body: prod_empty,
        },
        Specialization {
            name: "prod_values",
            guard: dots_values_and_flag,
            body: prod_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

// ==================== max, min ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Max,
    Min,
}

impl Extreme {
    fn name(self) -> &'static str {
        match self {
            Extreme::Max => "max",
            Extreme::Min => "min",
        }
    }

    fn better(self, candidate: f64, current: f64) -> bool {
        match self {
            Extreme::Max => candidate > current,
            Extreme::Min => candidate < current,
        }
    }

    /// Result of an empty reduction.
    fn identity(self) -> f64 {
        match self {
            Extreme::Max => f64::NEG_INFINITY,
            Extreme::Min => f64::INFINITY,
        }
    }
}

fn extreme_empty(session: &mut Session, which: Extreme) -> Value {
    let identity = which.identity();
    session.warning(format!(
        "no non-missing arguments to {}; returning {}",
        which.name(),
        if identity < 0.0 { "-Inf" } else { "Inf" }
    ));
    Value::Double(identity)
}

fn extreme_ints(
    session: &mut Session,
    values: &[Value],
    which: Extreme,
    na_rm: bool,
) -> RResult<Value> {
    let mut best: Option<i32> = None;
    for v in values {
        for x in ints_of(v)?.iter() {
            if x.is_na() {
                if na_rm {
                    continue;
                }
                return Ok(Value::Integer(INT_NA));
            }
            if best.map_or(true, |b| which.better(f64::from(*x), f64::from(b))) {
                best = Some(*x);
            }
        }
    }
    Ok(match best {
        Some(b) => Value::Integer(b),
        None => extreme_empty(session, which),
    })
}

fn extreme_doubles(
    session: &mut Session,
    values: &[Value],
    which: Extreme,
    na_rm: bool,
) -> RResult<Value> {
    let mut best: Option<f64> = None;
    let mut seen_nan = false;
    for v in values {
        for x in doubles_of(v)?.iter() {
            if x.is_nan() {
                if na_rm {
                    continue;
                }
                if x.is_na() {
                    return Ok(Value::Double(DOUBLE_NA));
                }
                seen_nan = true;
                continue;
            }
            if best.map_or(true, |b| which.better(*x, b)) {
                best = Some(*x);
            }
        }
    }
    Ok(match best {
        _ if seen_nan => Value::Double(f64::NAN),
        Some(b) => Value::Double(b),
        None => extreme_empty(session, which),
    })
}

fn extreme_strings(values: &[Value], which: Extreme, na_rm: bool) -> RResult<Value> {
    let mut best: Option<RString> = None;
    for v in values {
        for s in strings_of(v)?.iter() {
            if s.is_na() {
                if na_rm {
                    continue;
                }
                return Ok(Value::Character(RString::na()));
            }
            let replace = match &best {
                None => true,
                Some(b) => {
                    let ord = compare_strings(s, b);
                    match which {
                        Extreme::Max => ord.is_gt(),
                        Extreme::Min => ord.is_lt(),
                    }
                }
            };
            if replace {
                best = Some(s.clone());
            }
        }
    }
    best.map(Value::Character).ok_or_else(|| {
        RError::value_error(format!("no non-missing arguments to {}", which.name()))
    })
}

fn extreme(session: &mut Session, args: &[Value], which: Extreme) -> RResult<Value> {
    let values = dots_values(&args[0]);
    let na_rm = flag_arg(&args[1], "na.rm")?;
    match operand_type(&values, false, true)? {
        RType::Character => extreme_strings(&values, which, na_rm),
        RType::Double => extreme_doubles(session, &values, which, na_rm),
        _ => extreme_ints(session, &values, which, na_rm),
    }
}

fn max_empty(session: &mut Session, args: &[Value]) -> RResult<Value> {
    flag_arg(&args[1], "na.rm")?;
    Ok(extreme_empty(session, Extreme::Max))
}

fn max_values(session: &mut Session, args: &[Value]) -> RResult<Value> {
    extreme(session, args, Extreme::Max)
}

fn min_empty(session: &mut Session, args: &[Value]) -> RResult<Value> {
    flag_arg(&args[1], "na.rm")?;
    Ok(extreme_empty(session, Extreme::Min))
}

fn min_values(session: &mut Session, args: &[Value]) -> RResult<Value> {
    extreme(session, args, Extreme::Min)
}

pub(crate) static MAX: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Max,
    name: "max",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "max_empty",
            guard: no_values,
            body: max_empty,
        },
        Specialization {
            name: "max_values",
            guard: dots_values_and_flag,
            body: max_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

pub(crate) static MIN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Min,
    name: "min",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "min_empty",
            guard: no_values,
            body: min_empty,
        },
        Specialization {
            name: "min_values",
            guard: dots_values_and_flag,
            body: min_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

// ==================== all, any ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    All,
    Any,
}

impl Quantifier {
    fn name(self) -> &'static str {
        match self {
            Quantifier::All => "all",
            Quantifier::Any => "any",
        }
    }

    fn identity(self) -> Logical {
        match self {
            Quantifier::All => Logical::True,
            Quantifier::Any => Logical::False,
        }
    }

    fn combine(self, acc: Logical, x: Logical) -> Logical {
        match self {
            Quantifier::All => acc.and(x),
            Quantifier::Any => acc.or(x),
        }
    }
}

/// Logical data of one `all`/`any` operand. Doubles are accepted with a
/// warning; character, complex and non-atomic operands are not.
fn quantifier_operand(
    session: &mut Session,
    v: &Value,
    which: Quantifier,
) -> RResult<Vector<Logical>> {
    match v.rtype() {
        RType::Null | RType::Logical | RType::Integer => {}
        RType::Double => session.warning(format!(
            "coercing argument of type 'double' to logical in {}()",
            which.name()
        )),
        t => {
            return Err(RError::type_error(format!(
                "invalid 'type' ({}) of argument",
                t.type_name()
            )))
        }
    }
    Coercer::strict().logical(v)
}

fn quantify(session: &mut Session, args: &[Value], which: Quantifier) -> RResult<Value> {
    let values = dots_values(&args[0]);
    let na_rm = flag_arg(&args[1], "na.rm")?;
    let mut acc = which.identity();
    for v in &values {
        for x in quantifier_operand(session, v, which)?.iter() {
            if na_rm && x.is_na() {
                continue;
            }
            acc = which.combine(acc, *x);
            // FALSE absorbs `and`, TRUE absorbs `or`
            if acc != which.identity() && !acc.is_na() {
                return Ok(Value::Logical(acc));
            }
        }
    }
    Ok(Value::Logical(acc))
}

fn all_empty(_: &mut Session, args: &[Value]) -> RResult<Value> {
    flag_arg(&args[1], "na.rm")?;
    Ok(Value::Logical(Quantifier::All.identity()))
}

fn all_values(session: &mut Session, args: &[Value]) -> RResult<Value> {
    quantify(session, args, Quantifier::All)
}

fn any_empty(_: &mut Session, args: &[Value]) -> RResult<Value> {
    flag_arg(&args[1], "na.rm")?;
    Ok(Value::Logical(Quantifier::Any.identity()))
}

fn any_values(session: &mut Session, args: &[Value]) -> RResult<Value> {
    quantify(session, args, Quantifier::Any)
}

pub(crate) static ALL: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::All,
    name: "all",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "all_empty",
            guard: no_values,
            body: all_empty,
        },
        Specialization {
            name: "all_values",
            guard: dots_values_and_flag,
            body: all_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

pub(crate) static ANY: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Any,
    name: "any",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "any_empty",
            guard: no_values,
            body: any_empty,
        },
        Specialization {
            name: "any_values",
            guard: dots_values_and_flag,
            body: any_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

// ==================== pmax, pmin ====================

/// Operand type of `pmax`/`pmin`: logical, integer, double or character.
fn parallel_type(values: &[Value]) -> RResult<RType> {
    let mut result = RType::Logical;
    for v in values {
        let t = v.rtype();
        if !matches!(
            t,
            RType::Null | RType::Logical | RType::Integer | RType::Double | RType::Character
        ) {
            return Err(RError::type_error("invalid input type"));
        }
        result = result.join(t)?;
    }
    Ok(result)
}

/// Elementwise extreme over recycled operands. `pick` chooses between the
/// next element and the running result. With `na_rm` the elements for
/// which `skipped` holds are ignored; otherwise an NA element makes the
/// position NA.
fn parallel_extreme<T, S, F>(
    operands: &[Vector<T>],
    rec: &Recycling,
    na_rm: bool,
    skipped: S,
    pick: F,
) -> Vector<T>
where
    T: Element,
    S: Fn(&T) -> bool,
    F: Fn(&T, &T) -> bool,
{
    let data = (0..rec.len())
        .map(|i| {
            let mut best: Option<&T> = None;
            for (k, v) in operands.iter().enumerate() {
                let x = &v.as_slice()[rec.index(k, i)];
                if na_rm && skipped(x) {
                    continue;
                }
                if x.is_na() {
                    return T::na();
                }
                if best.map_or(true, |b| pick(x, b)) {
                    best = Some(x);
                }
            }
            best.cloned().unwrap_or_else(T::na)
        })
        .collect::<Vec<T>>();
    let complete = !data.iter().any(Element::is_na);
    Vector::new(data, complete)
}

fn parallel(session: &mut Session, args: &[Value], which: Extreme) -> RResult<Value> {
    let values: Vec<Value> = dots_values(&args[0])
        .into_iter()
        .filter(|v| !v.is_null())
        .collect();
    let na_rm = flag_arg(&args[1], "na.rm")?;
    let rtype = parallel_type(&values)?;
    if let [only] = values.as_slice() {
        return Ok(only.clone());
    }
    let rec = recycle(&values.iter().map(Value::len).collect::<Vec<_>>());
    if rec.is_ragged() {
        session.warning(FRACTIONAL_RECYCLE_WARNING);
    }
    let out = match rtype {
        RType::Character => {
            let operands = values.iter().map(strings_of).collect::<RResult<Vec<_>>>()?;
            let pick = |x: &RString, b: &RString| {
                let ord = compare_strings(x, b);
                match which {
                    Extreme::Max => ord.is_gt(),
                    Extreme::Min => ord.is_lt(),
                }
            };
            finish(parallel_extreme(&operands, &rec, na_rm, <RString as Element>::is_na, pick))
        }
        RType::Double => {
            let operands = values.iter().map(doubles_of).collect::<RResult<Vec<_>>>()?;
            // NaN wins over numbers and is never replaced
            let pick = |x: &f64, b: &f64| x.is_nan() || (!b.is_nan() && which.better(*x, *b));
            finish(parallel_extreme(&operands, &rec, na_rm, |d: &f64| d.is_nan(), pick))
        }
        _ => {
            let operands = values.iter().map(ints_of).collect::<RResult<Vec<_>>>()?;
            let pick = |x: &i32, b: &i32| which.better(f64::from(*x), f64::from(*b));
            finish(parallel_extreme(&operands, &rec, na_rm, <i32 as Element>::is_na, pick))
        }
    };
    Ok(out)
}

fn parallel_no_values(_: &mut Session, args: &[Value]) -> RResult<Value> {
    flag_arg(&args[1], "na.rm")?;
    Err(RError::value_error("no arguments"))
}

fn pmax_values(session: &mut Session, args: &[Value]) -> RResult<Value> {
    parallel(session, args, Extreme::Max)
}

fn pmin_values(session: &mut Session, args: &[Value]) -> RResult<Value> {
    parallel(session, args, Extreme::Min)
}

pub(crate) static PMAX: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::PMax,
    name: "pmax",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "pmax_no_values",
            guard: no_values,
            body: parallel_no_values,
        },
        Specialization {
            name: "pmax_values",
            guard: dots_values_and_flag,
            body: pmax_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

pub(crate) static PMIN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::PMin,
    name: "pmin",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::dots(),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[
        Specialization {
            name: "pmin_no_values",
            guard: no_values,
            body: parallel_no_values,
        },
        Specialization {
            name: "pmin_values",
            guard: dots_values_and_flag,
            body: pmin_values,
        },
    ],
    type_error: Some("invalid 'na.rm' argument"),
};

// ==================== is.na, anyNA ====================

/// names, dim and dimnames of `x`; class and the rest are dropped.
fn shape_attributes(x: &Value) -> Attributes {
    let mut out = Attributes::new();
    if let Some(a) = x.attributes() {
        out.set_names(a.names().map(<[RString]>::to_vec));
        out.set_dim_unchecked(a.dim().map(<[i32]>::to_vec));
        out.set_dimnames(a.dimnames().cloned());
    }
    out
}

fn element_is_na(x: &Value) -> bool {
    match x {
        Value::Logical(l) => l.is_na(),
        Value::Integer(i) => i.is_na(),
        Value::Double(d) => d.is_nan(),
        Value::Complex(z) => z.re.is_nan() || z.im.is_nan(),
        Value::Character(s) => s.is_na(),
        _ => false,
    }
}

fn is_na(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let x = &args[0];
    let flags: Vec<Logical> = match x {
        Value::Null => Vec::new(),
        Value::List(items) => items
            .iter()
            .map(|item| {
                let single = item.len() == 1 && item.is_atomic();
                let na = single && item.element(0).map_or(false, |e| element_is_na(&e));
                Logical::from_bool(na)
            })
            .collect(),
        v if v.is_atomic() => (0..v.len())
            .map(|i| Logical::from_bool(v.element(i).map_or(false, |e| element_is_na(&e))))
            .collect(),
        other => {
            session.warning(format!(
                "is.na() applied to non-(list or vector) of type '{}'",
                other.type_name()
            ));
            vec![Logical::False]
        }
    };
    let out = Vector::new(flags, true).with_attributes(shape_attributes(x));
    Ok(finish(out))
}

fn any_na_in(x: &Value, recursive: bool) -> bool {
    match x {
        Value::Logical(l) => l.is_na(),
        Value::Integer(i) => i.is_na(),
        Value::Double(d) => d.is_nan(),
        Value::Complex(z) => z.re.is_nan() || z.im.is_nan(),
        Value::Character(s) => s.is_na(),
        Value::LogicalVector(v) => !v.is_complete() && v.iter().any(Element::is_na),
        Value::IntVector(v) => !v.is_complete() && v.iter().any(Element::is_na),
        // NaN is not NA but still counts here, so completeness does not help
        Value::DoubleVector(v) => v.iter().any(|d| d.is_nan()),
        Value::ComplexVector(v) => v.iter().any(|z| z.re.is_nan() || z.im.is_nan()),
        Value::StringVector(v) => !v.is_complete() && v.iter().any(Element::is_na),
        Value::List(items) => items.iter().any(|item| {
            if recursive {
                any_na_in(item, true)
            } else {
                item.len() == 1 && item.is_atomic() && any_na_in(item, false)
            }
        }),
        _ => false,
    }
}

fn any_na(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let recursive = flag_arg(&args[1], "recursive")?;
    Ok(Value::from(any_na_in(&args[0], recursive)))
}

pub(crate) static IS_NA: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::IsNa,
    name: "is.na",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "is_na",
        guard: one_arg,
        body: is_na,
    }],
    type_error: None,
};

pub(crate) static ANY_NA: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::AnyNa,
    name: "anyNA",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("recursive").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[Specialization {
        name: "any_na",
        guard: one_arg_and_flag,
        body: any_na,
    }],
    type_error: Some("invalid 'recursive' argument"),
};
