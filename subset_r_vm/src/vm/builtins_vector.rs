//! Vector construction and indexing builtins: `tabulate`, `rep.int`,
//! `rep_len`, `c`, `which`, `which.max`, `which.min`, `rowMeans`,
//! `colMeans`, `length`.

use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::recycle::{rep_int, rep_len};
use subset_r_vm_runtime::{
    Element, Logical, RError, RResult, RString, RType, Value, Vector, DOUBLE_NA, INT_NA,
};

use crate::builtins::{
    ArgCast, BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{
    any_shapes, doubles_of, dots_names, dots_values, finish, flag_arg, int_arg, ints_of,
    invalid_arg, with_vector,
};

fn vector_like(s: &ArgShape) -> bool {
    s.is_atomic() || matches!(s, ArgShape::List | ArgShape::Null)
}

// ==================== tabulate ====================

fn bins_and_count(s: &[ArgShape]) -> bool {
    matches!(s, [bin, nbins]
        if (bin.is_numeric() || matches!(bin, ArgShape::Factor | ArgShape::Null))
            && (nbins.is_integer() || *nbins == ArgShape::Missing))
}

fn tabulate(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let bins = ints_of(&args[0])?;
    let nbins = match &args[1] {
        Value::Missing => bins.iter().filter(|b| !b.is_na()).copied().max().unwrap_or(1).max(1),
        v => int_arg(v, "nbin")?,
    };
    if nbins == INT_NA || nbins < 0 {
        return Err(invalid_arg("nbin"));
    }
    let mut counts = vec![0i32; nbins as usize];
    // NA is negative, so the range check drops it as well
    for b in bins.iter() {
        if *b >= 1 && *b <= nbins {
            counts[(*b - 1) as usize] += 1;
        }
    }
    Ok(finish(Vector::new(counts, true)))
}

pub(crate) static TABULATE: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Tabulate,
    name: "tabulate",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("bin"),
        Parameter::new("nbins")
            .optional(ParamDefault::Missing)
            .cast(ArgCast::ToInteger),
    ],
    specializations: &[Specialization {
        name: "tabulate",
        guard: bins_and_count,
        body: tabulate,
    }],
    type_error: Some("invalid input"),
};

// ==================== rep.int, rep_len ====================

fn vector_and_count(s: &[ArgShape]) -> bool {
    matches!(s, [x, n] if vector_like(x) && n.is_integer())
}

fn not_replicable(x: &Value) -> RError {
    RError::type_error(format!(
        "attempt to replicate an object of type '{}'",
        x.type_name()
    ))
}

fn rep_int_values(_: &mut Session, args: &[Value]) -> RResult<Value> {
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let times = ints_of(&args[1])?;
    let x = args[0].as_vector_form();
    let out = with_vector!(x.as_ref(), v => rep_int(v, times.as_slice())?)
        .ok_or_else(|| not_replicable(&args[0]))?;
    Ok(out.into_scalar_form())
}

fn rep_len_values(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let len = int_arg(&args[1], "length.out")?;
    if len == INT_NA || len < 0 {
        return Err(RError::value_error("invalid 'length.out' value"));
    }
    if args[0].is_null() {
        return Err(not_replicable(&args[0]));
    }
    let x = args[0].as_vector_form();
    let out = with_vector!(x.as_ref(), v => rep_len(v, len as usize))
        .ok_or_else(|| not_replicable(&args[0]))?;
    Ok(out.into_scalar_form())
}

pub(crate) static REP_INT: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::RepInt,
    name: "rep.int",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("times").cast(ArgCast::ToInteger),
    ],
    specializations: &[Specialization {
        name: "rep_int",
        guard: vector_and_count,
        body: rep_int_values,
    }],
    type_error: None,
};

pub(crate) static REP_LEN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::RepLen,
    name: "rep_len",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("length.out").cast(ArgCast::ToInteger),
    ],
    specializations: &[Specialization {
        name: "rep_len",
        guard: vector_and_count,
        body: rep_len_values,
    }],
    type_error: None,
};

// ==================== c ====================

fn concat<T: Element>(parts: Vec<Vector<T>>) -> Vector<T> {
    let complete = parts.iter().all(Vector::is_complete);
    let data = parts
        .into_iter()
        .flat_map(|p| p.as_slice().to_vec())
        .collect();
    Vector::new(data, complete)
}

/// Type of the combined result; values outside the atomic lattice force
/// a list.
fn combined_type(values: &[Value]) -> RResult<RType> {
    values.iter().try_fold(RType::Null, |acc, v| {
        let t = match v.rtype() {
            t @ (RType::Null | RType::Raw) => t,
            t if t.precedence().is_some() => t,
            _ => RType::List,
        };
        acc.join(t)
    })
}

/// Names of the combined result, `None` when no argument carries any.
///
/// An argument name labels a single element as is and numbers the
/// elements of a longer argument; it prefixes inner names with a dot.
fn combined_names(values: &[Value], arg_names: &[Option<String>]) -> Option<Vec<RString>> {
    let mut any = false;
    let mut out = Vec::new();
    for (v, arg) in values.iter().zip(arg_names) {
        let n = v.len();
        let inner = v.names();
        any |= arg.is_some() || inner.is_some();
        for i in 0..n {
            let inner_name = inner
                .and_then(|names| names.get(i))
                .and_then(|s| s.as_str())
                .filter(|s| !s.is_empty());
            let name = match (arg, inner_name) {
                (Some(a), Some(x)) => format!("{}.{}", a, x),
                (Some(a), None) if n == 1 => a.clone(),
                (Some(a), None) => format!("{}{}", a, i + 1),
                (None, Some(x)) => x.to_string(),
                (None, None) => String::new(),
            };
            out.push(RString::from(name));
        }
    }
    any.then_some(out)
}

/// Coerce every value with `f` and concatenate the results.
fn coerce_all<T, F>(values: &[Value], mut f: F) -> RResult<Vector<T>>
where
    T: Element,
    F: FnMut(&mut Coercer, &Value) -> RResult<Vector<T>>,
{
    let mut coercer = Coercer::strict().keep_attributes(false);
    let parts = values
        .iter()
        .map(|v| f(&mut coercer, v))
        .collect::<RResult<Vec<_>>>()?;
    Ok(concat(parts))
}

fn raw_parts(values: &[Value]) -> Vector<u8> {
    concat(
        values
            .iter()
            .map(|v| match v.as_vector_form().as_ref() {
                Value::RawVector(r) => r.clone().strip_attributes(),
                _ => Vector::empty(),
            })
            .collect(),
    )
}

fn combine(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let values = dots_values(&args[0]);
    let names = combined_names(&values, &dots_names(&args[0]));
    let combined = match combined_type(&values)? {
        RType::Null => return Ok(Value::Null),
        RType::Logical => Value::from(coerce_all(&values, Coercer::logical)?),
        RType::Integer => Value::from(coerce_all(&values, Coercer::integer)?),
        RType::Double => Value::from(coerce_all(&values, Coercer::double)?),
        RType::Complex => Value::from(coerce_all(&values, Coercer::complex)?),
        RType::Character => Value::from(coerce_all(&values, Coercer::character)?),
        RType::Raw => Value::from(raw_parts(&values)),
        _ => Value::from(coerce_all(&values, Coercer::list)?),
    };
    let mut combined = combined.into_vector_form();
    if let Some(names) = names {
        if let Some(attrs) = combined.attributes_mut() {
            attrs.set_names(Some(names));
        }
    }
    Ok(combined.into_scalar_form())
}

pub(crate) static COMBINE: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Combine,
    name: "c",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::dots()],
    specializations: &[Specialization {
        name: "combine",
        guard: any_shapes,
        body: combine,
    }],
    type_error: None,
};

// ==================== which, which.max, which.min ====================

fn logical_arg(s: &[ArgShape]) -> bool {
    matches!(s, [x] if x.is_logical())
}

fn numeric_arg(s: &[ArgShape]) -> bool {
    matches!(s, [x] if x.is_numeric() || *x == ArgShape::Null)
}

/// 1-based positions, named after the matching names of `names`.
fn positions(indices: Vec<usize>, names: Option<&[RString]>) -> RResult<Value> {
    let picked = names.map(|n| indices.iter().map(|i| n[*i].clone()).collect());
    let mut out = Vector::new(indices.iter().map(|i| *i as i32 + 1).collect(), true);
    out.set_names(picked)?;
    Ok(finish(out))
}

fn which(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let x = Coercer::strict().logical(&args[0])?;
    let indices = x
        .iter()
        .enumerate()
        .filter(|(_, l)| **l == Logical::True)
        .map(|(i, _)| i)
        .collect();
    positions(indices, x.names())
}

fn which_extreme(args: &[Value], max: bool) -> RResult<Value> {
    let x = doubles_of(&args[0])?;
    let mut best: Option<(usize, f64)> = None;
    for (i, d) in x.iter().enumerate() {
        if d.is_nan() {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, b)) if max => *d > b,
            Some((_, b)) => *d < b,
        };
        if better {
            best = Some((i, *d));
        }
    }
    positions(best.map(|(i, _)| i).into_iter().collect(), x.names())
}

fn which_max(_: &mut Session, args: &[Value]) -> RResult<Value> {
    which_extreme(args, true)
}

fn which_min(_: &mut Session, args: &[Value]) -> RResult<Value> {
    which_extreme(args, false)
}

pub(crate) static WHICH: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Which,
    name: "which",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "which",
        guard: logical_arg,
        body: which,
    }],
    type_error: Some("argument to 'which' is not logical"),
};

pub(crate) static WHICH_MAX: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::WhichMax,
    name: "which.max",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "which_max",
        guard: numeric_arg,
        body: which_max,
    }],
    type_error: Some("invalid 'x' argument"),
};

pub(crate) static WHICH_MIN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::WhichMin,
    name: "which.min",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "which_min",
        guard: numeric_arg,
        body: which_min,
    }],
    type_error: Some("invalid 'x' argument"),
};

// ==================== rowMeans, colMeans ====================

fn matrix_args(s: &[ArgShape]) -> bool {
    matches!(s, [x, m, n, flag]
        if x.is_numeric() && m.is_integer() && n.is_integer() && flag.is_logical())
}

/// Means over the rows (`by_row`) or columns of the column-major `m` x `n`
/// matrix held in `args[0]`.
fn means(args: &[Value], by_row: bool) -> RResult<Value> {
    let x = doubles_of(&args[0])?;
    let m = int_arg(&args[1], "n")?;
    let n = int_arg(&args[2], "p")?;
    if m == INT_NA || m < 0 {
        return Err(invalid_arg("n"));
    }
    if n == INT_NA || n < 0 {
        return Err(invalid_arg("p"));
    }
    let na_rm = flag_arg(&args[3], "na.rm")?;
    let (m, n) = (m as usize, n as usize);
    if x.len() < m * n {
        return Err(RError::value_error("'x' is too short"));
    }
    let data = x.as_slice();
    let (outer, inner) = if by_row { (m, n) } else { (n, m) };
    let result: Vec<f64> = (0..outer)
        .map(|k| {
            let cells = (0..inner).map(|j| if by_row { data[k + j * m] } else { data[j + k * m] });
            if na_rm {
                let (sum, count) = cells
                    .filter(|d| !d.is_nan())
                    .fold((0.0, 0usize), |(s, c), d| (s + d, c + 1));
                sum / count as f64
            } else {
                let mut sum = 0.0;
                // the first missing cell decides between NA and NaN
                for d in cells {
                    if d.is_na() {
                        return DOUBLE_NA;
                    }
                    if d.is_nan() {
                        return f64::NAN;
                    }
                    sum += d;
                }
                sum / inner as f64
            }
        })
        .collect();
    Ok(finish(Vector::from_vec(result)))
}

fn row_means(_: &mut Session, args: &[Value]) -> RResult<Value> {
    means(args, true)
}

fn col_means(_: &mut Session, args: &[Value]) -> RResult<Value> {
    means(args, false)
}

pub(crate) static ROW_MEANS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::RowMeans,
    name: "rowMeans",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("X"),
        Parameter::new("m").cast(ArgCast::ToInteger),
        Parameter::new("n").cast(ArgCast::ToInteger),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[Specialization {
        name: "row_means",
        guard: matrix_args,
        body: row_means,
    }],
    type_error: Some("'x' must be numeric"),
};

pub(crate) static COL_MEANS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::ColMeans,
    name: "colMeans",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("X"),
        Parameter::new("m").cast(ArgCast::ToInteger),
        Parameter::new("n").cast(ArgCast::ToInteger),
        Parameter::new("na.rm").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[Specialization {
        name: "col_means",
        guard: matrix_args,
        body: col_means,
    }],
    type_error: Some("'x' must be numeric"),
};

// ==================== length ====================

fn length(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let n = args[0].len();
    Ok(match i32::try_from(n) {
        Ok(n) => Value::Integer(n),
        Err(_) => Value::Double(n as f64),
    })
}

pub(crate) static LENGTH: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Length,
    name: "length",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "length",
        guard: any_shapes,
        body: length,
    }],
    type_error: None,
};
