//! Character builtins: `substr`, `charmatch`, `nchar`, `tolower`, `toupper`.
//!
//! Positions count characters, not bytes.

use subset_r_vm_runtime::attributes::Attributes;
use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::recycle::recycle;
use subset_r_vm_runtime::{RError, RResult, RString, Value, Vector, INT_NA};

use crate::builtins::{
    ArgCast, BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{finish, ints_of, invalid_arg, map_elements, string_arg, strings_of};

// ==================== substr ====================

fn character_and_positions(s: &[ArgShape]) -> bool {
    matches!(s, [x, start, stop]
        if (x.is_character() || *x == ArgShape::Null) && start.is_integer() && stop.is_integer())
}

/// Characters `start..=stop` (1-based) of `s`, clipped to the string.
fn substring(s: &str, start: i32, stop: i32) -> String {
    let len = s.chars().count() as i64;
    let first = i64::from(start).max(1);
    let last = i64::from(stop).min(len);
    if first > last {
        return String::new();
    }
    s.chars()
        .skip((first - 1) as usize)
        .take((last - first + 1) as usize)
        .collect()
}

fn substr(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let x = strings_of(&args[0])?;
    if x.is_empty() {
        return Ok(Value::StringVector(Vector::empty()));
    }
    let (start, stop) = (ints_of(&args[1])?, ints_of(&args[2])?);
    if start.is_empty() || stop.is_empty() {
        return Err(RError::value_error("invalid substring arguments"));
    }
    let rec = recycle(&[x.len(), start.len(), stop.len()]);
    let (xs, ss, es) = (x.as_slice(), start.as_slice(), stop.as_slice());
    let mut complete = true;
    let data: Vec<RString> = (0..rec.len())
        .map(|i| {
            let (s, a, b) = (&xs[rec.index(0, i)], ss[rec.index(1, i)], es[rec.index(2, i)]);
            match s.as_str() {
                Some(s) if a != INT_NA && b != INT_NA => RString::from(substring(s, a, b)),
                _ => {
                    complete = false;
                    RString::na()
                }
            }
        })
        .collect();
    let attributes = if rec.len() == x.len() {
        x.attributes().clone()
    } else {
        Attributes::new()
    };
    Ok(finish(Vector::new(data, complete).with_attributes(attributes)))
}

pub(crate) static SUBSTR: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Substr,
    name: "substr",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("start").cast(ArgCast::ToInteger),
        Parameter::new("stop").cast(ArgCast::ToInteger),
    ],
    specializations: &[Specialization {
        name: "substr",
        guard: character_and_positions,
        body: substr,
    }],
    type_error: Some("extracting substrings from a non-character object"),
};

// ==================== charmatch ====================

fn charmatch_args(s: &[ArgShape]) -> bool {
    matches!(s, [x, table, nomatch]
        if (x.is_atomic() || x.is_absent())
            && (table.is_atomic() || table.is_absent())
            && nomatch.is_integer())
}

/// 1-based index of the match of `x` in `table`, 0 when ambiguous.
///
/// An exact match wins over prefix matches but must itself be unique.
fn charmatch_one(x: &str, table: &[RString]) -> Option<i32> {
    let mut exact: Option<usize> = None;
    let mut exact_count = 0;
    let mut partial: Option<usize> = None;
    let mut partial_count = 0;
    for (j, entry) in table.iter().enumerate() {
        let t = entry.as_display_str();
        if t == x {
            exact_count += 1;
            exact = Some(j);
        } else if t.starts_with(x) {
            partial_count += 1;
            partial = Some(j);
        }
    }
    match (exact_count, partial_count) {
        (1, _) => exact.map(|j| j as i32 + 1),
        (0, 1) => partial.map(|j| j as i32 + 1),
        (0, 0) => None,
        _ => Some(0),
    }
}

fn charmatch(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let mut coercer = Coercer::lenient();
    let x = coercer.character(&args[0])?;
    let table = coercer.character(&args[1])?;
    let nomatch = ints_of(&args[2])?.get(0).copied().unwrap_or(INT_NA);
    let data: Vec<i32> = x
        .iter()
        .map(|s| charmatch_one(s.as_display_str(), table.as_slice()).unwrap_or(nomatch))
        .collect();
    Ok(finish(Vector::from_vec(data)))
}

pub(crate) static CHARMATCH: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::CharMatch,
    name: "charmatch",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("table"),
        Parameter::new("nomatch")
            .optional(ParamDefault::IntegerNa)
            .cast(ArgCast::ToInteger),
    ],
    specializations: &[Specialization {
        name: "charmatch",
        guard: charmatch_args,
        body: charmatch,
    }],
    type_error: Some("argument is not of mode character"),
};

// ==================== nchar ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountType {
    Bytes,
    Chars,
    Width,
}

impl CountType {
    /// Accepts any unique prefix of the type names.
    fn parse(name: &str) -> RResult<CountType> {
        let candidates = [
            ("bytes", CountType::Bytes),
            ("chars", CountType::Chars),
            ("width", CountType::Width),
        ];
        candidates
            .iter()
            .find(|(full, _)| !name.is_empty() && full.starts_with(name))
            .map(|(_, t)| *t)
            .ok_or_else(|| invalid_arg("type"))
    }

    fn count(self, s: &str) -> i32 {
        let n = match self {
            CountType::Bytes => s.len(),
            CountType::Chars | CountType::Width => s.chars().count(),
        };
        i32::try_from(n).unwrap_or(INT_NA)
    }
}

fn nchar_args(s: &[ArgShape]) -> bool {
    matches!(s, [x, t, keep]
        if (x.is_atomic() || x.is_absent()) && *x != ArgShape::Factor
            && t.is_character() && keep.is_logical())
}

fn nchar(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let count_type = CountType::parse(&string_arg(&args[1], "type")?)?;
    let keep_na = match &args[2] {
        Value::Logical(l) => l.to_bool(),
        _ => None,
    };
    // NA counts as NA for chars and width by default, as 2 for bytes
    let na_count = match keep_na {
        Some(true) => INT_NA,
        Some(false) => 2,
        None if count_type == CountType::Bytes => 2,
        None => INT_NA,
    };
    let x = Coercer::lenient().keep_attributes(true).character(&args[0])?;
    let mut out =
        map_elements(&x, |s: &RString| count_type.count(s.as_display_str())).strip_attributes();
    if na_count != INT_NA {
        for (i, s) in x.iter().enumerate() {
            if s.is_na() {
                out.set(i, na_count)?;
            }
        }
        out.recompute_complete();
    }
    let mut attributes = Attributes::new();
    attributes.set_names(x.names().map(<[RString]>::to_vec));
    attributes.set_dim_unchecked(x.dim().map(<[i32]>::to_vec));
    attributes.set_dimnames(x.attributes().dimnames().cloned());
    Ok(finish(out.with_attributes(attributes)))
}

pub(crate) static NCHAR: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Nchar,
    name: "nchar",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("type").optional(ParamDefault::Str("chars")),
        Parameter::new("keepNA").optional(ParamDefault::LogicalNa),
    ],
    specializations: &[Specialization {
        name: "nchar",
        guard: nchar_args,
        body: nchar,
    }],
    type_error: Some("'nchar()' requires a character vector"),
};

// ==================== tolower, toupper ====================

fn character_arg(s: &[ArgShape]) -> bool {
    matches!(s, [x] if x.is_character())
}

fn tolower(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let x = strings_of(&args[0])?;
    Ok(finish(map_elements(&x, |s: &RString| {
        RString::from(s.as_display_str().to_lowercase())
    })))
}

fn toupper(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let x = strings_of(&args[0])?;
    Ok(finish(map_elements(&x, |s: &RString| {
        RString::from(s.as_display_str().to_uppercase())
    })))
}

pub(crate) static TOLOWER: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::ToLower,
    name: "tolower",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "tolower",
        guard: character_arg,
        body: tolower,
    }],
    type_error: Some("non-character argument"),
};

pub(crate) static TOUPPER: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::ToUpper,
    name: "toupper",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "toupper",
        guard: character_arg,
        body: toupper,
    }],
    type_error: Some("non-character argument"),
};
