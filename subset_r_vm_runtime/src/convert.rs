//! Type conversion utilities
//!
//! Element conversions (string parsing, number formatting) and whole-value
//! coercion along the type lattice. [`Coercer`] runs in one of two modes:
//! strict, where unparsable text is a conversion failure, and lenient, where
//! it becomes NA and a warning is collected for the caller to report.

use num_traits::ToPrimitive;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RError, RResult};
use crate::na::{is_double_na, Element, Logical, RComplex, RString, DOUBLE_NA, INT_NA};
use crate::na_check::NaCheck;
use crate::types::RType;
use crate::value::Value;
use crate::vector::Vector;

pub const NA_INTRODUCED_WARNING: &str = "NAs introduced by coercion";
pub const INT_RANGE_WARNING: &str = "NAs introduced by coercion to integer range";
pub const IMAGINARY_DISCARDED_WARNING: &str = "imaginary parts discarded in coercion";

// ==================== Element conversions ====================

/// Truncate toward zero; `None` when outside the integer range (the NA
/// pattern itself is out of range).
pub fn double_to_int(x: f64) -> Option<i32> {
    if x.is_nan() {
        return Some(INT_NA);
    }
    let t = x.trunc();
    if t <= INT_NA as f64 || t > i32::MAX as f64 {
        return None;
    }
    t.to_i32()
}

/// Parse text as a double. `Some(NA)` for `"NA"`, `None` for text that is
/// not a number.
pub fn string_to_double(s: &str) -> Option<f64> {
    let s = s.trim();
    match s {
        "NA" => return Some(DOUBLE_NA),
        "Inf" | "inf" | "+Inf" => return Some(f64::INFINITY),
        "-Inf" | "-inf" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        "" => return None,
        _ => {}
    }
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        let v = u64::from_str_radix(hex, 16).ok()?.to_f64()?;
        return Some(if negative { -v } else { v });
    }
    // reject words Rust accepts but the language does not
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let v: f64 = body.parse().ok()?;
    Some(if negative { -v } else { v })
}

/// Parse text as an integer (through double, truncating). `Some(NA)` for
/// `"NA"` and for values outside the integer range.
pub fn string_to_int(s: &str) -> Option<i32> {
    let d = string_to_double(s)?;
    if is_double_na(d) || d.is_nan() {
        return Some(INT_NA);
    }
    Some(double_to_int(d).unwrap_or(INT_NA))
}

/// `TRUE T True true` / `FALSE F False false`; `"NA"` is NA; anything
/// else is `None`.
pub fn string_to_logical(s: &str) -> Option<Logical> {
    match s.trim() {
        "TRUE" | "T" | "True" | "true" => Some(Logical::True),
        "FALSE" | "F" | "False" | "false" => Some(Logical::False),
        "NA" => Some(Logical::NA),
        _ => None,
    }
}

const NUM: &str = r"(?:(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?|Inf|NaN)";

static COMPLEX_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    let pattern = format!(
        r"^(?:(?P<re>[+-]?{n})(?P<im>[+-]{n})i|(?P<real>[+-]?{n})|(?P<imag>[+-]?{n})i)$",
        n = NUM
    );
    Regex::new(&pattern).ok()
});

/// Parse `a`, `bi`, `a+bi` or `a-bi`.
pub fn string_to_complex(s: &str) -> Option<RComplex> {
    let s = s.trim();
    if s == "NA" {
        return Some(RComplex::na());
    }
    let caps = COMPLEX_RE.as_ref()?.captures(s)?;
    let part = |name: &str| caps.name(name).and_then(|m| string_to_double(m.as_str()));
    if let (Some(re), Some(im)) = (part("re"), part("im")) {
        return Some(RComplex::new(re, im));
    }
    if let Some(re) = part("real") {
        return Some(RComplex::new(re, 0.0));
    }
    part("imag").map(|im| RComplex::new(0.0, im))
}

/// Format a double the way `as.character` does: up to 15 significant
/// digits, choosing fixed or scientific notation by width.
pub fn double_to_string(x: f64) -> String {
    if x.is_nan() {
        return if is_double_na(x) { "NA" } else { "NaN" }.to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }

    // mantissa digits and decimal exponent at 15 significant digits
    let sci = format!("{:.14e}", x.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let mut digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }
    let sign = if x < 0.0 { "-" } else { "" };

    let fixed = if exp >= 0 {
        let exp = exp as usize;
        if digits.len() <= exp + 1 {
            format!("{}{}{}", sign, digits, "0".repeat(exp + 1 - digits.len()))
        } else {
            format!("{}{}.{}", sign, &digits[..=exp], &digits[exp + 1..])
        }
    } else {
        format!("{}0.{}{}", sign, "0".repeat((-exp - 1) as usize), digits)
    };

    let scientific = {
        let m = if digits.len() > 1 {
            format!("{}.{}", &digits[..1], &digits[1..])
        } else {
            digits.clone()
        };
        let esign = if exp < 0 { '-' } else { '+' };
        format!("{}{}e{}{:02}", sign, m, esign, exp.abs())
    };

    if fixed.len() <= scientific.len() {
        fixed
    } else {
        scientific
    }
}

// ==================== Whole-value coercion ====================

/// Coerces values to a target vector type, collecting warnings.
#[derive(Debug, Clone, Default)]
pub struct Coercer {
    lenient: bool,
    keep_attributes: bool,
    warnings: Vec<&'static str>,
}

impl Coercer {
    /// Unparsable text is an error; attributes are kept.
    pub fn strict() -> Self {
        Coercer {
            lenient: false,
            keep_attributes: true,
            warnings: Vec::new(),
        }
    }

    /// Unparsable text becomes NA with a warning; attributes are dropped.
    pub fn lenient() -> Self {
        Coercer {
            lenient: true,
            keep_attributes: false,
            warnings: Vec::new(),
        }
    }

    pub fn keep_attributes(mut self, keep: bool) -> Self {
        self.keep_attributes = keep;
        self
    }

    pub fn warnings(&self) -> &[&'static str] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, msg: &'static str) {
        if !self.warnings.contains(&msg) {
            self.warnings.push(msg);
        }
    }

    fn finish<T: Element>(&self, v: Vector<T>, source: &Value) -> Vector<T> {
        match (self.keep_attributes, source.attributes()) {
            (true, Some(attrs)) => v.with_attributes(attrs.clone()),
            _ => v,
        }
    }

    fn unparsable(&mut self, text: &RString, target: &'static str) -> RResult<()> {
        if self.lenient {
            self.warn(NA_INTRODUCED_WARNING);
            Ok(())
        } else {
            Err(RError::conversion(
                format!("'{}'", text.as_display_str()),
                target,
            ))
        }
    }

    fn cannot_coerce(value: &Value, target: &'static str) -> RError {
        match value {
            Value::List(_) => RError::type_error(format!(
                "(list) object cannot be coerced to type '{}'",
                target
            )),
            other => RError::type_error(format!(
                "cannot coerce type '{}' to vector of type '{}'",
                other.type_name(),
                target
            )),
        }
    }

    /// Coerce a list to an atomic type cell by cell; every cell must be a
    /// length-1 atomic value.
    fn from_list<T, F>(
        &mut self,
        list: &Vector<Value>,
        source: &Value,
        target: &'static str,
        mut cell: F,
    ) -> RResult<Vector<T>>
    where
        T: Element,
        F: FnMut(&mut Self, &Value) -> RResult<Vector<T>>,
    {
        let mut out = Vec::with_capacity(list.len());
        for item in list.iter() {
            if !item.is_atomic() || item.len() != 1 {
                return Err(Self::cannot_coerce(source, target));
            }
            let v = cell(self, item)?;
            out.extend(v.iter().cloned());
        }
        Ok(Vector::from_vec(out))
    }

    pub fn logical(&mut self, value: &Value) -> RResult<Vector<Logical>> {
        let value = value.as_vector_form();
        let mut na = NaCheck::new();
        let out = match value.as_ref() {
            Value::Null => Vector::empty(),
            Value::LogicalVector(v) => v.clone().strip_attributes(),
            Value::IntVector(v) => {
                let data = v.iter().map(|x| na.convert_int_to_logical(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::DoubleVector(v) => {
                let data = v.iter().map(|x| na.convert_double_to_logical(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::ComplexVector(v) => {
                let data = v
                    .iter()
                    .map(|c| {
                        if c.is_na() || c.re.is_nan() || c.im.is_nan() {
                            na.seen_na();
                            Logical::NA
                        } else {
                            Logical::from_bool(c.re != 0.0 || c.im != 0.0)
                        }
                    })
                    .collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::StringVector(v) => {
                let mut data = Vec::with_capacity(v.len());
                for s in v.iter() {
                    // unrecognised words are NA even in strict mode
                    let l = s
                        .as_str()
                        .and_then(string_to_logical)
                        .unwrap_or(Logical::NA);
                    na.record(&l);
                    data.push(l);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::RawVector(v) => {
                Vector::new(v.iter().map(|b| Logical::from_bool(*b != 0)).collect(), true)
            }
            Value::List(l) => {
                return self.from_list(l, &value, "logical", |c, item| c.logical(item))
            }
            other => return Err(Self::cannot_coerce(other, "logical")),
        };
        Ok(self.finish(out, &value))
    }

    pub fn integer(&mut self, value: &Value) -> RResult<Vector<i32>> {
        let value = value.as_vector_form();
        let mut na = NaCheck::new();
        let out = match value.as_ref() {
            Value::Null => Vector::empty(),
            Value::LogicalVector(v) => {
                let data = v.iter().map(|x| na.convert_logical_to_int(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::IntVector(v) => v.clone().strip_attributes(),
            Value::DoubleVector(v) => {
                let mut range = false;
                let data = v
                    .iter()
                    .map(|x| {
                        let (i, out_of_range) = na.convert_double_to_int(*x);
                        range |= out_of_range;
                        i
                    })
                    .collect();
                if range {
                    self.warn(INT_RANGE_WARNING);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::ComplexVector(v) => {
                let mut data = Vec::with_capacity(v.len());
                for c in v.iter() {
                    if c.is_na() {
                        na.seen_na();
                        data.push(INT_NA);
                        continue;
                    }
                    if c.im != 0.0 {
                        self.warn(IMAGINARY_DISCARDED_WARNING);
                    }
                    let (i, out_of_range) = na.convert_double_to_int(c.re);
                    if out_of_range {
                        self.warn(INT_RANGE_WARNING);
                    }
                    data.push(i);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::StringVector(v) => {
                let mut data = Vec::with_capacity(v.len());
                for s in v.iter() {
                    let i = match s.as_str() {
                        None => INT_NA,
                        Some(text) => match string_to_int(text) {
                            Some(i) => i,
                            None => {
                                self.unparsable(s, "integer")?;
                                INT_NA
                            }
                        },
                    };
                    na.record(&i);
                    data.push(i);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::RawVector(v) => Vector::new(v.iter().map(|b| *b as i32).collect(), true),
            Value::List(l) => {
                return self.from_list(l, &value, "integer", |c, item| c.integer(item))
            }
            other => return Err(Self::cannot_coerce(other, "integer")),
        };
        Ok(self.finish(out, &value))
    }

    pub fn double(&mut self, value: &Value) -> RResult<Vector<f64>> {
        let value = value.as_vector_form();
        let mut na = NaCheck::new();
        let out = match value.as_ref() {
            Value::Null => Vector::empty(),
            Value::LogicalVector(v) => {
                let data = v.iter().map(|x| na.convert_logical_to_double(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::IntVector(v) => {
                let data = v.iter().map(|x| na.convert_int_to_double(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::DoubleVector(v) => v.clone().strip_attributes(),
            Value::ComplexVector(v) => {
                let mut data = Vec::with_capacity(v.len());
                for c in v.iter() {
                    if c.is_na() {
                        na.seen_na();
                        data.push(DOUBLE_NA);
                        continue;
                    }
                    if c.im != 0.0 {
                        self.warn(IMAGINARY_DISCARDED_WARNING);
                    }
                    data.push(c.re);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::StringVector(v) => {
                let mut data = Vec::with_capacity(v.len());
                for s in v.iter() {
                    let d = match na.convert_string_to_double(s) {
                        Some(d) => d,
                        None => {
                            self.unparsable(s, "double")?;
                            na.seen_na();
                            DOUBLE_NA
                        }
                    };
                    data.push(d);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::RawVector(v) => Vector::new(v.iter().map(|b| *b as f64).collect(), true),
            Value::List(l) => {
                return self.from_list(l, &value, "double", |c, item| c.double(item))
            }
            other => return Err(Self::cannot_coerce(other, "double")),
        };
        Ok(self.finish(out, &value))
    }

    pub fn complex(&mut self, value: &Value) -> RResult<Vector<RComplex>> {
        let value = value.as_vector_form();
        let mut na = NaCheck::new();
        let out = match value.as_ref() {
            Value::Null => Vector::empty(),
            Value::LogicalVector(v) => {
                let data = v
                    .iter()
                    .map(|x| na.convert_int_to_complex(x.as_int()))
                    .collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::IntVector(v) => {
                let data = v.iter().map(|x| na.convert_int_to_complex(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::DoubleVector(v) => {
                let data = v.iter().map(|x| na.convert_double_to_complex(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::ComplexVector(v) => v.clone().strip_attributes(),
            Value::StringVector(v) => {
                let mut data = Vec::with_capacity(v.len());
                for s in v.iter() {
                    let c = match s.as_str() {
                        None => RComplex::na(),
                        Some(text) => match string_to_complex(text) {
                            Some(c) => c,
                            None => {
                                self.unparsable(s, "complex")?;
                                RComplex::na()
                            }
                        },
                    };
                    na.record(&c);
                    data.push(c);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::List(l) => {
                return self.from_list(l, &value, "complex", |c, item| c.complex(item))
            }
            other => return Err(Self::cannot_coerce(other, "complex")),
        };
        Ok(self.finish(out, &value))
    }

    pub fn character(&mut self, value: &Value) -> RResult<Vector<RString>> {
        let value = value.as_vector_form();
        let mut na = NaCheck::new();
        let out = match value.as_ref() {
            Value::Null => Vector::empty(),
            Value::LogicalVector(v) => {
                let data = v.iter().map(|x| na.convert_logical_to_string(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::IntVector(v) => {
                let data = v.iter().map(|x| na.convert_int_to_string(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::DoubleVector(v) => {
                let data = v.iter().map(|x| na.convert_double_to_string(*x)).collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::ComplexVector(v) => {
                let data = v
                    .iter()
                    .map(|c| {
                        if c.is_na() {
                            na.seen_na();
                            RString::na()
                        } else {
                            RString::from(c.to_string())
                        }
                    })
                    .collect();
                Vector::new(data, na.never_seen_na())
            }
            Value::StringVector(v) => v.clone().strip_attributes(),
            Value::List(l) => {
                let mut data = Vec::with_capacity(l.len());
                for item in l.iter() {
                    let s = self.deparse_cell(item)?;
                    na.record(&s);
                    data.push(s);
                }
                Vector::new(data, na.never_seen_na())
            }
            Value::Symbol(s) => Vector::new(vec![RString::from(s.as_str())], true),
            other => return Err(Self::cannot_coerce(other, "character")),
        };
        Ok(self.finish(out, &value))
    }

    /// Character form of one list cell: a length-1 atomic prints as its
    /// element, anything longer as a `c(...)` call.
    fn deparse_cell(&mut self, item: &Value) -> RResult<RString> {
        match item {
            Value::Null => Ok(RString::from("NULL")),
            Value::Character(s) => Ok(s.clone()),
            v if v.is_atomic() && v.len() == 1 => {
                Ok(self.character(v)?.get(0).cloned().unwrap_or_else(RString::na))
            }
            v if v.is_atomic() => {
                let parts = self.character(v)?;
                let quoted = matches!(v.rtype(), RType::Character);
                let body: Vec<String> = parts
                    .iter()
                    .map(|s| match (quoted, s.as_str()) {
                        (true, Some(t)) => format!("\"{}\"", t),
                        _ => s.as_display_str().to_string(),
                    })
                    .collect();
                Ok(RString::from(format!("c({})", body.join(", "))))
            }
            other => Ok(RString::from(other.to_string())),
        }
    }

    pub fn list(&mut self, value: &Value) -> RResult<Vector<Value>> {
        let value = value.as_vector_form();
        let out = match value.as_ref() {
            Value::List(l) => l.clone().strip_attributes(),
            Value::Null => Vector::empty(),
            v if v.is_atomic() => {
                let items = (0..v.len()).filter_map(|i| v.element(i)).collect();
                Vector::new(items, true)
            }
            other => Vector::new(vec![other.clone()], true),
        };
        Ok(self.finish(out, &value))
    }

    /// Coerce to any vector type.
    pub fn coerce(&mut self, value: &Value, target: RType) -> RResult<Value> {
        if value.rtype() == RType::Raw {
            if matches!(target, RType::Character | RType::Complex) {
                return Err(Self::cannot_coerce(value, target.type_name()));
            }
            if target == RType::Raw {
                return Ok(value.clone());
            }
        }
        Ok(match target {
            RType::Logical => Value::LogicalVector(self.logical(value)?),
            RType::Integer => Value::IntVector(self.integer(value)?),
            RType::Double => Value::DoubleVector(self.double(value)?),
            RType::Complex => Value::ComplexVector(self.complex(value)?),
            RType::Character => Value::StringVector(self.character(value)?),
            RType::List => Value::List(self.list(value)?),
            RType::Null => Value::Null,
            other => {
                return Err(RError::type_error(format!(
                    "cannot coerce to type '{}'",
                    other.type_name()
                )))
            }
        })
    }
}

/// Strict coercion keeping attributes.
pub fn coerce(value: &Value, target: RType) -> RResult<Value> {
    Coercer::strict().coerce(value, target)
}
