//! Vector attributes and their propagation rules.
//!
//! `names`, `dim`, `dimnames` and `class` have dedicated slots; every other
//! attribute ("regular" attributes) lives in an insertion-ordered list.

use std::rc::Rc;

use crate::error::{RError, RResult};
use crate::na::RString;
use crate::value::Value;
use crate::vector::Vector;

pub const NAMES: &str = "names";
pub const DIM: &str = "dim";
pub const DIMNAMES: &str = "dimnames";
pub const CLASS: &str = "class";
pub const LEVELS: &str = "levels";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    names: Option<Rc<[RString]>>,
    dim: Option<Rc<[i32]>>,
    dimnames: Option<Box<Value>>,
    class: Option<Rc<[RString]>>,
    regular: Vec<(String, Value)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_none()
            && self.dim.is_none()
            && self.dimnames.is_none()
            && self.class.is_none()
            && self.regular.is_empty()
    }

    pub fn names(&self) -> Option<&[RString]> {
        self.names.as_deref()
    }

    pub fn set_names(&mut self, names: Option<Vec<RString>>) {
        self.names = names.map(Rc::from);
    }

    pub fn dim(&self) -> Option<&[i32]> {
        self.dim.as_deref()
    }

    /// Stores `dim` without validating it against a vector length.
    /// Use [`Vector::set_dim`] for the checked version.
    pub fn set_dim_unchecked(&mut self, dim: Option<Vec<i32>>) {
        self.dim = dim.map(Rc::from);
    }

    pub fn dimnames(&self) -> Option<&Value> {
        self.dimnames.as_deref()
    }

    pub fn set_dimnames(&mut self, dimnames: Option<Value>) {
        self.dimnames = dimnames.map(Box::new);
    }

    pub fn class(&self) -> Option<&[RString]> {
        self.class.as_deref()
    }

    pub fn set_class(&mut self, class: Option<Vec<RString>>) {
        self.class = class.filter(|c| !c.is_empty()).map(Rc::from);
    }

    pub fn inherits(&self, class: &str) -> bool {
        self.class()
            .map(|c| c.iter().any(|s| s.as_str() == Some(class)))
            .unwrap_or(false)
    }

    /// Look up any attribute, reserved ones included.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            NAMES => self.names.as_ref().map(|n| Value::string_vec_from(n.to_vec())),
            DIM => self.dim.as_ref().map(|d| Value::int_vec(d.to_vec())),
            DIMNAMES => self.dimnames.as_deref().cloned(),
            CLASS => self.class.as_ref().map(|c| Value::string_vec_from(c.to_vec())),
            _ => self
                .regular
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
        }
    }

    /// Set a regular attribute; `None` removes it. Reserved keys must go
    /// through their typed setters.
    pub fn set_regular(&mut self, name: &str, value: Option<Value>) {
        debug_assert!(!is_reserved(name));
        match value {
            Some(v) => {
                if let Some(slot) = self.regular.iter_mut().find(|(k, _)| k == name) {
                    slot.1 = v;
                } else {
                    self.regular.push((name.to_string(), v));
                }
            }
            None => self.regular.retain(|(k, _)| k != name),
        }
    }

    pub fn regular(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.regular.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All attribute names in `attributes()` order: names first, then
    /// dim, dimnames, the regular attributes, and class last.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if self.names.is_some() {
            keys.push(NAMES.to_string());
        }
        if self.dim.is_some() {
            keys.push(DIM.to_string());
        }
        if self.dimnames.is_some() {
            keys.push(DIMNAMES.to_string());
        }
        keys.extend(self.regular.iter().map(|(k, _)| k.clone()));
        if self.class.is_some() {
            keys.push(CLASS.to_string());
        }
        keys
    }

    /// Copy the regular attributes of `source`, overwriting equal keys.
    pub fn copy_regular_from(&mut self, source: &Attributes) {
        for (k, v) in &source.regular {
            self.set_regular(k, Some(v.clone()));
        }
    }

    /// Drop names, dim and dimnames, keeping class and regular attributes.
    pub fn drop_shape(&mut self) {
        self.names = None;
        self.dim = None;
        self.dimnames = None;
    }
}

pub fn is_reserved(name: &str) -> bool {
    matches!(name, NAMES | DIM | DIMNAMES | CLASS)
}

/// Check a `dim` vector against the length of the object it annotates.
pub fn validate_dim(dim: &[i32], len: usize) -> RResult<()> {
    if dim.is_empty() {
        return Err(RError::value_error("length-0 dimension vector is invalid"));
    }
    if dim.iter().any(|d| *d < 0 || *d == crate::na::INT_NA) {
        return Err(RError::value_error(
            "the dims contain missing or negative values",
        ));
    }
    if dim_product(dim) != Some(len as i64) {
        return Err(dim_mismatch(dim, len));
    }
    Ok(())
}

/// Product of the extents, or `None` when it does not fit an `i64`.
fn dim_product(dim: &[i32]) -> Option<i64> {
    dim.iter()
        .try_fold(1i64, |acc, d| acc.checked_mul(i64::from(*d)))
}

fn dim_mismatch(dim: &[i32], len: usize) -> RError {
    let product = match dim_product(dim) {
        Some(p) => p.to_string(),
        None => crate::convert::double_to_string(dim.iter().map(|d| f64::from(*d)).product()),
    };
    RError::value_error(format!(
        "dims [product {}] do not match the length of object [{}]",
        product, len
    ))
}

/// Attributes of a shape-preserving unary operation (elementwise map).
///
/// Everything is carried over: regular attributes, class, dim, dimnames and
/// names.
pub fn propagate_unary(source: &Attributes) -> Attributes {
    source.clone()
}

/// Attributes of a reduction. Nothing survives.
pub fn propagate_reduction(_source: &Attributes) -> Attributes {
    Attributes::new()
}

/// Attributes of an elementwise binary operation.
///
/// Regular attributes and class come from the longer operand (the first
/// one on a tie). Names come from the first operand whose length equals
/// `out_len` and that has names. Dimensions come from whichever operand has them; both having
/// different dimensions is an error.
pub fn propagate_binary<L, R>(
    left: &Vector<L>,
    right: &Vector<R>,
    out_len: usize,
) -> RResult<Attributes>
where
    L: crate::na::Element,
    R: crate::na::Element,
{
    let (la, ra) = (left.attributes(), right.attributes());
    if la.is_empty() && ra.is_empty() {
        return Ok(Attributes::new());
    }
    if let (Some(ld), Some(rd)) = (la.dim(), ra.dim()) {
        if ld != rd {
            return Err(RError::value_error("non-conformable arrays"));
        }
    }

    let source = if left.len() >= right.len() { la } else { ra };

    let mut out = Attributes::new();
    out.copy_regular_from(source);
    out.class = source.class.clone();
    out.names = if left.len() == out_len && la.names.is_some() {
        la.names.clone()
    } else if right.len() == out_len {
        ra.names.clone()
    } else {
        None
    };

    let (shape, shape_len) = if la.dim().is_some() {
        (Some(la), left.len())
    } else if ra.dim().is_some() {
        (Some(ra), right.len())
    } else {
        (None, 0)
    };
    if let Some(shape) = shape {
        if shape_len != out_len {
            return Err(dim_mismatch(shape.dim().unwrap_or(&[]), out_len));
        }
        out.dim = shape.dim.clone();
        out.dimnames = shape.dimnames.clone();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn named(len: usize) -> Vector<f64> {
        let mut v = Vector::from_vec((0..len).map(|i| i as f64).collect());
        v.attributes_mut()
            .set_names(Some((0..len).map(|i| RString::from(format!("n{}", i))).collect()));
        v
    }

    #[test]
    fn test_keys_order() {
        let mut a = Attributes::new();
        a.set_class(Some(vec![RString::from("foo")]));
        a.set_regular("units", Some(Value::from("cm")));
        a.set_dim_unchecked(Some(vec![2, 2]));
        a.set_names(Some(vec![RString::from("a")]));
        assert_eq!(a.keys(), vec!["names", "dim", "units", "class"]);
    }

    #[test]
    fn test_set_regular_removes_on_none() {
        let mut a = Attributes::new();
        a.set_regular("units", Some(Value::from("cm")));
        assert!(a.get("units").is_some());
        a.set_regular("units", None);
        assert!(a.get("units").is_none());
        assert!(a.is_empty());
    }

    #[test]
    fn test_validate_dim() {
        assert!(validate_dim(&[2, 3], 6).is_ok());
        let err = validate_dim(&[2, 3], 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dims [product 6] do not match the length of object [5]"
        );
        assert!(validate_dim(&[], 0).is_err());
        assert!(validate_dim(&[-1, 2], 2).is_err());
    }

    #[test]
    fn test_validate_dim_product_overflow() {
        let big = 1 << 30;
        let err = validate_dim(&[big, big, big, 4], 2).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Value);
        assert!(err
            .to_string()
            .ends_with("do not match the length of object [2]"));
    }

    #[test]
    fn test_binary_names_from_longer_operand() {
        let left = named(4);
        let right = named(2);
        let attrs = propagate_binary(&left, &right, 4).unwrap();
        assert_eq!(attrs.names().map(|n| n.len()), Some(4));

        // equal lengths: first operand wins
        let left = Vector::from_vec(vec![1.0, 2.0]);
        let attrs = propagate_binary(&left, &right, 2).unwrap();
        assert_eq!(
            attrs.names().map(|n| n[0].to_string()),
            Some("n0".to_string())
        );
    }

    #[test]
    fn test_binary_non_conformable() {
        let mut left = Vector::from_vec(vec![1.0; 6]);
        left.set_dim(Some(vec![2, 3])).unwrap();
        let mut right = Vector::from_vec(vec![1.0; 6]);
        right.set_dim(Some(vec![3, 2])).unwrap();
        let err = propagate_binary(&left, &right, 6).unwrap_err();
        assert_eq!(err.to_string(), "non-conformable arrays");
    }

    #[test]
    fn test_reduction_drops_everything() {
        let v = named(3);
        assert!(propagate_reduction(v.attributes()).is_empty());
    }
}
