//! Copy-on-write vectors with a completeness flag.

use std::rc::Rc;

use crate::attributes::{validate_dim, Attributes};
use crate::error::{RError, RResult};
use crate::na::{Element, RString};

/// An atomic (or list) vector.
///
/// `complete == true` guarantees that no element is NA. `false` only means
/// the absence of NA was never proven. Storage is shared between clones and
/// copied on the first write through [`Vector::data_mut`] or
/// [`Vector::set`].
#[derive(Debug, Clone)]
pub struct Vector<T: Element> {
    data: Rc<Vec<T>>,
    complete: bool,
    attributes: Attributes,
}

impl<T: Element> Vector<T> {
    /// Build a vector from data whose completeness the caller already knows
    /// (normally from an [`NaCheck`](crate::na_check::NaCheck)).
    pub fn new(data: Vec<T>, complete: bool) -> Self {
        debug_assert!(
            !complete || data.iter().all(|x| !x.is_na()),
            "vector claimed complete but holds NA"
        );
        Vector {
            data: Rc::new(data),
            complete,
            attributes: Attributes::new(),
        }
    }

    /// Build a vector, scanning once to establish completeness.
    pub fn from_vec(data: Vec<T>) -> Self {
        let complete = data.iter().all(|x| !x.is_na());
        Vector {
            data: Rc::new(data),
            complete,
            attributes: Attributes::new(),
        }
    }

    pub fn empty() -> Self {
        Vector::new(Vec::new(), true)
    }

    /// A vector of `len` NA elements.
    pub fn na(len: usize) -> Self {
        Vector::new(vec![T::na(); len], len == 0)
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        self.data.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// More than one owner holds the storage; writing must copy first.
    pub fn is_shared(&self) -> bool {
        Rc::strong_count(&self.data) > 1
    }

    /// Mutable access to the elements. Copies shared storage first and
    /// drops the completeness proof, since the caller may write NA.
    pub fn data_mut(&mut self) -> &mut Vec<T> {
        self.complete = false;
        Rc::make_mut(&mut self.data)
    }

    /// Write one element, copying shared storage first.
    pub fn set(&mut self, i: usize, value: T) -> RResult<()> {
        let len = self.len();
        if i >= len {
            return Err(RError::value_error(format!(
                "subscript out of bounds: {} of {}",
                i + 1,
                len
            )));
        }
        if value.is_na() {
            self.complete = false;
        }
        Rc::make_mut(&mut self.data)[i] = value;
        Ok(())
    }

    /// Rescan the data and restore the completeness flag.
    pub fn recompute_complete(&mut self) {
        self.complete = self.data.iter().all(|x| !x.is_na());
    }

    pub fn count_na(&self) -> usize {
        if self.complete {
            return 0;
        }
        self.data.iter().filter(|x| x.is_na()).count()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn take_attributes(&mut self) -> Attributes {
        std::mem::take(&mut self.attributes)
    }

    pub fn strip_attributes(mut self) -> Self {
        self.attributes = Attributes::new();
        self
    }

    pub fn names(&self) -> Option<&[RString]> {
        self.attributes.names()
    }

    /// Set names, padding a short vector with NA. Longer names are an error.
    pub fn set_names(&mut self, names: Option<Vec<RString>>) -> RResult<()> {
        let Some(mut names) = names else {
            self.attributes.set_names(None);
            return Ok(());
        };
        if names.len() > self.len() {
            return Err(RError::value_error(format!(
                "'names' attribute [{}] must be the same length as the vector [{}]",
                names.len(),
                self.len()
            )));
        }
        names.resize(self.len(), RString::na());
        self.attributes.set_names(Some(names));
        Ok(())
    }

    pub fn dim(&self) -> Option<&[i32]> {
        self.attributes.dim()
    }

    /// Set or clear dimensions. Setting validates against the length;
    /// clearing also drops dimnames.
    pub fn set_dim(&mut self, dim: Option<Vec<i32>>) -> RResult<()> {
        match dim {
            Some(d) => {
                validate_dim(&d, self.len())?;
                self.attributes.set_dim_unchecked(Some(d));
            }
            None => {
                self.attributes.set_dim_unchecked(None);
                self.attributes.set_dimnames(None);
            }
        }
        Ok(())
    }

    /// Elementwise map with NA handled by the caller-supplied function.
    pub fn map<U, F>(&self, f: F) -> Vector<U>
    where
        U: Element,
        F: FnMut(&T) -> U,
    {
        Vector::from_vec(self.data.iter().map(f).collect())
    }

    /// Structural equality with `identical()` semantics on elements.
    pub fn identical(&self, other: &Vector<T>) -> bool {
        self.len() == other.len()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.identical(b))
            && self.attributes == other.attributes
    }
}

impl<T: Element> From<Vec<T>> for Vector<T> {
    fn from(data: Vec<T>) -> Self {
        Vector::from_vec(data)
    }
}

impl<T: Element> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}
