//! NA tracking while building result vectors.
//!
//! A builtin enables the tracker for every input that is not known to be
//! complete, checks each input element it reads, and records every output
//! element it produces through a path that can yield NA (conversions,
//! overflow). At the end [`NaCheck::never_seen_na`] is the `complete` flag
//! of the result.
//!
//! ```
//! use subset_r_vm_runtime::na_check::NaCheck;
//! use subset_r_vm_runtime::vector::Vector;
//!
//! let input = Vector::from_vec(vec![1.0, 4.0, 9.0]);
//! let mut na = NaCheck::new();
//! na.enable(!input.is_complete());
//! let out: Vec<f64> = input
//!     .iter()
//!     .map(|x| if na.check(x) { *x } else { x.sqrt() })
//!     .collect();
//! let result = Vector::new(out, na.never_seen_na());
//! assert!(result.is_complete());
//! ```

use crate::convert;
use crate::na::{is_double_na, Element, Logical, RComplex, RString, DOUBLE_NA, INT_NA};
use crate::vector::Vector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaCheck {
    enabled: bool,
    seen_na: bool,
}

impl NaCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn checking on if `may_have_na`. Never turns it off.
    pub fn enable(&mut self, may_have_na: bool) {
        self.enabled |= may_have_na;
    }

    pub fn enable_vector<T: Element>(&mut self, v: &Vector<T>) {
        self.enable(!v.is_complete());
    }

    pub fn enable_value<T: Element>(&mut self, x: &T) {
        self.enable(x.is_na());
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check an input element. Returns true and records when it is NA.
    ///
    /// With checking disabled the inputs are known complete and this is
    /// always false.
    #[inline]
    pub fn check<T: Element>(&mut self, x: &T) -> bool {
        if self.enabled && x.is_na() {
            self.seen_na = true;
            return true;
        }
        false
    }

    /// Like [`check`](Self::check) for doubles, but NaN counts as NA too.
    #[inline]
    pub fn check_nan(&mut self, x: f64) -> bool {
        if self.enabled && x.is_nan() {
            self.seen_na = true;
            return true;
        }
        false
    }

    /// Record an output element regardless of the enabled state.
    #[inline]
    pub fn record<T: Element>(&mut self, x: &T) {
        if x.is_na() {
            self.enabled = true;
            self.seen_na = true;
        }
    }

    /// Record that an NA was produced.
    pub fn seen_na(&mut self) {
        self.enabled = true;
        self.seen_na = true;
    }

    pub fn never_seen_na(&self) -> bool {
        !self.seen_na
    }

    pub fn convert_logical_to_int(&mut self, x: Logical) -> i32 {
        if x == Logical::NA {
            self.seen_na();
        }
        x.as_int()
    }

    pub fn convert_logical_to_double(&mut self, x: Logical) -> f64 {
        match x.to_bool() {
            Some(b) => b as i32 as f64,
            None => {
                self.seen_na();
                DOUBLE_NA
            }
        }
    }

    pub fn convert_int_to_double(&mut self, x: i32) -> f64 {
        if x == INT_NA {
            self.seen_na();
            DOUBLE_NA
        } else {
            x as f64
        }
    }

    pub fn convert_int_to_logical(&mut self, x: i32) -> Logical {
        if x == INT_NA {
            self.seen_na();
            Logical::NA
        } else {
            Logical::from_bool(x != 0)
        }
    }

    pub fn convert_double_to_logical(&mut self, x: f64) -> Logical {
        if x.is_nan() {
            self.seen_na();
            Logical::NA
        } else {
            Logical::from_bool(x != 0.0)
        }
    }

    /// Truncating conversion. NA, NaN and out-of-range values give NA; the
    /// second element of the result flags out-of-range input.
    pub fn convert_double_to_int(&mut self, x: f64) -> (i32, bool) {
        if x.is_nan() {
            self.seen_na();
            return (INT_NA, false);
        }
        match convert::double_to_int(x) {
            Some(i) => (i, false),
            None => {
                self.seen_na();
                (INT_NA, true)
            }
        }
    }

    pub fn convert_int_to_complex(&mut self, x: i32) -> RComplex {
        if x == INT_NA {
            self.seen_na();
            RComplex::na()
        } else {
            RComplex::new(x as f64, 0.0)
        }
    }

    pub fn convert_double_to_complex(&mut self, x: f64) -> RComplex {
        if is_double_na(x) {
            self.seen_na();
            RComplex::na()
        } else {
            RComplex::new(x, 0.0)
        }
    }

    pub fn convert_int_to_string(&mut self, x: i32) -> RString {
        if x == INT_NA {
            self.seen_na();
            RString::na()
        } else {
            RString::from(x.to_string())
        }
    }

    pub fn convert_double_to_string(&mut self, x: f64) -> RString {
        if is_double_na(x) {
            self.seen_na();
            RString::na()
        } else {
            RString::from(convert::double_to_string(x))
        }
    }

    pub fn convert_logical_to_string(&mut self, x: Logical) -> RString {
        if x == Logical::NA {
            self.seen_na();
            RString::na()
        } else {
            RString::from(x.to_string())
        }
    }

    /// Parse a string as a double. Unparsable text gives `None`; the NA
    /// string gives NA.
    pub fn convert_string_to_double(&mut self, x: &RString) -> Option<f64> {
        let result = match x.as_str() {
            None => Some(DOUBLE_NA),
            Some(s) => convert::string_to_double(s),
        };
        if let Some(d) = result {
            if is_double_na(d) {
                self.seen_na();
            }
        }
        result
    }
}
