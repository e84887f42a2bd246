//! Element types and their NA sentinels.
//!
//! Each atomic element type reserves one value meaning "missing":
//!
//! | type      | sentinel                                   |
//! |-----------|--------------------------------------------|
//! | integer   | `i32::MIN`                                 |
//! | double    | NaN with low word 1954 (`0x7FF00000000007A2`) |
//! | logical   | [`Logical::NA`]                            |
//! | complex   | either part is the double NA               |
//! | character | [`RString::na()`] (no backing string)      |
//!
//! Raw bytes have no NA.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::types::RType;

pub const INT_NA: i32 = i32::MIN;

pub const DOUBLE_NA_BITS: u64 = 0x7FF0_0000_0000_07A2;

/// The double NA. Compare with [`is_double_na`], never with `==`.
pub const DOUBLE_NA: f64 = f64::from_bits(DOUBLE_NA_BITS);

const NA_LOW_WORD: u64 = 1954;

/// True for the double NA, including payloads quieted by arithmetic.
#[inline]
pub fn is_double_na(x: f64) -> bool {
    x.is_nan() && (x.to_bits() & 0xFFFF_FFFF) == NA_LOW_WORD
}

/// NaN that is not NA.
#[inline]
pub fn is_plain_nan(x: f64) -> bool {
    x.is_nan() && !is_double_na(x)
}

/// Three-valued logical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logical {
    False,
    True,
    NA,
}

impl Logical {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Logical::True
        } else {
            Logical::False
        }
    }

    /// `None` for NA.
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Logical::True => Some(true),
            Logical::False => Some(false),
            Logical::NA => None,
        }
    }

    /// Integer representation: TRUE = 1, FALSE = 0, NA = `INT_NA`.
    pub fn as_int(self) -> i32 {
        match self {
            Logical::True => 1,
            Logical::False => 0,
            Logical::NA => INT_NA,
        }
    }

    pub fn and(self, other: Logical) -> Self {
        match (self, other) {
            (Logical::False, _) | (_, Logical::False) => Logical::False,
            (Logical::True, Logical::True) => Logical::True,
            _ => Logical::NA,
        }
    }

    pub fn or(self, other: Logical) -> Self {
        match (self, other) {
            (Logical::True, _) | (_, Logical::True) => Logical::True,
            (Logical::False, Logical::False) => Logical::False,
            _ => Logical::NA,
        }
    }
}

impl From<bool> for Logical {
    fn from(b: bool) -> Self {
        Logical::from_bool(b)
    }
}

impl fmt::Display for Logical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logical::True => write!(f, "TRUE"),
            Logical::False => write!(f, "FALSE"),
            Logical::NA => write!(f, "NA"),
        }
    }
}

/// Complex number element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RComplex {
    pub re: f64,
    pub im: f64,
}

impl RComplex {
    pub fn new(re: f64, im: f64) -> Self {
        RComplex { re, im }
    }

    pub fn na() -> Self {
        RComplex {
            re: DOUBLE_NA,
            im: 0.0,
        }
    }

    pub fn is_na(&self) -> bool {
        is_double_na(self.re) || is_double_na(self.im)
    }

    pub fn modulus(&self) -> f64 {
        self.re.hypot(self.im)
    }
}

impl fmt::Display for RComplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_na() {
            return write!(f, "NA");
        }
        let re = crate::convert::double_to_string(self.re);
        if self.im < 0.0 || (self.im == 0.0 && self.im.is_sign_negative()) {
            let im = crate::convert::double_to_string(-self.im);
            write!(f, "{}-{}i", re, im)
        } else {
            let im = crate::convert::double_to_string(self.im);
            write!(f, "{}+{}i", re, im)
        }
    }
}

/// Character element. `None` is the NA string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RString(Option<Rc<str>>);

impl RString {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        RString(Some(Rc::from(s.as_ref())))
    }

    pub fn na() -> Self {
        RString(None)
    }

    pub fn is_na(&self) -> bool {
        self.0.is_none()
    }

    /// `None` for NA.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Text with NA printed as `"NA"`.
    pub fn as_display_str(&self) -> &str {
        self.0.as_deref().unwrap_or("NA")
    }
}

impl From<&str> for RString {
    fn from(s: &str) -> Self {
        RString::new(s)
    }
}

impl From<String> for RString {
    fn from(s: String) -> Self {
        RString(Some(Rc::from(s)))
    }
}

impl From<Option<&str>> for RString {
    fn from(s: Option<&str>) -> Self {
        s.map(RString::new).unwrap_or_else(RString::na)
    }
}

impl fmt::Display for RString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_display_str())
    }
}

/// An element type that can live in a [`Vector`](crate::vector::Vector).
pub trait Element: Clone + fmt::Debug + 'static {
    /// Vector type holding this element.
    const TYPE: RType;

    fn na() -> Self;

    fn is_na(&self) -> bool;

    /// `identical()` semantics: NA equals NA, NaN equals NaN.
    fn identical(&self, other: &Self) -> bool;
}

impl Element for Logical {
    const TYPE: RType = RType::Logical;

    fn na() -> Self {
        Logical::NA
    }

    fn is_na(&self) -> bool {
        *self == Logical::NA
    }

    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

impl Element for i32 {
    const TYPE: RType = RType::Integer;

    fn na() -> Self {
        INT_NA
    }

    fn is_na(&self) -> bool {
        *self == INT_NA
    }

    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

impl Element for f64 {
    const TYPE: RType = RType::Double;

    fn na() -> Self {
        DOUBLE_NA
    }

    fn is_na(&self) -> bool {
        is_double_na(*self)
    }

    fn identical(&self, other: &Self) -> bool {
        identical_double(*self, *other)
    }
}

impl Element for RComplex {
    const TYPE: RType = RType::Complex;

    fn na() -> Self {
        RComplex::na()
    }

    fn is_na(&self) -> bool {
        RComplex::is_na(self)
    }

    fn identical(&self, other: &Self) -> bool {
        if self.is_na() || other.is_na() {
            return self.is_na() && other.is_na();
        }
        identical_double(self.re, other.re) && identical_double(self.im, other.im)
    }
}

impl Element for RString {
    const TYPE: RType = RType::Character;

    fn na() -> Self {
        RString::na()
    }

    fn is_na(&self) -> bool {
        RString::is_na(self)
    }

    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

impl Element for u8 {
    const TYPE: RType = RType::Raw;

    fn na() -> Self {
        0
    }

    fn is_na(&self) -> bool {
        false
    }

    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

fn identical_double(a: f64, b: f64) -> bool {
    match (is_double_na(a), is_double_na(b)) {
        (true, true) => true,
        (false, false) => (a.is_nan() && b.is_nan()) || a == b,
        _ => false,
    }
}

/// Total order used by `max`/`min` on strings. NA sorts last.
pub fn compare_strings(a: &RString, b: &RString) -> Ordering {
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, _) => Ordering::Greater,
        (_, None) => Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_na_is_not_plain_nan() {
        assert!(is_double_na(DOUBLE_NA));
        assert!(!is_double_na(f64::NAN));
        assert!(is_plain_nan(f64::NAN));
        assert!(!is_plain_nan(DOUBLE_NA));
        assert!(!is_double_na(1.0));
    }

    #[test]
    fn test_double_na_survives_arithmetic() {
        let x = std::hint::black_box(DOUBLE_NA) + 1.0;
        assert!(x.is_nan());
        assert!(is_double_na(x));
    }

    #[test]
    fn test_complex_na() {
        assert!(RComplex::na().is_na());
        assert!(RComplex::new(1.0, DOUBLE_NA).is_na());
        assert!(!RComplex::new(1.0, f64::NAN).is_na());
        assert_eq!(RComplex::new(1.0, -2.0).to_string(), "1-2i");
        assert_eq!(RComplex::new(1.5, 2.0).to_string(), "1.5+2i");
    }

    #[test]
    fn test_logical_three_valued() {
        assert_eq!(Logical::NA.and(Logical::False), Logical::False);
        assert_eq!(Logical::NA.and(Logical::True), Logical::NA);
        assert_eq!(Logical::NA.or(Logical::True), Logical::True);
        assert_eq!(Logical::NA.as_int(), INT_NA);
    }

    #[test]
    fn test_rstring_na() {
        let na = RString::na();
        assert!(na.is_na());
        assert_eq!(na.as_str(), None);
        assert_eq!(na.to_string(), "NA");
        // the text "NA" is not the NA string
        assert!(!RString::from("NA").is_na());
    }

    #[test]
    fn test_identical() {
        assert!(DOUBLE_NA.identical(&DOUBLE_NA));
        assert!(f64::NAN.identical(&f64::NAN));
        assert!(!DOUBLE_NA.identical(&f64::NAN));
        assert!(1.0f64.identical(&1.0));
    }
}
