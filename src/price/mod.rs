//! Defensive price normalization.
//!
//! Coerces user-supplied prices (numbers, or strings such as `"€ 1.234,56"`,
//! `"$1,234.56"`, `"12,5"`) into an `f64`. This is a heuristic rather than a
//! locale-aware parser: it aims to read common currency strings correctly and
//! returns `None` for anything it cannot make sense of.
//!
//! Separator rules:
//! - both `,` and `.` present: whichever occurs last is the decimal point, the
//!   other is grouping and is dropped;
//! - only `,` present: exactly three characters after the last comma means
//!   grouping (`1,234` is 1234), anything else means decimal (`12,5` is 12.5);
//! - extra dots after the first are folded into the fraction (`1.2.3` is 1.23).
//!
//! Native numbers are returned as they are, except NaN and infinities, which
//! yield `None` like any other unusable input. A digit string too long to fit
//! an `f64` overflows to infinity and is rejected the same way.

use serde_json::Value;

const CURRENCY_SYMBOLS: [char; 5] = ['£', '$', '€', '¥', '₹'];

/// Types that can be normalized into a price.
pub trait Normalize {
    fn normalize(&self) -> Option<f64>;
}

/// Normalize any supported input into a price.
pub fn normalize<T: Normalize + ?Sized>(raw: &T) -> Option<f64> {
    raw.normalize()
}

/// Normalize a textual price.
pub fn normalize_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let stripped: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    let separated = disambiguate_separators(stripped);

    let cleaned: String = separated
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let folded = fold_extra_dots(cleaned);

    if matches!(folded.as_str(), "" | "-" | "." | "-.") {
        return None;
    }

    folded.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn disambiguate_separators(s: String) -> String {
    match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(comma), None) => {
            if s[comma + 1..].chars().count() == 3 {
                s.replace(',', "")
            } else {
                s.replace(',', ".")
            }
        }
        _ => s,
    }
}

fn fold_extra_dots(s: String) -> String {
    let mut parts = s.split('.');
    let head = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    if rest.len() < 2 {
        return s;
    }
    format!("{}.{}", head, rest.concat())
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl Normalize for str {
    fn normalize(&self) -> Option<f64> {
        normalize_str(self)
    }
}

impl Normalize for String {
    fn normalize(&self) -> Option<f64> {
        normalize_str(self)
    }
}

impl Normalize for f64 {
    fn normalize(&self) -> Option<f64> {
        finite(*self)
    }
}

impl Normalize for f32 {
    fn normalize(&self) -> Option<f64> {
        finite(f64::from(*self))
    }
}

macro_rules! normalize_integer {
    ($($ty:ty),*) => {
        $(
            impl Normalize for $ty {
                fn normalize(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

normalize_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// Booleans count as numbers at the trust boundary (true is 1, false is 0).
impl Normalize for bool {
    fn normalize(&self) -> Option<f64> {
        Some(if *self { 1.0 } else { 0.0 })
    }
}

impl<T: Normalize> Normalize for Option<T> {
    fn normalize(&self) -> Option<f64> {
        self.as_ref().and_then(Normalize::normalize)
    }
}

impl<T: Normalize + ?Sized> Normalize for &T {
    fn normalize(&self) -> Option<f64> {
        (**self).normalize()
    }
}

impl Normalize for Value {
    fn normalize(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(flag) => flag.normalize(),
            Value::Number(number) => number.as_f64().and_then(finite),
            Value::String(text) => normalize_str(text),
            Value::Array(_) | Value::Object(_) => normalize_str(&self.to_string()),
        }
    }
}
