//! Field validation.
//!
//! Generated models call one function here per declared rule. Absent
//! optional values are skipped by every rule.

use derive_more::{Deref, IntoIterator};
use std::fmt::{self, Display};

///
/// Validate
///

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

///
/// FieldError
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

///
/// ValidationErrors
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.0.iter().map(ToString::to_string).collect::<Vec<_>>();

        f.write_str(&lines.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// ----------------------------------------------------------------------
// Value views
// ----------------------------------------------------------------------

///
/// Measure
/// Length of a text, byte, or list value; `None` when absent.
///

pub trait Measure {
    fn measure(&self) -> Option<usize>;
}

impl Measure for str {
    fn measure(&self) -> Option<usize> {
        Some(self.chars().count())
    }
}

impl Measure for String {
    fn measure(&self) -> Option<usize> {
        self.as_str().measure()
    }
}

impl<T> Measure for Vec<T> {
    fn measure(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<T: Measure> Measure for Option<T> {
    fn measure(&self) -> Option<usize> {
        self.as_ref().and_then(Measure::measure)
    }
}

///
/// Numeric
///

pub trait Numeric {
    fn as_f64(&self) -> Option<f64>;
}

macro_rules! impl_numeric {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                #[allow(
                    clippy::cast_lossless,
                    clippy::cast_precision_loss,
                    clippy::unnecessary_cast
                )]
                fn as_f64(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

impl_numeric!(f32, f64, i32, i64, u32, u64);

impl<T: Numeric> Numeric for Option<T> {
    fn as_f64(&self) -> Option<f64> {
        self.as_ref().and_then(Numeric::as_f64)
    }
}

///
/// Text
///

pub trait Text {
    fn as_text(&self) -> Option<&str>;
}

impl Text for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Text for String {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl<T: Text> Text for Option<T> {
    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(Text::as_text)
    }
}

// ----------------------------------------------------------------------
// Rules
// ----------------------------------------------------------------------

fn fail(errors: &mut ValidationErrors, key: &str, message: Option<&str>, default: String) {
    errors.push(key, message.map_or(default, ToString::to_string));
}

pub fn not_empty<T: Measure + ?Sized>(
    errors: &mut ValidationErrors,
    key: &str,
    value: &T,
    message: Option<&str>,
) {
    if value.measure() == Some(0) {
        fail(errors, key, message, "must not be empty".to_string());
    }
}

pub fn min_length<T: Measure + ?Sized>(
    errors: &mut ValidationErrors,
    key: &str,
    value: &T,
    min: usize,
    message: Option<&str>,
) {
    if let Some(len) = value.measure()
        && len < min
    {
        fail(errors, key, message, format!("length {len} is below the minimum of {min}"));
    }
}

pub fn max_length<T: Measure + ?Sized>(
    errors: &mut ValidationErrors,
    key: &str,
    value: &T,
    max: usize,
    message: Option<&str>,
) {
    if let Some(len) = value.measure()
        && len > max
    {
        fail(errors, key, message, format!("length {len} exceeds the maximum of {max}"));
    }
}

pub fn min<T: Numeric + ?Sized>(
    errors: &mut ValidationErrors,
    key: &str,
    value: &T,
    min: f64,
    message: Option<&str>,
) {
    if let Some(n) = value.as_f64()
        && n < min
    {
        fail(errors, key, message, format!("{n} is below the minimum of {min}"));
    }
}

pub fn max<T: Numeric + ?Sized>(
    errors: &mut ValidationErrors,
    key: &str,
    value: &T,
    max: f64,
    message: Option<&str>,
) {
    if let Some(n) = value.as_f64()
        && n > max
    {
        fail(errors, key, message, format!("{n} exceeds the maximum of {max}"));
    }
}

pub fn one_of<T: Text + ?Sized>(
    errors: &mut ValidationErrors,
    key: &str,
    value: &T,
    choices: &[&str],
    message: Option<&str>,
) {
    if let Some(text) = value.as_text()
        && !choices.contains(&text)
    {
        fail(
            errors,
            key,
            message,
            format!("'{text}' is not one of [{}]", choices.join(", ")),
        );
    }
}
