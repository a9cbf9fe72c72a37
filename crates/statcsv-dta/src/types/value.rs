//! Cell values.

/// A single decoded cell; `None` marks any Stata missing value (`.`, `.a`-`.z`).
#[derive(Debug, Clone, PartialEq)]
pub enum DtaValue {
    Byte(Option<i8>),
    Int(Option<i16>),
    Long(Option<i32>),
    Float(Option<f32>),
    Double(Option<f64>),
    Str(String),
}

impl DtaValue {
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Byte(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
            Self::Long(v) => v.is_none(),
            Self::Float(v) => v.is_none(),
            Self::Double(v) => v.is_none(),
            Self::Str(_) => false,
        }
    }

    /// Numeric content widened to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Byte(v) => v.map(f64::from),
            Self::Int(v) => v.map(f64::from),
            Self::Long(v) => v.map(f64::from),
            Self::Float(v) => v.map(f64::from),
            Self::Double(v) => *v,
            Self::Str(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}
