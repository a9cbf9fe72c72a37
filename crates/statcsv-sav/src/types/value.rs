//! Cell values and value labels.

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SavValue {
    /// Numeric value; `None` for system-missing and declared user-missing.
    Num(Option<f64>),
    /// String value with trailing padding removed.
    Str(String),
}

impl SavValue {
    /// Create a numeric value.
    #[must_use]
    pub fn numeric(value: f64) -> Self {
        Self::Num(Some(value))
    }

    /// Create a missing numeric value.
    #[must_use]
    pub fn missing() -> Self {
        Self::Num(None)
    }

    /// Create a string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Numeric content, if this is a present numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(value) => *value,
            Self::Str(_) => None,
        }
    }

    /// String content, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            Self::Num(_) => None,
        }
    }
}

/// The coded side of a value label.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelValue {
    Num(f64),
    Str(String),
}

impl std::fmt::Display for LabelValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

/// One value label record and the variables it applies to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueLabelSet {
    /// `(code, label)` pairs in record order.
    pub labels: Vec<(LabelValue, String)>,
    /// Indices into [`SavFile::variables`](crate::SavFile::variables).
    pub variables: Vec<usize>,
}

impl ValueLabelSet {
    /// Create a label set applied to the given variables.
    #[must_use]
    pub fn new(variables: Vec<usize>) -> Self {
        Self {
            labels: Vec::new(),
            variables,
        }
    }

    /// Add a numeric code.
    #[must_use]
    pub fn with_numeric(mut self, code: f64, label: impl Into<String>) -> Self {
        self.labels.push((LabelValue::Num(code), label.into()));
        self
    }

    /// Add a string code.
    #[must_use]
    pub fn with_string(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels
            .push((LabelValue::Str(code.into()), label.into()));
        self
    }
}
