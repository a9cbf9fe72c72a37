//! Variable definitions.

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavType {
    /// 8-byte IEEE float.
    Numeric,
    /// Fixed-width string of `width` bytes.
    String { width: usize },
}

impl SavType {
    /// Number of 8-byte slots one segment of this type occupies in a case.
    #[must_use]
    pub fn slots(self) -> usize {
        match self {
            Self::Numeric => 1,
            Self::String { width } => width.div_ceil(8).max(1),
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric)
    }
}

/// Calendar interpretation of a numeric variable's display format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Date,
    DateTime,
}

/// Packed print/write format: `(type << 16) | (width << 8) | decimals`.
///
/// | Code | Format   | Code | Format   |
/// |------|----------|------|----------|
/// | 1    | A        | 22   | DATETIME |
/// | 5    | F        | 23   | ADATE    |
/// | 20   | DATE     | 24   | JDATE    |
/// | 21   | TIME     | 28   | MOYR     |
/// | 38   | EDATE    | 39   | SDATE    |
/// | 41   | YMDHMS   | 29/30| QYR/WKYR |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintFormat {
    pub type_code: u8,
    pub width: u8,
    pub decimals: u8,
}

impl PrintFormat {
    /// Plain numeric `F{width}.{decimals}`.
    #[must_use]
    pub const fn numeric(width: u8, decimals: u8) -> Self {
        Self {
            type_code: 5,
            width,
            decimals,
        }
    }

    /// String `A{width}`.
    #[must_use]
    pub const fn string(width: u8) -> Self {
        Self {
            type_code: 1,
            width,
            decimals: 0,
        }
    }

    /// `DATE11` (dd-mmm-yyyy).
    #[must_use]
    pub const fn date() -> Self {
        Self {
            type_code: 20,
            width: 11,
            decimals: 0,
        }
    }

    /// `DATETIME20`.
    #[must_use]
    pub const fn datetime() -> Self {
        Self {
            type_code: 22,
            width: 20,
            decimals: 0,
        }
    }

    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        let bytes = raw.to_be_bytes();
        Self {
            type_code: bytes[1],
            width: bytes[2],
            decimals: bytes[3],
        }
    }

    #[must_use]
    pub fn to_raw(self) -> i32 {
        i32::from_be_bytes([0, self.type_code, self.width, self.decimals])
    }

    /// Calendar meaning of the format, if any.
    #[must_use]
    pub fn temporal(self) -> Option<Temporal> {
        match self.type_code {
            20 | 23 | 24 | 28 | 29 | 30 | 38 | 39 => Some(Temporal::Date),
            22 | 41 => Some(Temporal::DateTime),
            _ => None,
        }
    }
}

/// Declared user-missing values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MissingValues {
    #[default]
    None,
    /// Up to three discrete numeric codes.
    Discrete(Vec<f64>),
    /// Inclusive numeric range with an optional extra discrete code.
    Range {
        low: f64,
        high: f64,
        discrete: Option<f64>,
    },
    /// Up to three discrete string codes (first 8 bytes only).
    Strings(Vec<String>),
}

impl MissingValues {
    /// Whether a numeric value is declared missing.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        match self {
            Self::None | Self::Strings(_) => false,
            Self::Discrete(codes) => codes.contains(&value),
            Self::Range {
                low,
                high,
                discrete,
            } => (*low..=*high).contains(&value) || *discrete == Some(value),
        }
    }
}

/// A variable as presented to callers: continuation records and very long
/// string segments are already folded into a single entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SavVariable {
    /// Long variable name (falls back to the short name).
    pub name: String,
    /// 8-byte dictionary name.
    pub short_name: String,
    /// Variable label.
    pub label: Option<String>,
    pub var_type: SavType,
    pub print_format: PrintFormat,
    pub missing: MissingValues,
}

impl SavVariable {
    /// Create a numeric variable with `F8.2` display.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: String::new(),
            label: None,
            var_type: SavType::Numeric,
            print_format: PrintFormat::numeric(8, 2),
            missing: MissingValues::None,
        }
    }

    /// Create a string variable of the given byte width.
    pub fn string(name: impl Into<String>, width: usize) -> Self {
        let display = u8::try_from(width.min(255)).unwrap_or(u8::MAX);
        Self {
            name: name.into(),
            short_name: String::new(),
            label: None,
            var_type: SavType::String { width },
            print_format: PrintFormat::string(display),
            missing: MissingValues::None,
        }
    }

    /// Set the variable label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the display format.
    #[must_use]
    pub fn with_format(mut self, format: PrintFormat) -> Self {
        self.print_format = format;
        self
    }

    /// Set the user-missing declaration.
    #[must_use]
    pub fn with_missing(mut self, missing: MissingValues) -> Self {
        self.missing = missing;
        self
    }

    /// Calendar meaning of a numeric variable.
    #[must_use]
    pub fn temporal(&self) -> Option<Temporal> {
        if self.var_type.is_numeric() {
            self.print_format.temporal()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_format_packing() {
        let format = PrintFormat::from_raw(0x0005_0802);
        assert_eq!(format, PrintFormat::numeric(8, 2));
        assert_eq!(format.to_raw(), 0x0005_0802);
    }

    #[test]
    fn test_temporal_formats() {
        assert_eq!(PrintFormat::date().temporal(), Some(Temporal::Date));
        assert_eq!(PrintFormat::datetime().temporal(), Some(Temporal::DateTime));
        assert_eq!(PrintFormat::numeric(8, 0).temporal(), None);
        let adate = PrintFormat {
            type_code: 23,
            width: 10,
            decimals: 0,
        };
        assert_eq!(adate.temporal(), Some(Temporal::Date));
    }

    #[test]
    fn test_string_slots() {
        assert_eq!(SavType::String { width: 1 }.slots(), 1);
        assert_eq!(SavType::String { width: 8 }.slots(), 1);
        assert_eq!(SavType::String { width: 9 }.slots(), 2);
        assert_eq!(SavType::Numeric.slots(), 1);
    }

    #[test]
    fn test_missing_ranges() {
        let missing = MissingValues::Range {
            low: 97.0,
            high: 99.0,
            discrete: Some(-1.0),
        };
        assert!(missing.contains(98.0));
        assert!(missing.contains(-1.0));
        assert!(!missing.contains(1.0));
        assert!(!MissingValues::None.contains(0.0));
    }
}
