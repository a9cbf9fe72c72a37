//! Variable definitions.

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtaType {
    Byte,
    Int,
    Long,
    Float,
    Double,
    /// Fixed-width string of `width` bytes.
    Str(u16),
    /// Long string stored in the `<strls>` section (format 117+).
    StrL,
}

impl DtaType {
    /// Bytes the type occupies in one observation.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Int => 2,
            Self::Long | Self::Float => 4,
            Self::Double | Self::StrL => 8,
            Self::Str(width) => usize::from(width),
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Str(_) | Self::StrL)
    }

    /// Type code used by formats 111-115.
    pub(crate) fn from_legacy_code(code: u8) -> Option<Self> {
        match code {
            1..=244 => Some(Self::Str(u16::from(code))),
            251 => Some(Self::Byte),
            252 => Some(Self::Int),
            253 => Some(Self::Long),
            254 => Some(Self::Float),
            255 => Some(Self::Double),
            _ => None,
        }
    }

    /// Type code used by formats 104-110 (`b i l f d`, strings offset by 127).
    pub(crate) fn from_old_code(code: u8) -> Option<Self> {
        match code {
            b'b' => Some(Self::Byte),
            b'i' => Some(Self::Int),
            b'l' => Some(Self::Long),
            b'f' => Some(Self::Float),
            b'd' => Some(Self::Double),
            128..=255 => Some(Self::Str(u16::from(code - 127))),
            _ => None,
        }
    }

    pub(crate) fn legacy_code(self) -> Option<u8> {
        match self {
            Self::Str(width @ 1..=244) => u8::try_from(width).ok(),
            Self::Byte => Some(251),
            Self::Int => Some(252),
            Self::Long => Some(253),
            Self::Float => Some(254),
            Self::Double => Some(255),
            Self::Str(_) | Self::StrL => None,
        }
    }

    /// Type code used by formats 117-119.
    pub(crate) fn from_tagged_code(code: u16) -> Option<Self> {
        match code {
            1..=2045 => Some(Self::Str(code)),
            32768 => Some(Self::StrL),
            65526 => Some(Self::Double),
            65527 => Some(Self::Float),
            65528 => Some(Self::Long),
            65529 => Some(Self::Int),
            65530 => Some(Self::Byte),
            _ => None,
        }
    }

    pub(crate) fn tagged_code(self) -> u16 {
        match self {
            Self::Str(width) => width,
            Self::StrL => 32768,
            Self::Double => 65526,
            Self::Float => 65527,
            Self::Long => 65528,
            Self::Int => 65529,
            Self::Byte => 65530,
        }
    }
}

/// Calendar meaning of a display format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    /// `%td` / `%d`: days since 1960-01-01.
    Date,
    /// `%tc` / `%tC`: milliseconds since 1960-01-01 00:00.
    DateTime,
}

/// A dataset variable.
#[derive(Debug, Clone, PartialEq)]
pub struct DtaVariable {
    pub name: String,
    pub var_type: DtaType,
    /// Display format, e.g. `%9.0g` or `%td`.
    pub format: String,
    /// Variable label.
    pub label: Option<String>,
    /// Name of the value label set attached to this variable.
    pub value_labels: Option<String>,
}

impl DtaVariable {
    /// Create a variable with the default format for its type.
    pub fn new(name: impl Into<String>, var_type: DtaType) -> Self {
        let format = match var_type {
            DtaType::Byte | DtaType::Int => "%8.0g".to_string(),
            DtaType::Long => "%12.0g".to_string(),
            DtaType::Float => "%9.0g".to_string(),
            DtaType::Double => "%10.0g".to_string(),
            DtaType::Str(width) => format!("%{width}s"),
            DtaType::StrL => "%9s".to_string(),
        };
        Self {
            name: name.into(),
            var_type,
            format,
            label: None,
            value_labels: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Attach a value label set by name.
    #[must_use]
    pub fn with_value_labels(mut self, name: impl Into<String>) -> Self {
        self.value_labels = Some(name.into());
        self
    }

    /// Calendar meaning of a numeric variable's format.
    #[must_use]
    pub fn temporal(&self) -> Option<Temporal> {
        if !self.var_type.is_numeric() {
            return None;
        }
        let format = self.format.strip_prefix('%')?.trim_start_matches('-');
        if format.starts_with("td") || format.starts_with('d') {
            Some(Temporal::Date)
        } else if format.starts_with("tc") || format.starts_with("tC") {
            Some(Temporal::DateTime)
        } else {
            None
        }
    }
}
