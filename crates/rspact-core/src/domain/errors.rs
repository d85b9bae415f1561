use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PactResult<T> = Result<T, PactError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PactErrorCategory {
    OutOfRange,
    IllegalState,
    DeserializeFormat,
    Io,
}

impl PactErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfRange => "OutOfRange",
            Self::IllegalState => "IllegalState",
            Self::DeserializeFormat => "DeserializeFormat",
            Self::Io => "Io",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::OutOfRange => 2,
            Self::IllegalState => 3,
            Self::DeserializeFormat => 4,
            Self::Io => 5,
        }
    }
}

impl Display for PactErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Error raised by every fallible operation in the crate.
///
/// `placeholder` is a stable dotted code (for example `FLUX.GROUP_UNKNOWN`)
/// that scripts can match on without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PactError {
    category: PactErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl PactError {
    pub fn new(
        category: PactErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn out_of_range(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PactErrorCategory::OutOfRange, placeholder, message)
    }

    pub fn illegal_state(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PactErrorCategory::IllegalState, placeholder, message)
    }

    pub fn deserialize_format(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PactErrorCategory::DeserializeFormat, placeholder, message)
    }

    pub fn io(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PactErrorCategory::Io, placeholder, message)
    }

    pub const fn category(&self) -> PactErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}

impl Display for PactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.category, self.placeholder, self.message)
    }
}

impl Error for PactError {}

#[cfg(test)]
mod tests {
    use super::{PactError, PactErrorCategory};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (PactErrorCategory::OutOfRange, 2, "OutOfRange"),
            (PactErrorCategory::IllegalState, 3, "IllegalState"),
            (PactErrorCategory::DeserializeFormat, 4, "DeserializeFormat"),
            (PactErrorCategory::Io, 5, "Io"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn error_renders_placeholder_and_message() {
        let error = PactError::out_of_range("FLUX.GROUP_UNKNOWN", "group 13 is not a valid group");

        assert_eq!(error.category(), PactErrorCategory::OutOfRange);
        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [FLUX.GROUP_UNKNOWN] group 13 is not a valid group"
        );
        assert_eq!(
            error.to_string(),
            "OutOfRange [FLUX.GROUP_UNKNOWN] group 13 is not a valid group"
        );
    }
}
