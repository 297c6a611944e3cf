use std::error::Error;
use std::fmt::{Display, Formatter};

pub type XasResult<T> = Result<T, XasError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XasErrorCategory {
    Success,
    InputValidationError,
    TypeMismatchError,
    LookupError,
    IoSystemError,
    ComputationError,
}

impl XasErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::TypeMismatchError => 3,
            Self::LookupError => 4,
            Self::IoSystemError => 5,
            Self::ComputationError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::TypeMismatchError => "TypeMismatchError",
            Self::LookupError => "LookupError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XasError {
    category: XasErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl XasError {
    pub fn new(
        category: XasErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            XasErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn type_mismatch(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::TypeMismatchError, placeholder, message)
    }

    pub fn lookup(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::LookupError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XasErrorCategory::ComputationError, placeholder, message)
    }

    pub const fn category(&self) -> XasErrorCategory {
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
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for XasError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for XasError {}
