use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{format} serialization error: {message}")]
    SerializationError { format: String, message: String },

    #[error("Invalid configuration record: {format} parsing error: {message}")]
    ParseError { format: String, message: String },

    #[error("Invalid configuration record: missing required field '{field}'")]
    MissingConfigError { field: String },

    #[error("Invalid configuration record: invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration record: unresolvable template placeholder '{placeholder}' in '{field}'")]
    TemplateError { field: String, placeholder: String },

    #[error("Invalid easystack file: {message}")]
    EasyStackError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Format,
    Schema,
    Template,
    EasyStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RecordError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RecordError::IoError(_) => ErrorCategory::Io,
            RecordError::ParseError { .. } | RecordError::SerializationError { .. } => {
                ErrorCategory::Format
            }
            RecordError::MissingConfigError { .. }
            | RecordError::InvalidConfigValueError { .. } => ErrorCategory::Schema,
            RecordError::TemplateError { .. } => ErrorCategory::Template,
            RecordError::EasyStackError { .. } => ErrorCategory::EasyStack,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Critical,
            ErrorCategory::Format
            | ErrorCategory::EasyStack
            | ErrorCategory::Schema
            | ErrorCategory::Template => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RecordError::IoError(_) => {
                "Check that the file exists and is readable".to_string()
            }
            RecordError::SerializationError { .. } => {
                "Report the record that failed to serialize".to_string()
            }
            RecordError::ParseError { format, .. } => {
                format!("Make sure the file is valid {} and uses the record layout", format)
            }
            RecordError::MissingConfigError { field } => {
                format!("Add the '{}' field to the record", field)
            }
            RecordError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}'", field)
            }
            RecordError::TemplateError { .. } => {
                "Use one of the supported templates such as %(name)s, %(namelower)s or %(version)s"
                    .to_string()
            }
            RecordError::EasyStackError { .. } => {
                "Check the 'software' / 'toolchains' / 'versions' layout of the easystack file"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RecordError::IoError(e) => format!("Could not read file: {}", e),
            RecordError::MissingConfigError { field } => {
                format!("The record is missing the required field '{}'", field)
            }
            RecordError::TemplateError { field, placeholder } => format!(
                "'{}' uses the template '{}' which cannot be resolved",
                field, placeholder
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = RecordError::MissingConfigError {
            field: "name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration record: missing required field 'name'"
        );
        assert_eq!(err.category(), ErrorCategory::Schema);
        assert!(err.recovery_suggestion().contains("name"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: RecordError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
