/// Validation errors for domain value objects and configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // BucketName validation errors
    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),

    // AccessControl validation errors
    UnknownAccessControl(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // BucketName errors
            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, and hyphens allowed",
                    c
                )
            }

            ValidationError::UnknownAccessControl(value) => {
                write!(
                    f,
                    "Unknown access control '{}' (expected: private, public-read, public-read-write, default)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for crate::domain::errors::StorageError {
    fn from(err: ValidationError) -> Self {
        crate::domain::errors::StorageError::ValidationError {
            message: err.to_string(),
        }
    }
}
