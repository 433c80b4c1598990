use thiserror::Error;

#[derive(Debug, Error)]
pub enum HervError {
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("invalid {field} '{value}': expected one of {allowed:?}")]
    InvalidEnumeration {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("invalid range for {field}: {message}")]
    InvalidRange { field: String, message: String },
    #[error("invalid distribution: {message}")]
    InvalidDistribution { message: String },
    #[error("dangling reference: {field} -> {target} does not exist")]
    DanglingReference { field: String, target: String },
    #[error("duplicate association: chain {chain_id} already links ltr {ltr_id}")]
    DuplicateAssociation { chain_id: i32, ltr_id: i32 },
    #[error("duplicate singleton: {message}")]
    DuplicateSingleton { message: String },
    #[error("config error: {message}")]
    Config { message: String },
}

impl HervError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_enumeration(
        field: impl Into<String>,
        value: impl Into<String>,
        allowed: &[&str],
    ) -> Self {
        Self::InvalidEnumeration {
            field: field.into(),
            value: value.into(),
            allowed: allowed.iter().map(|item| item.to_string()).collect(),
        }
    }

    pub fn invalid_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRange {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_distribution(message: impl Into<String>) -> Self {
        Self::InvalidDistribution {
            message: message.into(),
        }
    }

    pub fn dangling(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self::DanglingReference {
            field: field.into(),
            target: target.into(),
        }
    }

    pub fn duplicate_singleton(message: impl Into<String>) -> Self {
        Self::DuplicateSingleton {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type HervResult<T> = Result<T, HervError>;

impl From<sea_orm::DbErr> for HervError {
    fn from(value: sea_orm::DbErr) -> Self {
        HervError::storage(value.to_string())
    }
}
