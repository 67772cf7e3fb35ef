use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Form fields a user can leave blank or fill with bad text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Weight,
    Height,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Date => write!(f, "date"),
            Field::Weight => write!(f, "weight"),
            Field::Height => write!(f, "height"),
        }
    }
}

/// Failures reported by the record store, BMI calculator and chart builders.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Please enter a {0}")]
    MissingField(Field),
    #[error("Please enter a valid date (YYYY-MM-DD), got '{0}'")]
    InvalidDate(String),
    #[error("The {field} must be a positive number, got '{text}'")]
    InvalidNumber { field: Field, text: String },
    #[error("No records found")]
    EmptyInput,
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("Database unavailable: {0}")]
    StoreUnavailable(String),
}

impl TrackerError {
    /// `true` for conditions caused by what the user typed or by an empty
    /// table, as opposed to a failing database.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            TrackerError::Storage(_) | TrackerError::StoreUnavailable(_)
        )
    }
}
