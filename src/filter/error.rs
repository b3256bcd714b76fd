use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Unsupported operator '{operator}' on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Cannot mix included and excluded fields: {0}")]
    MixedProjection(String),
}
