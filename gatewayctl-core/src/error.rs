use thiserror::Error;

/// Unified error taxonomy for GatewayCtl.
///
/// Each variant corresponds to one of the error kinds in the control-plane
/// error handling design: Validation/Conflict/NotFound surface to the admin
/// caller verbatim, Durable-store is generic'd to "internal error" on the
/// wire but logged with full detail, and Translation is a fatal programmer
/// error — the write that triggered it is always rolled back.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("durable store error: {0}")]
    Store(String),

    #[error("translation invariant violated for record {record_id}: {reason}")]
    Translation { record_id: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

/// One field-level validation error, as returned in the `errors[]` array of
/// the error envelope.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl CoreError {
    /// Map to an HTTP status code for the admin façade.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Validation(_) => 400,
            CoreError::Conflict(_) => 409,
            CoreError::NotFound(_) => 404,
            CoreError::Store(_) => 500,
            CoreError::Translation { .. } => 500,
            CoreError::Internal(_) => 500,
        }
    }

    /// Structured error envelope, per §7: `{message, errors?}`.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            CoreError::Validation(errors) => ErrorEnvelope {
                status: "error",
                message: "validation failed".to_string(),
                errors: errors.clone(),
            },
            other => ErrorEnvelope { status: "error", message: other.to_string(), errors: vec![] },
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
    pub errors: Vec<FieldError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(CoreError::Validation(vec![]).status_code(), 400);
        assert_eq!(CoreError::Conflict("x".into()).status_code(), 409);
        assert_eq!(CoreError::NotFound("x".into()).status_code(), 404);
        assert_eq!(CoreError::Store("x".into()).status_code(), 500);
        assert_eq!(
            CoreError::Translation { record_id: "r1".into(), reason: "bad".into() }.status_code(),
            500
        );
    }

    #[test]
    fn validation_envelope_carries_field_errors() {
        let err = CoreError::Validation(vec![FieldError::new("context", "must start with /")]);
        let envelope = err.to_envelope();
        assert_eq!(envelope.message, "validation failed");
        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(envelope.errors[0].field, "context");
    }

    #[test]
    fn non_validation_envelope_has_no_field_errors() {
        let err = CoreError::NotFound("cfg-1".into());
        let envelope = err.to_envelope();
        assert!(envelope.errors.is_empty());
        assert!(envelope.message.contains("cfg-1"));
    }
}
