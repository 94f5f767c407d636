use thiserror::Error;

/// Errors surfaced by the simulation core and the parameter loaders.
#[derive(Error, Debug)]
pub enum SimError {
    /// Speed conversions are only tabulated between 0 and 20 000 m.
    #[error("altitude {altitude:.1} m is outside the speed-conversion table (0-20000 m)")]
    OutOfRange { altitude: f64 },

    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameters { field: &'static str, reason: String },

    #[error("no missile named `{0}` in catalog")]
    UnknownMissile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameters { field, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_altitude() {
        let e = SimError::OutOfRange { altitude: 20001.0 };
        assert!(e.to_string().contains("20001.0"));
    }

    #[test]
    fn invalid_parameter_message_names_field() {
        let e = SimError::invalid("mass", "must be positive");
        assert_eq!(e.to_string(), "invalid parameter `mass`: must be positive");
    }
}
