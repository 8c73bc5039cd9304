//! Error types for quantity parsing, unit linking and conversion.
//!
//! The parser itself fails soft: unparseable slots come back as `None` and
//! the overall result carries `success = Some(false)`. Errors are raised
//! only by strict mode, the conversion entry points and registry loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuinexError {
    /// Strict-mode promotion of a soft parse failure.
    #[error("failed to parse quantity span: {text:?}")]
    ParseFailed { text: String },

    /// A unit surface that could not be linked to any unit class.
    #[error("unknown unit: {0:?}")]
    UnknownUnit(String),

    /// A conversion between incompatible or underspecified units.
    #[error("cannot convert from {from:?} to {to:?}: {reason}")]
    Conversion {
        from: String,
        to: String,
        reason: String,
    },

    /// Currency conversion without a year on either side and no default.
    #[error("currency conversion requires a year for both sides, either attached to the unit or as a default")]
    MissingCurrencyYear,

    /// Currency conversion requested but no converter service configured.
    #[error("no currency converter configured")]
    NoCurrencyConverter,

    /// A lookup table could not be read from disk.
    #[error("failed to read lookup table {path}")]
    LookupIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A lookup table did not match the expected JSON schema.
    #[error("failed to decode lookup table {path}")]
    LookupFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl QuinexError {
    pub fn conversion(from: impl Into<String>, to: impl Into<String>, reason: impl Into<String>) -> Self {
        QuinexError::Conversion {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }
}
