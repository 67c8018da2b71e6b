//! Error types for permaqr operations

use thiserror::Error;

/// Result type alias using permaqr's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for permaqr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Payload does not fit the requested version / error correction level
    #[error("Failed to encode QR code: {0}")]
    Encoding(String),

    /// Payload rejected before encoding
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// Rendered image did not decode back to the payload
    #[error("Verification failed: {0}")]
    Verification(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => Error::Io(io),
            other => Error::Image(other.to_string()),
        }
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(e: qrcode::types::QrError) -> Self {
        Error::Encoding(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(format!("JSON error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_io_errors_become_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: Error = image::ImageError::IoError(io).into();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn data_too_long_is_an_encoding_error() {
        let err: Error = qrcode::types::QrError::DataTooLong.into();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
