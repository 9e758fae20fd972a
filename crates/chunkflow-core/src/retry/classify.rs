//! Classify chunk errors into retry policy error kinds.

use super::error::ChunkError;
use super::policy::ErrorKind;

/// Classify a curl error. Everything libcurl reports is a transport failure
/// except a callback-initiated abort.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_aborted_by_callback() || e.is_write_error() {
        return ErrorKind::Aborted;
    }
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    ErrorKind::Transport
}

/// Classify a chunk error into an ErrorKind.
pub fn classify(e: &ChunkError) -> ErrorKind {
    match e {
        ChunkError::Transport(ce) => classify_curl_error(ce),
        ChunkError::Truncated { .. } => ErrorKind::Transport,
        ChunkError::Http(code) => ErrorKind::Http(*code),
        ChunkError::Overlong { .. } => ErrorKind::Protocol,
        ChunkError::Aborted => ErrorKind::Aborted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_are_not_transport() {
        assert_eq!(classify(&ChunkError::Http(404)), ErrorKind::Http(404));
        assert_eq!(classify(&ChunkError::Http(503)), ErrorKind::Http(503));
        assert!(!classify(&ChunkError::Http(500)).is_retryable());
    }

    #[test]
    fn truncation_is_transport() {
        let e = ChunkError::Truncated {
            expected: 10,
            received: 4,
        };
        assert_eq!(classify(&e), ErrorKind::Transport);
        assert!(classify(&e).is_retryable());
    }

    #[test]
    fn overlong_and_abort_stop() {
        let e = ChunkError::Overlong {
            expected: 10,
            received: 100,
        };
        assert!(!classify(&e).is_retryable());
        assert!(!classify(&ChunkError::Aborted).is_retryable());
    }

    #[test]
    fn curl_error_codes() {
        // CURLE_COULDNT_CONNECT
        assert_eq!(classify_curl_error(&curl::Error::new(7)), ErrorKind::Transport);
        // CURLE_OPERATION_TIMEDOUT
        assert_eq!(classify_curl_error(&curl::Error::new(28)), ErrorKind::Timeout);
        // CURLE_ABORTED_BY_CALLBACK
        assert_eq!(classify_curl_error(&curl::Error::new(42)), ErrorKind::Aborted);
    }
}
