/**
 * Status classification (spec §4.3).
 *
 * A `Transport::send` either succeeds, or fails with an HTTP status code,
 * or fails without ever reaching the server (a transport-level error, which
 * this module folds into a synthetic "unknown" status). The classification
 * of which statuses are worth retrying lives here, in one place, so the
 * worker's retry loop and the self-observability counters agree on it.
 */
use super::TransportError;

pub type TransportStatus = i32;

pub const STATUS_OK: TransportStatus = 200;
pub const STATUS_UNKNOWN: TransportStatus = -1;
pub const STATUS_REQUEST_TIMEOUT: TransportStatus = 408;
pub const STATUS_GATEWAY_TIMEOUT: TransportStatus = 504;
pub const STATUS_NETWORK_READ_TIMEOUT: TransportStatus = 598;

/// Statuses worth resubmitting the same batch for (spec §4.3). Notably
/// excludes 429 — a rate limit is a signal to back off, not to retry the
/// same instant, and the core has no backoff scheduler to honor it with.
const RETRYABLE_STATUSES: &[TransportStatus] = &[
    STATUS_UNKNOWN,
    STATUS_REQUEST_TIMEOUT,
    STATUS_GATEWAY_TIMEOUT,
    STATUS_NETWORK_READ_TIMEOUT,
];

pub fn is_retryable(status: TransportStatus) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Reduces a `send` outcome to a single status code for counters and retry
/// decisions. `Ok(())` always classifies as 200; a transport error that
/// never reached the server classifies as -1.
pub fn classify(result: &Result<(), TransportError>) -> TransportStatus {
    match result {
        Ok(()) => STATUS_OK,
        Err(TransportError::Request(_)) => STATUS_UNKNOWN,
        Err(TransportError::TooManyRequests(code)) => *code as TransportStatus,
        Err(TransportError::Api(code)) => *code as TransportStatus,
    }
}

/// Human-readable label for a status, used in self-metrics dimensions.
pub fn reason_phrase(status: TransportStatus) -> String {
    if status == STATUS_UNKNOWN {
        return "unknown".to_string();
    }
    u16::try_from(status)
        .ok()
        .and_then(|code| http::StatusCode::from_u16(code).ok())
        .and_then(|code| code.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_not_retryable() {
        assert!(!is_retryable(STATUS_OK));
    }

    #[test]
    fn unknown_and_timeouts_are_retryable() {
        assert!(is_retryable(STATUS_UNKNOWN));
        assert!(is_retryable(STATUS_REQUEST_TIMEOUT));
        assert!(is_retryable(STATUS_GATEWAY_TIMEOUT));
        assert!(is_retryable(STATUS_NETWORK_READ_TIMEOUT));
    }

    #[test]
    fn rate_limit_is_terminal() {
        assert!(!is_retryable(429));
    }

    #[test]
    fn classify_success() {
        assert_eq!(classify(&Ok(())), STATUS_OK);
    }

    #[test]
    fn classify_request_error_is_unknown() {
        let err: Result<(), TransportError> = Err(TransportError::Request("timed out".into()));
        assert_eq!(classify(&err), STATUS_UNKNOWN);
    }

    #[test]
    fn classify_api_error_carries_status() {
        let err: Result<(), TransportError> = Err(TransportError::Api(500));
        assert_eq!(classify(&err), 500);
    }

    #[test]
    fn reason_phrase_known_code() {
        assert_eq!(reason_phrase(404), "Not Found");
    }

    #[test]
    fn reason_phrase_unknown_status() {
        assert_eq!(reason_phrase(STATUS_UNKNOWN), "unknown");
    }
}
