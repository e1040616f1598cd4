//! Shared protocol constants for the HFTP line transport

// Line delimiter for requests and responses
pub const EOL: &str = "\r\n";

// Bytes requested from the transport per read
pub const RECV_CHUNK: usize = 4096;

// Maximum buffered request bytes without a delimiter (64KB) - prevents
// memory exhaustion by a client that never terminates its line
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

// Server defaults (match the reference deployment)
pub const DEFAULT_ADDR: &str = "localhost";
pub const DEFAULT_PORT: u16 = 19500;
pub const DEFAULT_DIR: &str = "testdata";

// Command names as they appear on the wire
pub mod command {
    pub const GET_FILE_LISTING: &str = "get_file_listing";
    pub const GET_METADATA: &str = "get_metadata";
    pub const GET_SLICE: &str = "get_slice";
    pub const QUIT: &str = "quit";
}

// Centralized timeout constants
pub mod timeouts {
    use std::time::Duration;

    // Idle read timeout; 0 disables it (the reference server waits forever)
    pub const IDLE_SECS: u64 = 0;

    // Convert a configured idle timeout into an optional deadline
    pub fn idle_timeout(secs: u64) -> Option<Duration> {
        if secs == 0 {
            None
        } else {
            Some(Duration::from_secs(secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_timeout_zero_disables() {
        assert!(timeouts::idle_timeout(0).is_none());
        assert_eq!(
            timeouts::idle_timeout(30),
            Some(std::time::Duration::from_secs(30))
        );
    }
}
