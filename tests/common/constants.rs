//! Shared constants for end-to-end tests
//!
//! When fixture images or credentials change, update only this file.

#![allow(dead_code)]

// ============================================================================
// Credentials
// ============================================================================

/// Key configured on the server side
pub const SERVER_KEY: &str = "server-test-key";

/// Key sent by clients in the request body
pub const CLIENT_KEY: &str = "client-test-key";

/// Key the fake upstream refuses with 403
pub const REFUSED_KEY: &str = "refused-key";

// ============================================================================
// Model
// ============================================================================

/// Model name the fake upstream answers for
pub const FAKE_MODEL: &str = "fake-image-model";

// ============================================================================
// Fixture images
// ============================================================================

pub const PHOTO_WIDTH: u32 = 64;
pub const PHOTO_HEIGHT: u32 = 48;

pub const PHOTO_COLOR: [u8; 4] = [128, 128, 128, 255];
pub const GENERATED_COLOR: [u8; 4] = [200, 30, 30, 255];

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Default timeout for HTTP requests in tests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
