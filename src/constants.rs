/// Application constants
// ============================================================================
// Protocol
// ============================================================================
/// Banner sent in the 220 greeting
pub const SERVER_BANNER: &str = "mailgate smtp server";

/// Hostname announced in HELO/EHLO replies when none is configured
pub const DEFAULT_HOSTNAME: &str = "mailgate";

/// Maximum accepted message size in bytes (10 MB)
pub const MAX_MESSAGE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum length of a single command line (RFC 5321)
pub const MAX_COMMAND_LINE_LENGTH: usize = 512;

/// Maximum recipients per transaction (RFC 5321 minimum)
pub const MAX_RECIPIENTS: usize = 100;

/// Maximum email address length (RFC 5321)
pub const MAX_EMAIL_ADDRESS_LENGTH: usize = 320;

// ============================================================================
// Routing
// ============================================================================

/// Sub-addressing delimiter in the local part
pub const TAG_DELIMITER: char = '+';

// ============================================================================
// Configuration defaults
// ============================================================================

/// Default listen host
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen port
pub const DEFAULT_PORT: u16 = 2525;

/// Default broker URL
pub const DEFAULT_BROKER_URL: &str = "amqp://localhost";
