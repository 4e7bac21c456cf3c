// The purpose of the prefix is to provide type safety

pub const CODE_PREFIX: &str = "cod-";
pub const REFRESH_TOKEN_PREFIX: &str = "ref-";
pub const TOKEN_ID_PREFIX: &str = "tok-";
pub const DEVICE_CODE_PREFIX: &str = "dvc-";
pub const HANDLE_BYTES_LENGTH: usize = 32; // 256 bits

pub const SECOND: u64 = 1;
pub const MINUTE: u64 = 60 * SECOND;
pub const HOUR: u64 = 60 * MINUTE;
pub const DAY: u64 = 24 * HOUR;

/** 60 minutes */
pub const ACCESS_TOKEN_LIFETIME: u64 = HOUR;

/** 5 minutes */
pub const IDENTITY_TOKEN_LIFETIME: u64 = 5 * MINUTE;

/** 5 minutes */
pub const AUTHORIZATION_CODE_LIFETIME: u64 = 5 * MINUTE;

/** 30 days */
pub const ABSOLUTE_REFRESH_TOKEN_LIFETIME: u64 = 30 * DAY;

/** 15 days */
pub const SLIDING_REFRESH_TOKEN_LIFETIME: u64 = 15 * DAY;

/** 5 minutes */
pub const DEVICE_CODE_LIFETIME: u64 = 5 * MINUTE;

/** 5 seconds, minimum time between two polls of the same device code */
pub const DEVICE_FLOW_INTERVAL: u64 = 5 * SECOND;

pub const USER_CODE_LENGTH: usize = 9;

/** 5 minutes */
pub const CLIENT_ASSERTION_MAX_AGE: u64 = 5 * MINUTE;

pub const PKCE_MIN_LENGTH: usize = 43;
pub const PKCE_MAX_LENGTH: usize = 128;

pub const DEFAULT_CLIENT_CLAIMS_PREFIX: &str = "client_";

// Persisted grant types
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_TYPE_REFERENCE_TOKEN: &str = "reference_token";
pub const GRANT_TYPE_USER_CONSENT: &str = "user_consent";
