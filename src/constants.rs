//! Common constants used throughout ovh-reconciler

//==============================================================================
// OVH API Constants
//==============================================================================

/// OVH Europe API base URL
pub const OVH_EU_API_BASE: &str = "https://eu.api.ovh.com/1.0";

/// OVH Canada API base URL
pub const OVH_CA_API_BASE: &str = "https://ca.api.ovh.com/1.0";

/// OVH US API base URL
pub const OVH_US_API_BASE: &str = "https://api.us.ovhcloud.com/1.0";

/// User agent string for OVH API requests
pub const OVH_USER_AGENT: &str = concat!("ovh-reconciler/", env!("CARGO_PKG_VERSION"));

/// Prefix of the OVH request signature (signature scheme version 1)
pub const OVH_SIGNATURE_PREFIX: &str = "$1$";

/// Default endpoint name
pub const DEFAULT_ENDPOINT: &str = "ovh-eu";

//==============================================================================
// HTTP Status Codes
//==============================================================================

/// HTTP status code for unauthorized requests (401)
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP status code for forbidden requests (403)
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;

/// HTTP status code for missing resources (404)
pub const HTTP_STATUS_NOT_FOUND: u16 = 404;

/// HTTP status code for rate limiting (429)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

//==============================================================================
// Timeout Constants
//==============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Minimum HTTP request timeout in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Maximum HTTP request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

//==============================================================================
// Validation Constants
//==============================================================================

/// Maximum DNS name length in characters
pub const MAX_RECORD_NAME_LENGTH: usize = 253;

/// Maximum DNS label length in characters
pub const MAX_LABEL_LENGTH: usize = 63;

//==============================================================================
// Exit Codes
//==============================================================================

/// Every planned operation succeeded
pub const EXIT_SUCCESS: u8 = 0;

/// At least one create/delete/refresh failed
pub const EXIT_APPLY_FAILED: u8 = 1;

/// Config, parse or fetch failed before any mutation
pub const EXIT_ABORTED: u8 = 2;

//==============================================================================
// Environment Variable Names
//==============================================================================

/// Environment variable name for the OVH application key
pub const ENV_APPLICATION_KEY: &str = "OVH_APPLICATION_KEY";

/// Environment variable name for the OVH application secret
pub const ENV_APPLICATION_SECRET: &str = "OVH_APPLICATION_SECRET";

/// Environment variable name for the OVH consumer key
pub const ENV_CONSUMER_KEY: &str = "OVH_CONSUMER_KEY";

/// Environment variable name for the managed DNS zone
pub const ENV_DNS_ZONE: &str = "OVH_DNS_ZONE";

/// Environment variable name for the API endpoint
pub const ENV_ENDPOINT: &str = "OVH_ENDPOINT";

/// Environment variable name for the desired-state file
pub const ENV_INPUT: &str = "OVH_RECONCILER_INPUT";
