// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const API_PREFIX: &str = "api";
pub const API_VERSION: &str = "v1";

// Token lifetimes (seconds)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 86_400;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 864_000;
/// Upper bound on either token lifetime (365 days)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 86_400;

// Transport carriers
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

// Input limits
pub const MAX_TOKEN_LENGTH: usize = 4096;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_JSON_BODY_BYTES: u64 = 16 * 1024;

// Timing equalisation for failed authentication
pub const DEFAULT_AUTH_MIN_DURATION_MS: u64 = 100;

// Argon2id cost (OWASP baseline: 19 MiB, 2 passes)
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
