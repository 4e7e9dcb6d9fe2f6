//! Default values for cluster configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Cluster File Defaults
// ============================================================================

/// Default path of the cluster fixture file, relative to the working directory.
pub const DEFAULT_CLUSTER_FILE: &str = "clusters.json";

/// Environment variable selecting the cluster fixture file.
pub const ENV_CLUSTER_FILE: &str = "PAI_CLUSTER_FILE";

// ============================================================================
// REST API Defaults
// ============================================================================

/// Path prefix shared by every route of the job-management service.
pub const API_PREFIX: &str = "/api/v2";

/// Token lifetime requested on basic login, in seconds (4 hours).
pub const DEFAULT_TOKEN_EXPIRATION: u32 = 4 * 60 * 60;

// ============================================================================
// Error Codes
// ============================================================================

/// Error code substituted when the service replies with a non-JSON body.
pub const UNKNOWN_ERROR_CODE: &str = "UnknownError";
