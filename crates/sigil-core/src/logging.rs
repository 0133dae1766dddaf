//! Structured logging schema and field name constants for sigil.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (per-recipient, per-field rows) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request and its database calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "templates", "teams", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "duplicate", "insert", "fetch"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Template UUID being operated on.
pub const TEMPLATE_ID: &str = "template_id";

/// User UUID the operation acts for.
pub const USER_ID: &str = "user_id";

/// Team UUID scoping the operation, when present.
pub const TEAM_ID: &str = "team_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of recipients cloned in a duplication.
pub const RECIPIENT_COUNT: &str = "recipient_count";

/// Number of fields cloned in a duplication.
pub const FIELD_COUNT: &str = "field_count";
