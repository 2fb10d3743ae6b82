//! Shared helpers reused across the `gh-aw` compiler and runtime crates.
//!
//! Kept deliberately small: sanitization primitives for rendering agent
//! output on human-facing surfaces (issues, comments, PR bodies), plus a
//! handful of path/error helpers that would otherwise be duplicated between
//! `gh-aw-compiler` (which generates the sanitization *step*) and
//! `gh-aw-safe-outputs-server` (which needs the same logic at runtime to
//! validate `publish-asset` payloads before they are ever staged).

pub mod errors;
pub mod mentions;
pub mod paths;
pub mod sanitizer;

pub use errors::{ERR_CREATE_DIR, ERR_READ_FILE, ERR_WRITE_FILE};
pub use mentions::neutralize_mentions;
pub use paths::is_safe_relative_path;
pub use sanitizer::{redact_secret_values, redact_urls_outside_allowlist, sanitize_for_surface};
