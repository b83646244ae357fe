//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute so bad input
//! is rejected at parse time, before a workspace is even opened.

use crate::domain::PackageUpdate;

/// Validate plan ID prefix format.
///
/// Delegates to `commands::init` so there is one set of prefix rules.
pub fn validate_prefix(s: &str) -> Result<String, String> {
    use crate::commands::init;

    let trimmed = s.trim();
    init::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate a plan title: non-blank and single-line.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Title cannot contain newline characters".to_string());
    }

    Ok(s.to_string())
}

/// Validate a non-blank identifier (package name, repository ID, plan ID).
pub fn validate_identifier(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Value cannot be empty".to_string());
    }
    if s.chars().any(char::is_whitespace) {
        return Err(format!("'{s}' cannot contain whitespace"));
    }
    Ok(s.to_string())
}

/// Parse a package update given as `name:from:to`.
///
/// The string is split from the right, so package names may contain colons
/// but versions may not.
///
/// Examples: `lodash:4.17.15:4.17.21`, `@acme/ui:1.2.0:2.0.0`
pub fn parse_package_update(s: &str) -> Result<PackageUpdate, String> {
    let mut parts = s.trim().rsplitn(3, ':');
    let (Some(to), Some(from), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!(
            "Invalid package update '{s}'. Expected format: name:from:to (e.g., lodash:4.17.15:4.17.21)"
        ));
    };

    let update = PackageUpdate::new(name.trim(), from.trim(), to.trim());
    update.validate()?;
    Ok(update)
}
