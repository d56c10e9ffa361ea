//! Masking for credentials shown to operators.

/// Visible prefix length for masked secrets
const VISIBLE_PREFIX: usize = 4;

/// Mask a secret, keeping a short prefix so values can be told apart.
///
/// Short values are masked entirely.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= VISIBLE_PREFIX * 2 {
        return "*".repeat(len.max(8));
    }

    let prefix: String = secret.chars().take(VISIBLE_PREFIX).collect();
    format!("{prefix}{}", "*".repeat(len - VISIBLE_PREFIX))
}
