//! Validation utilities for ovh-reconciler
//!
//! This module provides validation functions for DNS names appearing in the
//! record file and in the configuration.

use anyhow::{anyhow, Result};

use crate::constants::{MAX_LABEL_LENGTH, MAX_RECORD_NAME_LENGTH};

/// Validates a record name relative to the zone
///
/// # Validation Rules
///
/// 1. **Length constraints**:
///    - Maximum total length: 253 characters (excluding trailing dot)
///    - Maximum label length: 63 characters
///
/// 2. **Syntax rules**:
///    - Labels are separated by dots and cannot be empty
///    - Labels cannot start or end with hyphens
///    - The name cannot be an IP address literal
///
/// 3. **Allowed characters**: letters, digits, `-`, `_` (for `_dmarc`,
///    `_acme-challenge`, ...) and `*` as a complete label
///
/// `@` is accepted and denotes the zone apex.
///
/// # Examples
///
/// ```
/// use ovh_reconciler::validation::validate_record_name;
///
/// assert!(validate_record_name("@").is_ok());
/// assert!(validate_record_name("blog").is_ok());
/// assert!(validate_record_name("_dmarc").is_ok());
/// assert!(validate_record_name("*.dev").is_ok());
///
/// assert!(validate_record_name("").is_err());
/// assert!(validate_record_name("#").is_err());
/// assert!(validate_record_name("10.0.0.1").is_err());
/// assert!(validate_record_name("-blog").is_err());
/// ```
pub fn validate_record_name(record_name: &str) -> Result<()> {
    let trimmed = record_name.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Record name cannot be empty"));
    }
    if trimmed == "@" {
        return Ok(());
    }
    if is_ip_literal(trimmed) {
        return Err(anyhow!("Record name cannot be an IP address: {}", trimmed));
    }
    validate_labels(trimmed.strip_suffix('.').unwrap_or(trimmed), true)
}

/// Validates a zone name such as `dodges.it`
///
/// Same rules as [`validate_record_name`] but wildcards and `@` are rejected
/// and at least two labels are required.
pub fn validate_zone_name(zone: &str) -> Result<()> {
    let trimmed = zone.trim();
    let name = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if name.is_empty() {
        return Err(anyhow!("Zone name cannot be empty"));
    }
    if is_ip_literal(name) {
        return Err(anyhow!("Zone name cannot be an IP address: {}", name));
    }
    if !name.contains('.') {
        return Err(anyhow!("Zone name must contain at least two labels: {}", name));
    }
    validate_labels(name, false)
}

/// Validates a hostname used as a CNAME target
pub fn validate_hostname(host: &str) -> Result<()> {
    let name = host.strip_suffix('.').unwrap_or(host);
    if name.is_empty() {
        return Err(anyhow!("Hostname cannot be empty"));
    }
    if is_ip_literal(name) {
        return Err(anyhow!("Hostname cannot be an IP address: {}", name));
    }
    validate_labels(name, false)
}

/// Returns true when `value` parses as an IPv4 or IPv6 address
pub fn is_ip_literal(value: &str) -> bool {
    value.parse::<std::net::IpAddr>().is_ok()
}

fn validate_labels(name: &str, allow_wildcard: bool) -> Result<()> {
    if name.contains(' ') {
        return Err(anyhow!("Name cannot contain spaces"));
    }
    if name.len() > MAX_RECORD_NAME_LENGTH {
        return Err(anyhow!(
            "Name too long (max {} characters, got {})",
            MAX_RECORD_NAME_LENGTH,
            name.len()
        ));
    }
    if name.starts_with('.') {
        return Err(anyhow!("Name cannot start with a dot"));
    }
    if name.contains("..") {
        return Err(anyhow!("Name cannot contain consecutive dots"));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(anyhow!("Name contains empty label"));
        }
        if label == "*" {
            if allow_wildcard {
                continue;
            }
            return Err(anyhow!("Wildcard label not allowed here"));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(anyhow!(
                "Name label too long (max {} characters, got {})",
                MAX_LABEL_LENGTH,
                label.len()
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(anyhow!("Name label cannot start or end with hyphen"));
        }
        for ch in label.chars() {
            if !ch.is_ascii_alphanumeric() && ch != '-' && ch != '_' {
                return Err(anyhow!(
                    "Name contains invalid character: '{}' (allowed: letters, digits, '-', '_', or wildcard labels)",
                    ch
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_record_name_valid_cases() {
        assert!(validate_record_name("@").is_ok());
        assert!(validate_record_name("www").is_ok());
        assert!(validate_record_name("foo.dodges.it").is_ok());
        assert!(validate_record_name("_acme-challenge.www").is_ok());
        assert!(validate_record_name("*").is_ok());
        assert!(validate_record_name("*.dev").is_ok());
        assert!(validate_record_name("a-b").is_ok());
        assert!(validate_record_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn test_validate_record_name_invalid_cases() {
        assert!(validate_record_name("").is_err());
        assert!(validate_record_name(" ").is_err());
        assert!(validate_record_name("#").is_err());
        assert!(validate_record_name(".www").is_err());
        assert!(validate_record_name("a..b").is_err());
        assert!(validate_record_name("-www").is_err());
        assert!(validate_record_name("www-").is_err());
        assert!(validate_record_name("ex@mple").is_err());
        assert!(validate_record_name("10.0.0.1").is_err());
        assert!(validate_record_name("2001:41d0:401::1").is_err());
        assert!(validate_record_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_zone_name() {
        assert!(validate_zone_name("dodges.it").is_ok());
        assert!(validate_zone_name("dodges.it.").is_ok());
        assert!(validate_zone_name("sub.example.co.uk").is_ok());

        assert!(validate_zone_name("").is_err());
        assert!(validate_zone_name("localhost").is_err());
        assert!(validate_zone_name("*.dodges.it").is_err());
        assert!(validate_zone_name("10.0.0.1").is_err());
    }

    #[test]
    fn test_validate_hostname() {
        assert!(validate_hostname("ssl0.ovh.net.").is_ok());
        assert!(validate_hostname("swip.dodges.it").is_ok());
        assert!(validate_hostname("10.0.0.1").is_err());
        assert!(validate_hostname("2001:41d0:401::1").is_err());
        assert!(validate_hostname(".").is_err());
    }
}
