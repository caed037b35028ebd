//! Record model and desired-state parser
//!
//! A [`Record`] is the unit of reconciliation: two records are the same
//! record iff their normalized `(name, type, target)` tuples are equal. The
//! normalization here is the only one in the crate; the file parser and the
//! zone snapshot both go through [`Record::normalize`].
//!
//! Canonical forms:
//! - `name`: lowercase, relative to the zone, apex is the empty string.
//! - A / AAAA: the address as printed by `std::net` after parsing. IPv6 is
//!   printed in RFC 5952 compressed form; IPv4-mapped addresses print as
//!   `::ffff:a.b.c.d` whichever notation they were written in.
//! - CNAME: absolute lowercase hostname without trailing dot; a target
//!   without trailing dot is relative to the zone; the zone apex (`@` or
//!   the zone name itself) is the empty string.
//! - TXT: the unquoted payload, with surrounding parentheses removed and
//!   multiple quoted strings concatenated.

use std::collections::BTreeSet;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::debug;

use crate::error::ReconcileError;
use crate::validation::{validate_hostname, validate_record_name};

//==============================================================================
// Types
//==============================================================================

/// Record types managed by the reconciler
///
/// Anything else is outside the support boundary: ignored in the input file
/// and invisible in the live zone.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    TXT,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [Self::A, Self::AAAA, Self::CNAME, Self::TXT];

    /// Matches a type token, case-insensitively. Unsupported types yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::TXT => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized DNS record
///
/// Ordering is only used to make sets and logs deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    /// Subdomain label relative to the zone, empty for the apex
    pub name: String,
    pub record_type: RecordType,
    /// Canonical target, see the module docs
    pub target: String,
}

/// A record present in the live zone, with the provider-assigned id needed to delete it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteRecord {
    pub id: u64,
    pub record: Record,
}

impl Record {
    /// Builds a record from values that are already in canonical form.
    pub fn new(name: &str, record_type: RecordType, target: &str) -> Self {
        Self {
            name: name.to_string(),
            record_type,
            target: target.to_string(),
        }
    }

    /// Builds a record from raw `(name, type, target)` as found in the input
    /// file or returned by the provider.
    pub fn normalize(
        name: &str,
        record_type: RecordType,
        target: &str,
        zone: &str,
    ) -> Result<Self, String> {
        Ok(Self {
            name: normalize_name(name, zone)?,
            record_type,
            target: normalize_target(record_type, target, zone)?,
        })
    }

    /// Target as the provider expects it on create.
    pub fn api_target(&self, zone: &str) -> String {
        match self.record_type {
            RecordType::A | RecordType::AAAA => self.target.clone(),
            RecordType::CNAME if self.target.is_empty() => format!("{zone}."),
            RecordType::CNAME => format!("{}.", self.target),
            RecordType::TXT => quote_txt(&self.target),
        }
    }

    pub fn is_apex(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.is_apex() { "@" } else { &self.name };
        write!(f, "{} IN {} ", name, self.record_type)?;
        match self.record_type {
            RecordType::CNAME if self.target.is_empty() => f.write_str("@"),
            RecordType::TXT => f.write_str(&quote_txt(&self.target)),
            _ => f.write_str(&self.target),
        }
    }
}

impl fmt::Display for RemoteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {})", self.record, self.id)
    }
}

//==============================================================================
// Normalization
//==============================================================================

/// Normalizes a record name to its lowercase, zone-relative form.
///
/// `@` and the empty string denote the apex. A fully qualified name (trailing
/// dot) must lie inside `zone`.
pub fn normalize_name(raw: &str, zone: &str) -> Result<String, String> {
    let lower = raw.trim().to_ascii_lowercase();
    if lower.is_empty() || lower == "@" {
        return Ok(String::new());
    }
    if let Some(fqdn) = lower.strip_suffix('.') {
        if fqdn == zone {
            return Ok(String::new());
        }
        return match fqdn.strip_suffix(zone).and_then(|s| s.strip_suffix('.')) {
            Some(relative) if !relative.is_empty() => {
                validate_record_name(relative).map_err(|e| e.to_string())?;
                Ok(relative.to_string())
            }
            _ => Err(format!("name {raw} is outside zone {zone}")),
        };
    }
    validate_record_name(&lower).map_err(|e| e.to_string())?;
    Ok(lower)
}

/// Normalizes a raw target for the given record type.
pub fn normalize_target(record_type: RecordType, raw: &str, zone: &str) -> Result<String, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(format!("missing target for {record_type} record"));
    }
    match record_type {
        RecordType::A => raw
            .parse::<Ipv4Addr>()
            .map(|ip| ip.to_string())
            .map_err(|_| format!("invalid IPv4 address: {raw}")),
        RecordType::AAAA => raw
            .parse::<Ipv6Addr>()
            .map(|ip| ip.to_string())
            .map_err(|_| format!("invalid IPv6 address: {raw}")),
        RecordType::CNAME => normalize_cname_target(raw, zone),
        RecordType::TXT => normalize_txt(raw),
    }
}

fn normalize_cname_target(raw: &str, zone: &str) -> Result<String, String> {
    let lower = raw.to_ascii_lowercase();
    if lower == "@" {
        return Ok(String::new());
    }
    validate_hostname(&lower).map_err(|e| format!("invalid CNAME target: {e}"))?;
    let fqdn = match lower.strip_suffix('.') {
        Some(absolute) => absolute.to_string(),
        None => format!("{lower}.{zone}"),
    };
    if fqdn == zone {
        return Ok(String::new());
    }
    Ok(fqdn)
}

/// Extracts the payload of a TXT target.
///
/// Accepts bare text, one or more double-quoted strings (concatenated), and
/// either of those wrapped in parentheses. A `;` comment may follow a
/// quoted payload.
fn normalize_txt(raw: &str) -> Result<String, String> {
    let mut rest = raw;
    let parenthesized = rest.starts_with('(');
    if parenthesized {
        rest = &rest[1..];
    }

    let mut payload = String::new();
    let mut quoted = false;
    let mut closed = !parenthesized;
    let mut chars = rest.char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '"' if !closed || !parenthesized => {
                quoted = true;
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped)) => payload.push(escaped),
                            None => return Err("unterminated quoted string in TXT payload".into()),
                        },
                        Some((_, c)) => payload.push(c),
                        None => return Err("unterminated quoted string in TXT payload".into()),
                    }
                }
            }
            ')' if !closed => closed = true,
            ';' if quoted && closed => break,
            _ if !quoted => {
                let text = rest[idx..].trim_end();
                let text = if parenthesized {
                    text.strip_suffix(')')
                        .ok_or("unbalanced parenthesis in TXT payload")?
                        .trim_end()
                } else {
                    text
                };
                if text.is_empty() {
                    return Err("empty TXT payload".into());
                }
                return Ok(text.to_string());
            }
            other => return Err(format!("unexpected '{other}' in TXT payload")),
        }
    }

    if !closed {
        return Err("unbalanced parenthesis in TXT payload".into());
    }
    if !quoted {
        return Err("empty TXT payload".into());
    }
    Ok(payload)
}

fn quote_txt(payload: &str) -> String {
    let mut quoted = String::with_capacity(payload.len() + 2);
    quoted.push('"');
    for ch in payload.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

//==============================================================================
// Parser
//==============================================================================

/// Splits off the first whitespace-delimited field.
fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], &s[end..])),
        None => Some((s, "")),
    }
}

/// Parses one line of the desired-state file.
///
/// Line format: `<name> [IN] <TYPE> <target...>`.
///
/// Returns `Ok(None)` for lines outside the support boundary: blank lines,
/// `;` / `#` comments, lines without a type token and lines whose type is
/// not one of A, AAAA, CNAME, TXT. This permissiveness is intentional.
/// A line with a supported type that cannot be turned into a record is an
/// error.
pub fn parse_line(line: &str, zone: &str) -> Result<Option<Record>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
        return Ok(None);
    }

    let Some((name, rest)) = next_field(trimmed) else {
        return Ok(None);
    };
    let Some((mut type_token, mut rest)) = next_field(rest) else {
        return Ok(None);
    };
    if type_token.eq_ignore_ascii_case("IN") {
        match next_field(rest) {
            Some((token, remainder)) => {
                type_token = token;
                rest = remainder;
            }
            None => return Ok(None),
        }
    }
    let Some(record_type) = RecordType::from_token(type_token) else {
        return Ok(None);
    };

    let target = match record_type {
        RecordType::TXT => rest.trim(),
        // Single-token targets; anything after `;` is a comment.
        _ => rest.split(';').next().unwrap_or_default().trim(),
    };
    if target.is_empty() {
        return Err(format!("missing target for {record_type} record"));
    }
    if record_type != RecordType::TXT && target.contains(char::is_whitespace) {
        return Err(format!("unexpected trailing data after {record_type} target: {target}"));
    }

    Record::normalize(name, record_type, target, zone).map(Some)
}

/// Parses a whole desired-state file into a set of records.
///
/// Lines that normalize to the same record collapse into one. The first
/// malformed line aborts the parse.
pub fn parse_records(text: &str, zone: &str) -> Result<BTreeSet<Record>, ReconcileError> {
    let mut records = BTreeSet::new();
    for (idx, line) in text.lines().enumerate() {
        let record = parse_line(line, zone).map_err(|reason| ReconcileError::Parse {
            line: idx + 1,
            reason,
        })?;
        match record {
            Some(record) => {
                if !records.insert(record) {
                    debug!("Line {} duplicates an earlier record", idx + 1);
                }
            }
            None if !line.trim().is_empty() => debug!("Skipping line {}: {}", idx + 1, line.trim()),
            None => {}
        }
    }
    Ok(records)
}

//==============================================================================
// Tests
//==============================================================================
