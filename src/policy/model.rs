//! Policy model
//!
//! A policy is a recipient whitelist plus an inclusive per-transfer limit,
//! parsed from JSON:
//!
//! ```json
//! {
//!   "max_amount_wei": 1000000000000000000,
//!   "whitelist": ["0x742d35Cc6634C0532925a3b844Bc9e7595f2bD1e"]
//! }
//! ```
//!
//! The limit may be a JSON integer of any size or a decimal string. A missing
//! limit is a load error, never "unlimited".

use crate::errors::{Result, SignerError};
use alloy_primitives::U256;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Authorization rules for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    max_amount: U256,
    /// Normalized entries: `0x` prefix, lowercase
    whitelist: Vec<String>,
}

impl Policy {
    pub fn new<I, S>(max_amount: U256, whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_amount,
            whitelist: whitelist
                .into_iter()
                .map(|entry| normalize_entry(entry.as_ref()))
                .collect(),
        }
    }

    pub fn max_amount(&self) -> U256 {
        self.max_amount
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Whether a normalized address string matches any whitelist entry
    pub fn permits(&self, normalized_address: &str) -> bool {
        self.whitelist
            .iter()
            .any(|entry| entry.eq_ignore_ascii_case(normalized_address))
    }
}

fn normalize_entry(entry: &str) -> String {
    let lower = entry.to_ascii_lowercase();
    match lower.strip_prefix("0x") {
        Some(_) => lower,
        None => format!("0x{}", lower),
    }
}

/// On-disk policy format
///
/// Only a JSON object is accepted; the derived impl would also fill the
/// fields from an array by position.
#[derive(Debug)]
struct PolicyFile {
    max_amount_wei: Option<Value>,
    whitelist: Vec<String>,
}

impl<'de> Deserialize<'de> for PolicyFile {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PolicyFileVisitor)
    }
}

struct PolicyFileVisitor;

impl<'de> Visitor<'de> for PolicyFileVisitor {
    type Value = PolicyFile;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a policy object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<PolicyFile, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut max_amount_wei: Option<Option<Value>> = None;
        let mut whitelist: Option<Vec<String>> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "max_amount_wei" | "maxAmount" => {
                    if max_amount_wei.is_some() {
                        return Err(de::Error::duplicate_field("max_amount_wei"));
                    }
                    max_amount_wei = Some(map.next_value()?);
                }
                "whitelist" => {
                    if whitelist.is_some() {
                        return Err(de::Error::duplicate_field("whitelist"));
                    }
                    whitelist = Some(map.next_value()?);
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(PolicyFile {
            max_amount_wei: max_amount_wei.flatten(),
            whitelist: whitelist.unwrap_or_default(),
        })
    }
}

/// Parse a policy from raw JSON bytes
pub fn parse_policy(bytes: &[u8]) -> Result<Policy> {
    let file: PolicyFile = serde_json::from_slice(bytes)?;

    let max_amount = match file.max_amount_wei {
        None | Some(Value::Null) => {
            return Err(SignerError::PolicyLoad(
                "missing field `max_amount_wei`".to_string(),
            ))
        }
        Some(value) => parse_max_amount(&value)?,
    };

    let policy = Policy::new(max_amount, &file.whitelist);

    if policy.whitelist.is_empty() {
        warn!("Policy whitelist is empty, every transfer will be denied");
    }
    for entry in &policy.whitelist {
        if entry.len() != 42 || !entry[2..].bytes().all(|b| b.is_ascii_hexdigit()) {
            warn!("Whitelist entry {:?} is not a 20-byte hex address and can never match", entry);
        }
    }

    debug!(
        "Parsed policy: {} whitelist entries",
        policy.whitelist.len()
    );
    Ok(policy)
}

fn parse_max_amount(value: &Value) -> Result<U256> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(SignerError::PolicyLoad(format!(
                "`max_amount_wei` must be an integer, got {}",
                json_kind(other)
            )))
        }
    };

    if text.starts_with('-') {
        return Err(SignerError::PolicyLoad(
            "`max_amount_wei` must not be negative".to_string(),
        ));
    }

    parse_decimal(&text).map_err(|reason| {
        SignerError::PolicyLoad(format!("invalid `max_amount_wei`: {}", reason))
    })
}

/// Parse an unsigned decimal integer made only of ASCII digits
pub(crate) fn parse_decimal(text: &str) -> std::result::Result<U256, String> {
    if text.is_empty() {
        return Err("empty value".to_string());
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{:?} is not a non-negative decimal integer", text));
    }
    U256::from_str_radix(text, 10).map_err(|_| "value exceeds 256 bits".to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Where policy bytes come from
pub trait PolicySource {
    /// Read the raw policy bytes
    fn read(&self) -> io::Result<Vec<u8>>;

    /// Human-readable origin for logs and errors
    fn describe(&self) -> String;

    /// Read and parse in one step
    fn load(&self) -> Result<Policy> {
        let bytes = self.read().map_err(|e| {
            SignerError::PolicyLoad(format!("cannot read {}: {}", self.describe(), e))
        })?;
        parse_policy(&bytes)
    }
}

/// Policy stored in a JSON file
#[derive(Debug, Clone)]
pub struct FilePolicySource {
    path: PathBuf,
}

impl FilePolicySource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PolicySource for FilePolicySource {
    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Policy bytes already in memory
#[derive(Debug, Clone)]
pub struct InlinePolicy(pub Vec<u8>);

impl InlinePolicy {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

impl PolicySource for InlinePolicy {
    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "inline policy".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_err(json: &str) -> String {
        match parse_policy(json.as_bytes()) {
            Err(SignerError::PolicyLoad(msg)) => msg,
            other => panic!("expected PolicyLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_basic_policy() {
        let policy = parse_policy(
            br#"{"max_amount_wei": 1000, "whitelist": ["0xAAAaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1"]}"#,
        )
        .unwrap();
        assert_eq!(policy.max_amount(), U256::from(1000u64));
        assert_eq!(
            policy.whitelist(),
            &["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1".to_string()]
        );
    }

    #[test]
    fn test_parse_amount_beyond_u64() {
        let policy =
            parse_policy(br#"{"max_amount_wei": 123456789012345678901234567890, "whitelist": []}"#)
                .unwrap();
        assert_eq!(
            policy.max_amount(),
            U256::from_str_radix("123456789012345678901234567890", 10).unwrap()
        );
    }

    #[test]
    fn test_parse_amount_as_string_and_alias() {
        let policy = parse_policy(br#"{"maxAmount": "5000", "whitelist": []}"#).unwrap();
        assert_eq!(policy.max_amount(), U256::from(5000u64));
    }

    #[test]
    fn test_missing_whitelist_is_empty() {
        let policy = parse_policy(br#"{"max_amount_wei": 1}"#).unwrap();
        assert!(policy.whitelist().is_empty());
    }

    #[test]
    fn test_missing_or_null_amount_fails() {
        assert!(load_err(r#"{"whitelist": []}"#).contains("max_amount_wei"));
        assert!(load_err(r#"{"max_amount_wei": null, "whitelist": []}"#).contains("max_amount_wei"));
    }

    #[test]
    fn test_negative_amount_fails() {
        assert!(load_err(r#"{"max_amount_wei": -1, "whitelist": []}"#).contains("negative"));
        assert!(load_err(r#"{"max_amount_wei": "-1", "whitelist": []}"#).contains("negative"));
    }

    #[test]
    fn test_non_integer_amount_fails() {
        load_err(r#"{"max_amount_wei": 1.5, "whitelist": []}"#);
        load_err(r#"{"max_amount_wei": 1e18, "whitelist": []}"#);
        load_err(r#"{"max_amount_wei": "0x10", "whitelist": []}"#);
        load_err(r#"{"max_amount_wei": true, "whitelist": []}"#);
        load_err(r#"{"max_amount_wei": "", "whitelist": []}"#);
    }

    #[test]
    fn test_amount_above_u256_fails() {
        let too_big = format!("{}0", U256::MAX);
        let json = format!(r#"{{"max_amount_wei": {}, "whitelist": []}}"#, too_big);
        assert!(load_err(&json).contains("256 bits"));
    }

    #[test]
    fn test_malformed_json_fails() {
        load_err("not json");
        load_err(r#"{"max_amount_wei": 1, "whitelist": "0xabc"}"#);
        load_err(r#"{"max_amount_wei": 1, "whitelist": [1, 2]}"#);
        load_err(r#"{"max_amount_wei": 1, "max_amount_wei": 2}"#);
        load_err(r#"{"max_amount_wei": 1, "maxAmount": 2}"#);
    }

    #[test]
    fn test_non_object_policy_fails() {
        let msg = load_err(r#"[1000, ["0x1111111111111111111111111111111111111111"]]"#);
        assert!(msg.contains("policy object"));
        load_err("1000");
        load_err(r#""max_amount_wei""#);
        load_err("null");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let policy = parse_policy(
            br#"{"comment": {"owner": "ops"}, "max_amount_wei": 7, "whitelist": []}"#,
        )
        .unwrap();
        assert_eq!(policy.max_amount(), U256::from(7u64));
    }

    #[test]
    fn test_entries_without_prefix_are_normalized() {
        let policy = Policy::new(
            U256::from(1u64),
            ["AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1", "0Xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2"],
        );
        assert!(policy.permits("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1"));
        assert!(policy.permits("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2"));
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_amount_wei": 42, "whitelist": []}}"#).unwrap();

        let policy = FilePolicySource::new(file.path()).load().unwrap();
        assert_eq!(policy.max_amount(), U256::from(42u64));
    }

    #[test]
    fn test_missing_file_is_policy_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FilePolicySource::new(dir.path().join("absent.json"));
        match source.load() {
            Err(SignerError::PolicyLoad(msg)) => assert!(msg.contains("absent.json")),
            other => panic!("expected PolicyLoad, got {:?}", other),
        }
    }
}
