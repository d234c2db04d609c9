//! Typed bucket id predicate
//!
//! Restricts a channel scan to buckets whose 13-digit id compares against a
//! threshold. Accepted textual forms (threshold in hex, `0x` optional):
//!
//! ```text
//! >=0123456789abc    ge:0123456789abc
//! <0x1a2b            lt:1a2b
//! ==ff  !=ff  <=ff  >ff
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison operator applied as `bucket_id <op> threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `>`
    Gt,
}

impl CompareOp {
    /// Symbolic form
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
        }
    }

    /// Applies the operator
    pub fn apply(&self, lhs: u64, rhs: u64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Gt => lhs > rhs,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lt" => Some(CompareOp::Lt),
            "le" => Some(CompareOp::Le),
            "eq" => Some(CompareOp::Eq),
            "ne" => Some(CompareOp::Ne),
            "ge" => Some(CompareOp::Ge),
            "gt" => Some(CompareOp::Gt),
            _ => None,
        }
    }
}

/// Predicate over bucket ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketFilter {
    /// Comparison operator
    pub op: CompareOp,
    /// Right-hand side of the comparison
    pub threshold: u64,
}

impl BucketFilter {
    /// Create a new filter
    pub fn new(op: CompareOp, threshold: u64) -> Self {
        Self { op, threshold }
    }

    /// Whether the bucket with this id should be scanned
    pub fn matches(&self, bucket_id: u64) -> bool {
        self.op.apply(bucket_id, self.threshold)
    }
}

impl fmt::Display for BucketFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}0x{:x}", self.op.symbol(), self.threshold)
    }
}

impl FromStr for BucketFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (op, rest) = if let Some((name, rest)) = s.split_once(':') {
            let op = CompareOp::from_name(name.trim())
                .ok_or_else(|| format!("Unknown comparison operator '{}'", name))?;
            (op, rest)
        } else {
            // Two-character symbols must be tried before their one-character prefixes.
            const SYMBOLS: [(&str, CompareOp); 6] = [
                ("<=", CompareOp::Le),
                (">=", CompareOp::Ge),
                ("==", CompareOp::Eq),
                ("!=", CompareOp::Ne),
                ("<", CompareOp::Lt),
                (">", CompareOp::Gt),
            ];
            SYMBOLS
                .iter()
                .find_map(|(sym, op)| s.strip_prefix(sym).map(|rest| (*op, rest)))
                .ok_or_else(|| format!("Filter '{}' does not start with an operator", s))?
        };

        let digits = rest.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("Filter threshold '{}' is not a hex number", rest.trim()));
        }
        let threshold = u64::from_str_radix(digits, 16)
            .map_err(|e| format!("Filter threshold '{}' is invalid: {}", digits, e))?;

        Ok(Self::new(op, threshold))
    }
}

impl TryFrom<String> for BucketFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BucketFilter> for String {
    fn from(filter: BucketFilter) -> Self {
        filter.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbolic() {
        assert_eq!(
            ">=0x1a2b".parse::<BucketFilter>().unwrap(),
            BucketFilter::new(CompareOp::Ge, 0x1a2b)
        );
        assert_eq!(
            "<ff".parse::<BucketFilter>().unwrap(),
            BucketFilter::new(CompareOp::Lt, 0xff)
        );
        assert_eq!(
            "!= 10".parse::<BucketFilter>().unwrap(),
            BucketFilter::new(CompareOp::Ne, 0x10)
        );
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(
            "GT:0123456789abc".parse::<BucketFilter>().unwrap(),
            BucketFilter::new(CompareOp::Gt, 0x0123456789abc)
        );
    }

    #[test]
    fn test_parse_rejects_expressions() {
        assert!("x > 5".parse::<BucketFilter>().is_err());
        assert!(">=".parse::<BucketFilter>().is_err());
        assert!(">=12 && <20".parse::<BucketFilter>().is_err());
        assert!("approx:12".parse::<BucketFilter>().is_err());
    }

    #[test]
    fn test_matches() {
        let filter = BucketFilter::new(CompareOp::Le, 0x100);
        assert!(filter.matches(0xff));
        assert!(filter.matches(0x100));
        assert!(!filter.matches(0x101));
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let filter = BucketFilter::new(CompareOp::Ne, 0xabc);
        assert_eq!(filter.to_string(), "!=0xabc");
        assert_eq!(filter.to_string().parse::<BucketFilter>().unwrap(), filter);
    }

    #[test]
    fn test_serde_as_string() {
        let filter: BucketFilter = serde_json::from_str("\">=0x10\"").unwrap();
        assert_eq!(filter, BucketFilter::new(CompareOp::Ge, 0x10));
        assert_eq!(serde_json::to_string(&filter).unwrap(), "\">=0x10\"");
    }
}
