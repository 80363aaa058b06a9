//! Value rules
//!
//! Each metric declares a rule kind that decides which raw strings are
//! accepted, how they decode to a comparable integer, and how an integer is
//! rendered back for display.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineError;
use crate::types::RuleKind;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static SINGLE_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]$").expect("valid regex"));
static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-1][0-9]|2[0-3]):[0-5][0-9]$").expect("valid regex"));

/// Validation and conversion for one rule kind
pub trait ValueRule {
    /// Whether a freshly typed value may be stored
    fn validate(&self, raw: &str) -> bool;

    /// Decode a stored value into a comparable integer
    fn decode(&self, raw: &str) -> Option<i64>;

    /// Render an integer back into the display form
    fn encode(&self, value: i64) -> String;
}

/// Plain non-negative integers
pub struct IntRule;

impl ValueRule for IntRule {
    fn validate(&self, raw: &str) -> bool {
        DIGITS.is_match(raw) && raw.parse::<i64>().is_ok()
    }

    fn decode(&self, raw: &str) -> Option<i64> {
        raw.parse().ok()
    }

    fn encode(&self, value: i64) -> String {
        value.to_string()
    }
}

/// Ten-step scale.
///
/// The value is parsed, decremented by one and the result must be a single
/// digit, so `1..=10` pass while `0` and `11` do not.
pub struct Int10Rule;

impl ValueRule for Int10Rule {
    fn validate(&self, raw: &str) -> bool {
        raw.parse::<i64>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .is_some_and(|n| SINGLE_DIGIT.is_match(&n.to_string()))
    }

    fn decode(&self, raw: &str) -> Option<i64> {
        raw.parse().ok()
    }

    fn encode(&self, value: i64) -> String {
        value.to_string()
    }
}

/// Clock time `HH:MM`, decoded as the integer `HHMM`
pub struct TimeRule;

impl ValueRule for TimeRule {
    fn validate(&self, raw: &str) -> bool {
        CLOCK_TIME.is_match(raw)
    }

    fn decode(&self, raw: &str) -> Option<i64> {
        let (hours, minutes) = raw.split_once(':')?;
        if hours.len() != 2 || minutes.len() != 2 {
            return None;
        }
        if !(hours.bytes().chain(minutes.bytes())).all(|b| b.is_ascii_digit()) {
            return None;
        }
        format!("{hours}{minutes}").parse().ok()
    }

    fn encode(&self, value: i64) -> String {
        let digits = format!("{value:04}");
        let (hours, minutes) = digits.split_at(digits.len() - 2);
        format!("{hours}:{minutes}")
    }
}

/// Rule for kinds that were never wired up; accepts nothing
pub struct UnsupportedRule;

impl ValueRule for UnsupportedRule {
    fn validate(&self, _raw: &str) -> bool {
        false
    }

    fn decode(&self, _raw: &str) -> Option<i64> {
        None
    }

    fn encode(&self, value: i64) -> String {
        value.to_string()
    }
}

impl RuleKind {
    /// Rule implementation for this kind
    pub fn rule(&self) -> &'static dyn ValueRule {
        match self {
            RuleKind::Int => &IntRule,
            RuleKind::Int10 => &Int10Rule,
            RuleKind::Time => &TimeRule,
            RuleKind::Unsupported(_) => &UnsupportedRule,
        }
    }

    /// Whether `raw` may be stored under this kind
    pub fn validate(&self, raw: &str) -> bool {
        self.rule().validate(raw)
    }

    /// Decode a stored value of `metric`, failing with
    /// [`EngineError::MalformedValue`] if it does not fit the rule
    pub fn decode(&self, metric: &str, raw: &str) -> Result<i64, EngineError> {
        self.rule()
            .decode(raw)
            .ok_or_else(|| EngineError::MalformedValue {
                metric: metric.to_string(),
                rule: self.to_string(),
                value: raw.to_string(),
            })
    }

    /// Display form of a decoded value
    pub fn encode(&self, value: i64) -> String {
        self.rule().encode(value)
    }
}

/// Decode every value of a series, in stored order
pub fn decode_all<'a>(
    rule: &RuleKind,
    metric: &str,
    values: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<i64>, EngineError> {
    values
        .into_iter()
        .map(|raw| rule.decode(metric, raw))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_rule() {
        let rule = RuleKind::Int;
        assert!(rule.validate("0"));
        assert!(rule.validate("12345"));
        assert!(!rule.validate(""));
        assert!(!rule.validate("-3"));
        assert!(!rule.validate("4.5"));
        assert!(!rule.validate("99999999999999999999999"));
        assert_eq!(rule.decode("m", "042").unwrap(), 42);
        assert_eq!(rule.encode(42), "42");
    }

    #[test]
    fn test_int10_off_by_one() {
        let rule = RuleKind::Int10;
        assert!(rule.validate("10"));
        assert!(rule.validate("1"));
        assert!(rule.validate("5"));
        assert!(!rule.validate("11"));
        assert!(!rule.validate("0"));
        assert!(!rule.validate("abc"));
        assert!(!rule.validate(""));
        assert!(!rule.validate(&i64::MIN.to_string()));
        assert!(!rule.validate(&i64::MAX.to_string()));
    }

    #[test]
    fn test_time_validation() {
        let rule = RuleKind::Time;
        assert!(rule.validate("00:00"));
        assert!(rule.validate("07:30"));
        assert!(rule.validate("23:59"));
        assert!(!rule.validate("24:00"));
        assert!(!rule.validate("12:60"));
        assert!(!rule.validate("7:30"));
        assert!(!rule.validate("0730"));
    }

    #[test]
    fn test_time_decode_encode() {
        let rule = RuleKind::Time;
        assert_eq!(rule.decode("m", "07:30").unwrap(), 730);
        assert_eq!(rule.encode(rule.decode("m", "07:30").unwrap()), "07:30");
        assert_eq!(rule.encode(rule.decode("m", "23:59").unwrap()), "23:59");
        assert_eq!(rule.encode(1230), "12:30");
        assert_eq!(rule.encode(30), "00:30");
        assert_eq!(rule.encode(0), "00:00");
    }

    fn assert_round_trip(rule: RuleKind, inputs: &[&str]) {
        for raw in inputs {
            assert!(rule.validate(raw), "{rule} should accept {raw}");
            let n = rule.decode("m", raw).unwrap();
            assert_eq!(rule.decode("m", &rule.encode(n)).unwrap(), n);
        }
    }

    #[test]
    fn test_round_trip_on_accepted_input() {
        assert_round_trip(RuleKind::Int, &["0", "7", "1200", "987654321"]);
        assert_round_trip(RuleKind::Int10, &["1", "5", "10"]);
        assert_round_trip(RuleKind::Time, &["00:00", "00:05", "09:41", "13:00", "23:59"]);
    }

    #[test]
    fn test_unsupported_kinds_reject_everything() {
        for token in ["bool", "goal", "percent"] {
            let rule = RuleKind::parse(token);
            assert!(!rule.is_supported());
            assert!(!rule.validate("1"));
            assert!(!rule.validate("true"));
            assert!(rule.decode("m", "1").is_err());
        }
    }

    #[test]
    fn test_malformed_value_is_fatal() {
        let err = RuleKind::Time.decode("Sleep", "late").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Sleep"));
    }

    #[test]
    fn test_rule_kind_tokens() {
        assert_eq!(RuleKind::parse("int10"), RuleKind::Int10);
        assert_eq!(String::from(RuleKind::Time), "time");
        assert_eq!(RuleKind::parse("goal").as_str(), "goal");
    }
}
