use std::net::Ipv6Addr;
use std::sync::LazyLock;

use regex::Regex;

static UUID: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
});

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

static DATE_TIME: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"^\d{4}-\d{2}-\d{2}[Tt ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?([Zz]|[+-]\d{2}:?\d{2})?$")
});

static DATE: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"^\d{4}-\d{2}-\d{2}$"));

static URI: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s]+$"));

static IPV4: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"^((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)$")
});

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(error) => {
            tracing::error!(%pattern, %error, "invalid format pattern");
            None
        }
    }
}

fn matches(regex: &LazyLock<Option<Regex>>, value: &str) -> bool {
    regex.as_ref().is_some_and(|regex| regex.is_match(value))
}

/// Detects the OpenAPI `format` of a string example.
///
/// Checks run in a fixed order and the first match wins:
/// `uuid`, `email`, `date-time`, `date`, `uri`, `ipv4`, `ipv6`.
pub fn detect_format(value: &str) -> Option<&'static str> {
    if matches(&UUID, value) {
        Some("uuid")
    } else if matches(&EMAIL, value) {
        Some("email")
    } else if matches(&DATE_TIME, value) {
        Some("date-time")
    } else if matches(&DATE, value) {
        Some("date")
    } else if matches(&URI, value) {
        Some("uri")
    } else if matches(&IPV4, value) {
        Some("ipv4")
    } else if value.contains(':') && value.parse::<Ipv6Addr>().is_ok() {
        Some("ipv6")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::uuid("3f2504e0-4f89-11d3-9a0c-0305e82c3301", Some("uuid"))]
    #[case::email("a@b.com", Some("email"))]
    #[case::date_time("2024-03-01T10:15:30Z", Some("date-time"))]
    #[case::date_time_offset("2024-03-01T10:15:30.123+02:00", Some("date-time"))]
    #[case::date("2024-03-01", Some("date"))]
    #[case::uri("https://example.com/users?page=2", Some("uri"))]
    #[case::ipv4("192.168.1.10", Some("ipv4"))]
    #[case::ipv6("2001:db8::1", Some("ipv6"))]
    #[case::ipv6_loopback("::1", Some("ipv6"))]
    #[case::plain("hello world", None)]
    #[case::empty("", None)]
    #[case::bad_ipv4("256.1.1.1", None)]
    #[case::time_only("10:15", None)]
    fn should_detect_format(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_eq!(detect_format(value), expected);
    }

    #[test]
    fn should_prefer_email_over_uri() {
        assert_eq!(detect_format("http@example.com"), Some("email"));
    }
}
