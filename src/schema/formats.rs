//! Syntactic checks for string formats (email, URL)

use regex::Regex;
use std::sync::LazyLock;

/// Longest address accepted (RFC 5321 path limit minus the angle brackets)
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;

static LOCAL_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$").unwrap());

// At least two labels; no label starts or ends with a hyphen
static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z][A-Za-z0-9-]{0,61}[A-Za-z0-9]$")
        .unwrap()
});

// scheme://[userinfo@]host[:port][/path][?query][#fragment]
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://(?:[^\s/?#@]+@)?(?:\[[0-9A-Fa-f:.]+\]|[^\s/?#:@\[\]]+)(?::[0-9]{1,5})?(?:[/?#][^\s]*)?$")
        .unwrap()
});

/// Why an address failed the syntax check
pub fn email_problem(value: &str) -> Option<&'static str> {
    if value.len() > MAX_EMAIL_LENGTH {
        return Some("The email address is too long");
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return Some("An email address must have an @-sign");
    };
    if local.is_empty() {
        return Some("There must be something before the @-sign");
    }
    if local.len() > MAX_LOCAL_PART_LENGTH {
        return Some("The part before the @-sign is too long");
    }
    if !LOCAL_PART.is_match(local) {
        return Some("The part before the @-sign contains invalid characters or misplaced periods");
    }
    if domain.is_empty() {
        return Some("There must be something after the @-sign");
    }
    if !DOMAIN.is_match(domain) {
        return Some("The part after the @-sign is not a valid domain name");
    }
    None
}

pub fn is_url(value: &str) -> bool {
    URL.is_match(value)
}
