//! Small string helpers shared by the built-in commands.

use std::net::Ipv6Addr;
use std::sync::LazyLock;

use regex::Regex;

/// Dotted-quad IPv4: four groups of 1-3 ASCII digits, each 0-255.
/// `\d` would also admit other Unicode decimal digits.
static IPV4_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])\.([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])\.([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])\.([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])$",
    )
    .expect("IPv4 pattern is valid")
});

/// Whether `s` is an IPv4 dotted-quad literal.
pub fn is_ipv4_literal(s: &str) -> bool {
    IPV4_LITERAL.is_match(s)
}

/// Whether `s` is an IPv4 dotted-quad or an IPv6 literal.
pub fn is_ip_literal(s: &str) -> bool {
    is_ipv4_literal(s) || s.parse::<Ipv6Addr>().is_ok()
}

/// Case-insensitive prefix test.
pub fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Every candidate that starts with `token`, ignoring case, in candidate order.
pub fn copy_partial_matches<I, S>(token: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter(|c| starts_with_ignore_case(c.as_ref(), token))
        .map(|c| c.as_ref().to_string())
        .collect()
}

/// Sort names the way completion lists are shown: case-insensitively.
pub fn sort_ignore_case(names: &mut [String]) {
    names.sort_by_key(|n| n.to_lowercase());
}
