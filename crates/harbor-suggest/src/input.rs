//! Address bar input classification

use std::net::IpAddr;
use url::Url;

/// Heuristic check whether typed text is meant as a web address rather than
/// a search.
pub fn looks_like_url(input: &str) -> bool {
    let input = input.trim();
    if input.is_empty() || input.contains(char::is_whitespace) {
        return false;
    }

    if has_known_scheme(input) {
        return Url::parse(input).is_ok();
    }

    let (host, _) = split_host_and_rest(input);
    if parse_ip_host(host).is_some() {
        return true;
    }

    let host = host.split(':').next().unwrap_or(host);
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let mut labels = host.split('.');
    let Some(tld) = labels.next_back() else {
        return false;
    };
    if labels.next().is_none() {
        return false;
    }

    (2..=6).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Turn typed text that looks like an address into a navigable URL.
pub fn normalize_url(input: &str) -> Option<String> {
    let input = input.trim();
    if !looks_like_url(input) {
        return None;
    }
    if has_known_scheme(input) {
        return Some(input.to_string());
    }

    let (host, rest) = split_host_and_rest(input);
    let candidate = if matches!(parse_ip_host(host), Some(IpAddr::V6(_))) && !host.starts_with('[')
    {
        format!("https://[{host}]{rest}")
    } else {
        format!("https://{host}{rest}")
    };

    Url::parse(&candidate).ok().map(|_| candidate)
}

/// Fill a search engine template: every `%s` becomes the encoded query.
pub fn search_url(template: &str, query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    template.replace("%s", &encoded)
}

fn has_known_scheme(input: &str) -> bool {
    ["http://", "https://", "file://", "about:", "data:"]
        .iter()
        .any(|scheme| input.starts_with(scheme))
}

fn split_host_and_rest(input: &str) -> (&str, &str) {
    let cut = input.find(['/', '?', '#']).unwrap_or(input.len());
    input.split_at(cut)
}

fn parse_ip_host(host: &str) -> Option<IpAddr> {
    let host = host.trim();
    if host.is_empty() {
        return None;
    }

    let host = if let Some(bracketed) = host.strip_prefix('[') {
        bracketed.split(']').next().unwrap_or(bracketed)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };

    host.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_url() {
        assert!(looks_like_url("example.com"));
        assert!(looks_like_url("news.example.co.uk/path?q=1"));
        assert!(looks_like_url("localhost:8080"));
        assert!(looks_like_url("LOCALHOST/admin"));
        assert!(looks_like_url("192.168.0.1"));
        assert!(looks_like_url("https://example.com"));
        assert!(looks_like_url("about:blank"));

        assert!(!looks_like_url(""));
        assert!(!looks_like_url("goo"));
        assert!(!looks_like_url("rust programming"));
        assert!(!looks_like_url("version 1.5"));
        assert!(!looks_like_url("file.12"));
        assert!(!looks_like_url("localhostfoo"));
        assert!(!looks_like_url("localhosting:8080"));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("example.com").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize_url("http://example.com/a").as_deref(),
            Some("http://example.com/a")
        );
        assert_eq!(normalize_url("::1").as_deref(), Some("https://[::1]"));
        assert_eq!(normalize_url("goo"), None);
    }

    #[test]
    fn test_search_url() {
        assert_eq!(
            search_url("https://duckduckgo.com/?q=%s", "rust & tokio"),
            "https://duckduckgo.com/?q=rust+%26+tokio"
        );
    }
}
