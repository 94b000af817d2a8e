//! Untrusted-link filter.
//!
//! Deny-by-default: any `http(s)://` token whose host is not covered by the
//! trusted-domain allow-list blocks the whole message. Matching rules:
//! - `"youtube.com"` matches `youtube.com` and any subdomain
//!   (`www.youtube.com`, `music.youtube.com`)
//! - comparison is case-insensitive; userinfo, port, path, query and
//!   fragment are ignored
//! - a token with no parseable host is treated as untrusted

/// Returns the first link whose host falls outside `trusted`, or `None`
/// when the message carries no untrusted links.
pub fn find_untrusted_link(content: &str, trusted: &[String]) -> Option<String> {
    for (start, _) in content.match_indices("http") {
        let tail = &content[start..];
        if !tail.starts_with("http://") && !tail.starts_with("https://") {
            continue;
        }
        // Trailing sentence punctuation is not part of the link.
        let token: &str = tail
            .split_whitespace()
            .next()
            .unwrap_or(tail)
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        match extract_host(token) {
            Some(host) if host_is_trusted(&host, trusted) => {}
            _ => return Some(token.to_string()),
        }
    }
    None
}

/// Whether `host` is covered by the allow-list (exact match or subdomain).
pub fn host_is_trusted(host: &str, trusted: &[String]) -> bool {
    trusted.iter().any(|domain| {
        let domain = domain.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}

/// Pull the lowercased host out of an `http(s)://…` token.
fn extract_host(token: &str) -> Option<String> {
    let rest = token
        .strip_prefix("https://")
        .or_else(|| token.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    // Drop userinfo, then the port.
    let host = authority.rsplit('@').next()?.split(':').next()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trusted() -> Vec<String> {
        vec!["youtube.com".into(), "discord.gg".into()]
    }

    #[test]
    fn plain_text_has_no_links() {
        assert_eq!(find_untrusted_link("hello there", &trusted()), None);
    }

    #[test]
    fn trusted_link_passes() {
        assert_eq!(
            find_untrusted_link("watch https://youtube.com/watch?v=1", &trusted()),
            None
        );
    }

    #[test]
    fn subdomain_of_trusted_domain_passes() {
        assert_eq!(
            find_untrusted_link("https://www.youtube.com/abc", &trusted()),
            None
        );
        assert_eq!(
            find_untrusted_link("https://music.youtube.com/xyz", &trusted()),
            None
        );
    }

    #[test]
    fn untrusted_link_is_reported() {
        assert_eq!(
            find_untrusted_link("look https://evil.example/x now", &trusted()),
            Some("https://evil.example/x".to_string())
        );
    }

    #[test]
    fn one_bad_link_among_good_ones_blocks() {
        let msg = "https://youtube.com/ok then http://evil.example/bad";
        assert_eq!(
            find_untrusted_link(msg, &trusted()),
            Some("http://evil.example/bad".to_string())
        );
    }

    #[test]
    fn lookalike_suffix_is_not_a_subdomain() {
        // "notyoutube.com" must not ride on the "youtube.com" entry.
        assert!(find_untrusted_link("https://notyoutube.com/x", &trusted()).is_some());
    }

    #[test]
    fn port_and_userinfo_are_ignored() {
        assert_eq!(
            find_untrusted_link("https://youtube.com:443/v", &trusted()),
            None
        );
        assert_eq!(
            find_untrusted_link("https://user@youtube.com/v", &trusted()),
            None
        );
    }

    #[test]
    fn host_comparison_is_case_insensitive() {
        assert_eq!(
            find_untrusted_link("https://YouTube.com/abc", &trusted()),
            None
        );
    }

    #[test]
    fn bare_scheme_is_untrusted() {
        assert!(find_untrusted_link("https:// broken", &trusted()).is_some());
    }

    #[test]
    fn trailing_punctuation_is_not_part_of_the_host() {
        assert_eq!(
            find_untrusted_link("see https://youtube.com, it is great", &trusted()),
            None
        );
        assert_eq!(
            find_untrusted_link("(context: https://youtube.com/v?x=1)", &trusted()),
            None
        );
        assert_eq!(
            find_untrusted_link("ever seen https://evil.example/x?", &trusted()),
            Some("https://evil.example/x".to_string())
        );
    }

    #[test]
    fn http_substring_without_scheme_is_not_a_link() {
        assert_eq!(find_untrusted_link("httpx is not a url", &trusted()), None);
    }
}
