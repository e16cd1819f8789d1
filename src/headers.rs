//! Header names the forwarder reads, writes or filters.

pub const CONTENT_TYPE: &str = "content-type";
pub const CONTENT_LENGTH: &str = "content-length";
pub const CACHE_CONTROL: &str = "cache-control";
pub const ACCEPT: &str = "accept";
pub const CONNECTION: &str = "connection";

pub const NO_STORE: &str = "no-store";
pub const DEFAULT_BODY_TYPE: &str = "application/json";

/// Connection-scoped headers that never cross the gateway.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
  "connection",
  "keep-alive",
  "proxy-authenticate",
  "proxy-authorization",
  "te",
  "trailers",
  "transfer-encoding",
  "upgrade",
];

/// `header_name` is expected in lowercase, as `HeaderName::as_str` yields it.
pub fn is_hop_by_hop(header_name: &str) -> bool {
  HOP_BY_HOP_HEADERS.contains(&header_name)
}

/// Extra names an upstream `Connection` header marks as connection-scoped,
/// lowercased.
pub fn connection_tokens<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
  values
    .into_iter()
    .flat_map(|value| value.split(','))
    .map(|token| token.trim().to_ascii_lowercase())
    .filter(|token| !token.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hop_by_hop_headers_are_recognised() {
    for name in ["connection", "keep-alive", "transfer-encoding", "upgrade", "te"] {
      assert!(is_hop_by_hop(name), "{name}");
    }
  }

  #[test]
  fn end_to_end_headers_pass() {
    for name in [CONTENT_TYPE, CACHE_CONTROL, ACCEPT, "x-request-id", "set-cookie"] {
      assert!(!is_hop_by_hop(name), "{name}");
    }
  }

  #[test]
  fn connection_header_lists_extra_names() {
    let tokens = connection_tokens(["close, X-Upstream-Trace", " keep-alive,,"]);
    assert_eq!(tokens, vec!["close", "x-upstream-trace", "keep-alive"]);
  }
}
