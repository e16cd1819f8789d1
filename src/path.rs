/// Canonical form of a request path: trailing slashes dropped, root (and the
/// empty string) mapped to `/`.
pub fn normalize(raw: &str) -> String {
  let trimmed = raw.trim_end_matches('/');

  if trimmed.is_empty() {
    String::from("/")
  } else {
    String::from(trimmed)
  }
}
