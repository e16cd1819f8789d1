use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::path;
use crate::route_config::{HttpMethod, RouteConfig, RouteConfigFile};

#[derive(Debug, Error, PartialEq)]
pub enum RouteTableError {
  #[error("duplicate route '{method}:{pattern}'")]
  Duplicate { method: HttpMethod, pattern: String },

  #[error("malformed pattern '{pattern}': {reason}")]
  MalformedPattern { pattern: String, reason: &'static str },

  #[error("upstream '{upstream}' does not fit pattern '{pattern}'")]
  TemplateMismatch { pattern: String, upstream: String },
}

/// Request-side path matcher. Prefixes never end with `/`; the root prefix is
/// the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
  Exact(String),
  Param { prefix: String, name: String },
  Wildcard { prefix: String },
}

/// Upstream-side path with the same placeholder kinds as [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamTemplate {
  Fixed(String),
  Param { prefix: String, name: String },
  Wildcard { prefix: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
  None,
  /// Percent-decoded value of the single `:name` segment.
  Param { name: String, value: String },
  /// Raw remainder after the wildcard prefix, without the leading `/`.
  Tail(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRule {
  pub method: HttpMethod,
  pub pattern: PathPattern,
  pub upstream: UpstreamTemplate,
  pub forward_query: bool,
  pub forward_body: bool,
}

#[derive(Debug, Clone)]
pub struct MatchedRoute {
  pub rule: Arc<RouteRule>,
  pub capture: Capture,
  pub query: Option<String>,
}

/// Immutable, priority-ordered rule list.
#[derive(Debug, Default)]
pub struct RouteTable {
  rules: Vec<Arc<RouteRule>>,
}

#[derive(Debug, Default)]
pub struct RouteTableBuilder {
  rules: Vec<RouteRule>,
  seen: HashSet<(HttpMethod, u8, String)>,
}

impl PathPattern {
  pub fn parse(raw: &str) -> Result<PathPattern, RouteTableError> {
    match parse_segments(raw)? {
      Placeholder::None(path) => Ok(PathPattern::Exact(path)),
      Placeholder::Param(prefix, name) => Ok(PathPattern::Param { prefix, name }),
      Placeholder::Wildcard(prefix) => Ok(PathPattern::Wildcard { prefix }),
    }
  }

  fn rank(&self) -> u8 {
    match self {
      PathPattern::Exact(_) => 0,
      PathPattern::Param { .. } => 1,
      PathPattern::Wildcard { .. } => 2,
    }
  }

  /// Patterns with equal shapes accept exactly the same paths; parameter
  /// names do not count.
  fn shape(&self) -> (u8, &str) {
    match self {
      PathPattern::Exact(path) => (self.rank(), path.as_str()),
      PathPattern::Param { prefix, .. } | PathPattern::Wildcard { prefix } => (self.rank(), prefix.as_str()),
    }
  }

  /// Tests a canonical path, returning what the pattern captured.
  pub fn capture(&self, path: &str) -> Option<Capture> {
    match self {
      PathPattern::Exact(expected) => (expected == path).then_some(Capture::None),
      PathPattern::Param { prefix, name } => {
        let segment = path.strip_prefix(prefix.as_str())?.strip_prefix('/')?;
        if segment.is_empty() || segment.contains('/') {
          return None;
        }

        let value = urlencoding::decode(segment).ok()?.into_owned();
        Some(Capture::Param {
          name: name.clone(),
          value,
        })
      }
      PathPattern::Wildcard { prefix } => {
        if path == prefix {
          return Some(Capture::Tail(String::new()));
        }

        let tail = path.strip_prefix(prefix.as_str())?.strip_prefix('/')?;
        Some(Capture::Tail(String::from(tail)))
      }
    }
  }
}

impl Display for PathPattern {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      PathPattern::Exact(path) => f.write_str(path),
      PathPattern::Param { prefix, name } => write!(f, "{prefix}/:{name}"),
      PathPattern::Wildcard { prefix } => write!(f, "{prefix}/*"),
    }
  }
}

impl UpstreamTemplate {
  pub fn parse(raw: &str) -> Result<UpstreamTemplate, RouteTableError> {
    match parse_segments(raw)? {
      Placeholder::None(path) => Ok(UpstreamTemplate::Fixed(path)),
      Placeholder::Param(prefix, name) => Ok(UpstreamTemplate::Param { prefix, name }),
      Placeholder::Wildcard(prefix) => Ok(UpstreamTemplate::Wildcard { prefix }),
    }
  }

  fn fits(&self, pattern: &PathPattern) -> bool {
    match (self, pattern) {
      (UpstreamTemplate::Fixed(_), PathPattern::Exact(_)) => true,
      (UpstreamTemplate::Param { name, .. }, PathPattern::Param { name: expected, .. }) => name == expected,
      (UpstreamTemplate::Wildcard { .. }, PathPattern::Wildcard { .. }) => true,
      _ => false,
    }
  }

  /// Builds the upstream path. Param values are encoded once; wildcard tails
  /// are appended untouched.
  pub fn render(&self, capture: &Capture) -> String {
    match (self, capture) {
      (UpstreamTemplate::Param { prefix, .. }, Capture::Param { value, .. }) => {
        format!("{}/{}", prefix, urlencoding::encode(value))
      }
      (UpstreamTemplate::Wildcard { prefix }, Capture::Tail(tail)) if !tail.is_empty() => {
        format!("{prefix}/{tail}")
      }
      (UpstreamTemplate::Wildcard { prefix }, _) if prefix.is_empty() => String::from("/"),
      (UpstreamTemplate::Wildcard { prefix }, _) => prefix.clone(),
      (UpstreamTemplate::Fixed(path), _) => path.clone(),
      (UpstreamTemplate::Param { prefix, .. }, _) => prefix.clone(),
    }
  }
}

enum Placeholder {
  None(String),
  Param(String, String),
  Wildcard(String),
}

fn parse_segments(raw: &str) -> Result<Placeholder, RouteTableError> {
  let malformed = |reason| RouteTableError::MalformedPattern {
    pattern: String::from(raw),
    reason,
  };

  if !raw.starts_with('/') {
    return Err(malformed("must start with '/'"));
  }

  let normalized = path::normalize(raw);
  let (head, last) = normalized.rsplit_once('/').unwrap_or(("", normalized.as_str()));

  if head.contains(':') || head.contains('*') {
    return Err(malformed("placeholders are only allowed in the last segment"));
  }

  if last == "*" {
    return Ok(Placeholder::Wildcard(String::from(head)));
  }

  if let Some(name) = last.strip_prefix(':') {
    if name.is_empty() || name.contains(':') || name.contains('*') {
      return Err(malformed("parameter needs a plain name"));
    }
    return Ok(Placeholder::Param(String::from(head), String::from(name)));
  }

  if last.contains(':') || last.contains('*') {
    return Err(malformed("placeholder must fill the whole segment"));
  }

  Ok(Placeholder::None(normalized))
}

impl TryFrom<RouteConfig> for RouteRule {
  type Error = RouteTableError;

  fn try_from(config: RouteConfig) -> Result<Self, Self::Error> {
    let RouteConfig {
      path,
      method,
      upstream,
      forward_query,
      forward_body,
    } = config;

    let method = method.unwrap_or_default();
    let pattern = PathPattern::parse(&path)?;
    let upstream_raw = upstream.unwrap_or_else(|| path.clone());
    let upstream = UpstreamTemplate::parse(&upstream_raw)?;

    if !upstream.fits(&pattern) {
      return Err(RouteTableError::TemplateMismatch {
        pattern: path,
        upstream: upstream_raw,
      });
    }

    Ok(RouteRule {
      method,
      pattern,
      upstream,
      forward_query: forward_query.unwrap_or(method == HttpMethod::Get),
      forward_body: forward_body.unwrap_or(method.carries_body()),
    })
  }
}

impl RouteTableBuilder {
  pub fn register(&mut self, rule: RouteRule) -> Result<&mut Self, RouteTableError> {
    let (rank, prefix) = rule.pattern.shape();
    let key = (rule.method, rank, String::from(prefix));
    if self.seen.contains(&key) {
      return Err(RouteTableError::Duplicate {
        method: rule.method,
        pattern: rule.pattern.to_string(),
      });
    }

    info!("New endpoint created at '{}:{}'.", rule.method, rule.pattern);
    self.seen.insert(key);
    self.rules.push(rule);
    Ok(self)
  }

  pub fn build(self) -> RouteTable {
    let mut rules = self.rules;
    // stable: registration order survives inside each rank
    rules.sort_by_key(|rule| rule.pattern.rank());

    RouteTable {
      rules: rules.into_iter().map(Arc::new).collect(),
    }
  }
}

impl RouteTable {
  pub fn builder() -> RouteTableBuilder {
    RouteTableBuilder::default()
  }

  pub fn from_config(config: RouteConfigFile) -> Result<RouteTable, RouteTableError> {
    let mut builder = RouteTable::builder();
    for route in config.routes.into_iter() {
      builder.register(RouteRule::try_from(route)?)?;
    }

    Ok(builder.build())
  }

  /// First rule, in priority order, whose method and pattern accept the
  /// canonical path.
  pub fn match_route(&self, method: HttpMethod, path: &str) -> Option<MatchedRoute> {
    self
      .rules
      .iter()
      .filter(|rule| rule.method == method)
      .find_map(|rule| {
        rule.pattern.capture(path).map(|capture| MatchedRoute {
          rule: rule.clone(),
          capture,
          query: None,
        })
      })
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

impl MatchedRoute {
  pub fn with_query(mut self, query: &str) -> Self {
    self.query = if query.is_empty() { None } else { Some(String::from(query)) };
    self
  }

  /// Upstream path plus the untouched query string when the rule forwards it.
  pub fn upstream_target(&self) -> String {
    let path = self.rule.upstream.render(&self.capture);

    match (&self.query, self.rule.forward_query) {
      (Some(query), true) => format!("{path}?{query}"),
      _ => path,
    }
  }
}
