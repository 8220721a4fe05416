//! Path matching engines.
//!
//! # Responsibilities
//! - Accept (pattern, payload) registrations
//! - Compile them into an immutable matcher
//! - Resolve a concrete path to a payload plus extracted parameters
//!
//! # Design Decisions
//! - The dispatch core only sees the [`PathMatcher`] / [`CompiledMatcher`] traits;
//!   any engine can be plugged in
//! - [`SegmentMatcher`] is the default engine: static segments, `:name`
//!   parameters and a trailing `*name` catch-all
//! - Static routes resolve through a hash lookup; dynamic routes are ordered
//!   by specificity (static > parameter > catch-all, segment by segment) with
//!   ties kept in registration order
//! - Two patterns of the same shape are a conflict, rejected at compile time
//! - No regex, matching is a single left-to-right walk

use std::collections::HashMap;

use thiserror::Error;

/// Errors raised by a matcher while registering or compiling patterns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("pattern {pattern:?} conflicts with {existing:?}")]
    Conflict { pattern: String, existing: String },
}

/// Parameters extracted from a matched path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A successful lookup.
#[derive(Debug)]
pub struct Matched<'m, T> {
    pub payload: &'m T,
    pub params: Params,
}

/// Registration side of a path matching engine.
pub trait PathMatcher<T>: Default {
    type Compiled: CompiledMatcher<T> + 'static;

    fn register(&mut self, pattern: &str, payload: T) -> Result<(), MatcherError>;

    fn compile(self) -> Result<Self::Compiled, MatcherError>;
}

/// Lookup side of a path matching engine. Shared read-only across requests.
pub trait CompiledMatcher<T>: Send + Sync {
    fn find(&self, path: &str) -> Option<Matched<'_, T>>;
}

fn check_rooted(pattern: &str) -> Result<(), MatcherError> {
    if pattern.starts_with('/') {
        Ok(())
    } else {
        Err(MatcherError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern must begin with '/'",
        })
    }
}

/// Exact string matching, no parameters.
pub struct ExactMatcher<T> {
    routes: HashMap<String, T>,
}

impl<T> Default for ExactMatcher<T> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }
}

impl<T: Send + Sync + 'static> PathMatcher<T> for ExactMatcher<T> {
    type Compiled = CompiledExact<T>;

    fn register(&mut self, pattern: &str, payload: T) -> Result<(), MatcherError> {
        check_rooted(pattern)?;
        if self.routes.contains_key(pattern) {
            return Err(MatcherError::Conflict {
                pattern: pattern.to_string(),
                existing: pattern.to_string(),
            });
        }
        self.routes.insert(pattern.to_string(), payload);
        Ok(())
    }

    fn compile(self) -> Result<Self::Compiled, MatcherError> {
        Ok(CompiledExact {
            routes: self.routes,
        })
    }
}

pub struct CompiledExact<T> {
    routes: HashMap<String, T>,
}

impl<T: Send + Sync> CompiledMatcher<T> for CompiledExact<T> {
    fn find(&self, path: &str) -> Option<Matched<'_, T>> {
        self.routes.get(path).map(|payload| Matched {
            payload,
            params: Params::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    fn rank(&self) -> u8 {
        match self {
            Segment::Static(_) => 0,
            Segment::Param(_) => 1,
            Segment::CatchAll(_) => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    fn parse(raw: &str) -> Result<Self, MatcherError> {
        check_rooted(raw)?;
        let invalid = |reason| MatcherError::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };

        let parts: Vec<&str> = raw[1..].split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut names: Vec<&str> = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter name cannot be empty"));
                }
                if names.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                names.push(name);
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if i + 1 != parts.len() {
                    return Err(invalid("catch-all must be the last segment"));
                }
                let name = if name.is_empty() { "*" } else { name };
                if names.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                Segment::CatchAll(name.to_string())
            } else {
                Segment::Static(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Static(_)))
    }

    /// Pattern with parameter names erased; equal shapes match equal paths.
    fn shape(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(lit) => lit.as_str(),
                Segment::Param(_) => ":",
                Segment::CatchAll(_) => "*",
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn rank(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }

    fn matches(&self, path: &str) -> Option<Params> {
        let mut rest = path.strip_prefix('/')?;
        let mut params = Params::new();
        let last = self.segments.len() - 1;

        for (i, segment) in self.segments.iter().enumerate() {
            if let Segment::CatchAll(name) = segment {
                params.push(name.as_str(), rest);
                return Some(params);
            }

            let (part, tail) = match rest.find('/') {
                Some(j) => (&rest[..j], Some(&rest[j + 1..])),
                None => (rest, None),
            };

            match segment {
                Segment::Static(lit) if lit == part => {}
                Segment::Param(name) if !part.is_empty() => params.push(name.as_str(), part),
                _ => return None,
            }

            match tail {
                Some(t) if i < last => rest = t,
                None if i == last => return Some(params),
                _ => return None,
            }
        }

        None
    }
}

/// Segment-based matcher with `:name` parameters and a trailing `*name` catch-all.
pub struct SegmentMatcher<T> {
    entries: Vec<(Pattern, T)>,
}

impl<T> Default for SegmentMatcher<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Send + Sync + 'static> PathMatcher<T> for SegmentMatcher<T> {
    type Compiled = CompiledSegments<T>;

    fn register(&mut self, pattern: &str, payload: T) -> Result<(), MatcherError> {
        let parsed = Pattern::parse(pattern)?;
        let shape = parsed.shape();
        if let Some((existing, _)) = self.entries.iter().find(|(p, _)| p.shape() == shape) {
            return Err(MatcherError::Conflict {
                pattern: pattern.to_string(),
                existing: existing.raw.clone(),
            });
        }
        self.entries.push((parsed, payload));
        Ok(())
    }

    fn compile(self) -> Result<Self::Compiled, MatcherError> {
        let mut statics = HashMap::new();
        let mut dynamic = Vec::new();

        for (pattern, payload) in self.entries {
            if pattern.is_static() {
                statics.insert(pattern.raw, payload);
            } else {
                dynamic.push((pattern, payload));
            }
        }
        // Stable: equal ranks keep registration order.
        dynamic.sort_by_key(|(pattern, _)| pattern.rank());

        Ok(CompiledSegments { statics, dynamic })
    }
}

pub struct CompiledSegments<T> {
    statics: HashMap<String, T>,
    dynamic: Vec<(Pattern, T)>,
}

impl<T: Send + Sync> CompiledMatcher<T> for CompiledSegments<T> {
    fn find(&self, path: &str) -> Option<Matched<'_, T>> {
        if let Some(payload) = self.statics.get(path) {
            return Some(Matched {
                payload,
                params: Params::default(),
            });
        }

        self.dynamic.iter().find_map(|(pattern, payload)| {
            pattern.matches(path).map(|params| Matched { payload, params })
        })
    }
}
