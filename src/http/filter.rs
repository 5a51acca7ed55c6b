//! Pre-capture noise filtering.
//!
//! # Responsibilities
//! - Decide whether a request is noise (favicons, crawler probes, static
//!   assets) and should be skipped from capture
//!
//! # Design Decisions
//! - An ordered predicate chain; any matching rule vetoes capture
//! - Predicates are pure functions of the request, so the decision is
//!   stable across repeated calls

use crate::capture::request::CapturedRequest;

type Predicate = Box<dyn Fn(&CapturedRequest) -> bool + Send + Sync>;

/// A chain of exclusion rules consulted before a capture write.
pub struct RequestFilter {
    rules: Vec<Predicate>,
}

impl RequestFilter {
    /// An empty filter that captures everything.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The stock denylist of well-known noise paths.
    pub fn standard() -> Self {
        Self::new()
            .ignore_path("/favicon.ico")
            .ignore_path("/favicon.png")
            .ignore_path("/favicon.svg")
            .ignore_path("/apple-touch-icon.png")
            .ignore_path("/apple-touch-icon-precomposed.png")
            .ignore_path("/robots.txt")
    }

    pub fn ignore_path(mut self, path: &str) -> Self {
        let path = path.to_string();
        self.rules
            .push(Box::new(move |request| request.path() == path));
        self
    }

    pub fn ignore_path_prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.to_string();
        self.rules
            .push(Box::new(move |request| request.path().starts_with(&prefix)));
        self
    }

    /// Skip paths whose extension (the text after the last `.`) matches any
    /// of the given extensions, case-insensitively. Leading dots are fine.
    pub fn ignore_extensions(mut self, extensions: &[&str]) -> Self {
        let normalized: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        if normalized.is_empty() {
            return self;
        }

        self.rules.push(Box::new(move |request| {
            let path = request.path().to_lowercase();
            match path.rfind('.') {
                Some(dot) => normalized.contains(&path[dot + 1..].to_string()),
                None => false,
            }
        }));
        self
    }

    /// Add an arbitrary exclusion rule.
    pub fn rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&CapturedRequest) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    /// `false` when any rule matches.
    pub fn should_capture(&self, request: &CapturedRequest) -> bool {
        !self.rules.iter().any(|rule| rule(request))
    }
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self::new()
    }
}
