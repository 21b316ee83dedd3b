//! Entity locators and REST endpoint paths.

use std::fmt;

use url::Url;

use crate::error::ApiError;

/// Path segment identifying one entity inside a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// `id:<value>`
    Id(String),
    /// `name:<value>`
    Name(String),
    /// `username:<value>`
    Username(String),
    /// The bare value, for collections addressed by key.
    Key(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Locator::Name(value.into())
    }

    pub fn username(value: impl Into<String>) -> Self {
        Locator::Username(value.into())
    }

    pub fn key(value: impl Into<String>) -> Self {
        Locator::Key(value.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(value) => write!(f, "id:{value}"),
            Locator::Name(value) => write!(f, "name:{value}"),
            Locator::Username(value) => write!(f, "username:{value}"),
            Locator::Key(value) => f.write_str(value),
        }
    }
}

/// Which root an endpoint hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// `<host>/app/rest`
    Rest,
    /// `<host>/app`
    App,
}

/// Relative REST path made of individually encoded segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    root: Root,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Endpoint under the REST root.
    pub fn rest() -> Self {
        Self {
            root: Root::Rest,
            segments: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Endpoint under the application root.
    pub fn app() -> Self {
        Self {
            root: Root::App,
            ..Self::rest()
        }
    }

    /// Append one segment. Slashes inside `segment` are encoded.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append every `/`-separated part of `path` as its own segment.
    pub fn path(mut self, path: &str) -> Self {
        self.segments.extend(
            path.split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn locator(self, locator: &Locator) -> Self {
        self.segment(locator.to_string())
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn root(&self) -> Root {
        self.root
    }

    /// Resolve against `base`, percent-encoding every segment.
    pub fn resolve(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.clone();
        if !self.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| ApiError::Config(format!("{base} cannot be used as a base URL")))?
                .pop_if_empty()
                .extend(&self.segments);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}
