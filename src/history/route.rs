// Route patterns - named URL templates with dynamic segments
//
// A route definition like "/w/:workspaceId/note/:noteId" is parsed once
// into segments; building substitutes parameters in, matching extracts
// them back out of a concrete pathname.

use std::collections::HashMap;

use thiserror::Error;

/// Parameters substituted into (or extracted from) a route's dynamic
/// segments.
pub type RouteParams = HashMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("missing required parameter `{param}` for route {route}")]
    MissingParam { route: String, param: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A concrete navigation target produced by [`Route::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteData {
    pub name: String,
    pub url: String,
    pub id: String,
    pub params: RouteParams,
}

/// A named URL template. Segments starting with `:` are dynamic.
#[derive(Clone, Debug)]
pub struct Route {
    name: String,
    id: String,
    definition: String,
    segments: Vec<Segment>,
}

fn url_segments(url: &str) -> Vec<&str> {
    url.strip_prefix('/').unwrap_or(url).split('/').collect()
}

impl Route {
    pub fn new(name: impl Into<String>, definition: impl Into<String>, id: impl Into<String>) -> Self {
        let definition = definition.into();
        let segments = url_segments(&definition)
            .into_iter()
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => Segment::Param(param.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self {
            name: name.into(),
            id: id.into(),
            definition,
            segments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Substitute `params` into the dynamic segments and produce the
    /// concrete URL. Every dynamic segment must be supplied.
    pub fn build(&self, params: &RouteParams) -> Result<RouteData, RouteError> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(literal.as_str()),
                Segment::Param(param) => match params.get(param) {
                    Some(value) => parts.push(value.as_str()),
                    None => {
                        return Err(RouteError::MissingParam {
                            route: self.name.clone(),
                            param: param.clone(),
                        })
                    }
                },
            }
        }
        Ok(RouteData {
            name: self.name.clone(),
            url: format!("/{}", parts.join("/")),
            id: self.id.clone(),
            params: params.clone(),
        })
    }

    /// Match a concrete pathname against this route, extracting the
    /// dynamic parameters. Returns `None` on any literal or length
    /// mismatch.
    pub fn matches(&self, pathname: &str) -> Option<RouteParams> {
        let segments = url_segments(pathname);
        if segments.len() != self.segments.len() {
            return None;
        }
        let mut params = RouteParams::new();
        for (expected, actual) in self.segments.iter().zip(segments) {
            match expected {
                Segment::Literal(literal) => {
                    if literal != actual {
                        return None;
                    }
                }
                Segment::Param(param) => {
                    params.insert(param.clone(), actual.to_string());
                }
            }
        }
        Some(params)
    }
}
