use axum::http::{header, request::Parts, HeaderValue, Method};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

/// Which browser origins may talk to the server.
///
/// Exact matches from the allow-list, plus preview deployments of the form
/// `<prefix><anything>[a-z0-9-]<suffix>`. Development mode lets everything in.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allow_all: bool,
    origins: HashSet<String>,
    preview: Option<(String, String)>,
}

impl CorsPolicy {
    pub fn from_config(config: &Config) -> Self {
        let origins = config
            .cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let preview = match (&config.cors_preview_prefix, &config.cors_preview_suffix) {
            (Some(prefix), Some(suffix)) if !prefix.is_empty() && !suffix.is_empty() => {
                Some((prefix.clone(), suffix.clone()))
            }
            _ => None,
        };

        Self {
            allow_all: config.is_development(),
            origins,
            preview,
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        if self.allow_all || self.origins.contains(origin) {
            return true;
        }

        let Some((prefix, suffix)) = &self.preview else {
            return false;
        };
        match origin
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix(suffix.as_str()))
        {
            Some(middle) => {
                !middle.is_empty()
                    && middle
                        .bytes()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
            }
            None => false,
        }
    }

    pub fn layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        if self.allow_all {
            return layer.allow_origin(Any);
        }

        let policy = Arc::new(self.clone());
        layer.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            origin.to_str().map(|o| policy.allows(o)).unwrap_or(false)
        }))
    }
}
