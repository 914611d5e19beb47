//! Axum extractors for OData handlers

use axum::extract::FromRequestParts;
use http::request::Parts;

use odata_core::{
    CanonicalUrls, EntityDataModel, EntitySet, KeyLiteral, MetadataLevel, ODataException,
    RawQueryOptions, RequestOptions,
};

use crate::middleware::RoutePrefix;
use crate::origin::RequestOrigin;

/// Everything a handler needs to build canonical URLs for the current request.
///
/// Requires the OData middleware to have run; otherwise extraction fails with 500.
#[derive(Debug, Clone)]
pub struct ODataRequest {
    options: RequestOptions,
    origin: RequestOrigin,
    path: String,
    query: RawQueryOptions,
    route_prefix: RoutePrefix,
}

impl ODataRequest {
    #[must_use]
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    #[must_use]
    pub fn metadata_level(&self) -> MetadataLevel {
        self.options.metadata_level()
    }

    #[must_use]
    pub fn query(&self) -> &RawQueryOptions {
        &self.query
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn urls(&self) -> CanonicalUrls<'_> {
        CanonicalUrls::new(&self.origin.scheme, &self.origin.host, &self.path)
            .with_route_prefix(self.route_prefix.as_str())
    }

    #[must_use]
    pub fn resolve_context(&self) -> Option<String> {
        self.urls().context(self.metadata_level())
    }

    #[must_use]
    pub fn resolve_context_for_set(&self, entity_set: &EntitySet) -> Option<String> {
        self.urls().context_for_set(self.metadata_level(), entity_set)
    }

    /// Context for a collection, narrowed by the request's `$select` when present.
    #[must_use]
    pub fn resolve_context_with_select(&self, entity_set: &EntitySet) -> Option<String> {
        match self.query.select_option() {
            Some(select) => self
                .urls()
                .context_with_select(self.metadata_level(), entity_set, &select),
            None => self.resolve_context_for_set(entity_set),
        }
    }

    #[must_use]
    pub fn resolve_context_for_entity(&self, entity_set: &EntitySet) -> Option<String> {
        self.urls()
            .context_for_entity(self.metadata_level(), entity_set)
    }

    #[must_use]
    pub fn resolve_context_for_property<K: KeyLiteral + ?Sized>(
        &self,
        entity_set: &EntitySet,
        key: &K,
        property: &str,
    ) -> Option<String> {
        self.urls()
            .context_for_property(self.metadata_level(), entity_set, key, property)
    }

    #[must_use]
    pub fn resolve_id<K: KeyLiteral + ?Sized>(&self, entity_set: &EntitySet, key: &K) -> String {
        self.urls().id(entity_set, key)
    }

    #[must_use]
    pub fn next_link(&self, skip: u64, page_size: u64) -> String {
        self.urls().next_link(&self.query, skip, page_size)
    }

    /// Entity set addressed by the request path.
    #[must_use]
    pub fn resolve_entity_set<'m>(&self, model: &'m EntityDataModel) -> Option<&'m EntitySet> {
        model.entity_set_for_path(&self.path, self.route_prefix.as_str())
    }
}

impl<S> FromRequestParts<S> for ODataRequest
where
    S: Send + Sync,
{
    type Rejection = ODataException;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let options = RequestOptions::from_request_parts(parts, state).await?;
        let route_prefix = parts
            .extensions
            .get::<RoutePrefix>()
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            options,
            origin: RequestOrigin::from_request(&parts.uri, &parts.headers),
            path: parts.uri.path().to_owned(),
            query: parts
                .uri
                .query()
                .map(RawQueryOptions::parse)
                .unwrap_or_default(),
            route_prefix,
        })
    }
}
