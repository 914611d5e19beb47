//! Canonical OData URLs: `@odata.context`, `@odata.id` and `@odata.nextLink`
//!
//! Everything here is string composition over the request's scheme, host and
//! path. Context URLs are `None` exactly when the metadata level is `none`.

use crate::model::{EntitySet, KeyLiteral};
use crate::options::MetadataLevel;
use crate::query::{RawQueryOptions, SelectOption};

/// Path segment identifying OData routes unless configured otherwise.
pub const DEFAULT_ROUTE_PREFIX: &str = "odata";

/// Path segment of the metadata document.
pub const METADATA_SEGMENT: &str = "$metadata";

/// Whether `path` is served by the OData route (`prefix` found past the first byte,
/// ignoring ASCII case).
#[must_use]
pub fn is_odata_request(path: &str, route_prefix: &str) -> bool {
    find_ignore_ascii_case(path, route_prefix).is_some_and(|idx| idx > 0)
}

/// Whether `path` addresses the metadata document.
#[must_use]
pub fn is_metadata_request(path: &str) -> bool {
    find_ignore_ascii_case(path, METADATA_SEGMENT).is_some_and(|idx| idx > 0)
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

/// URL builder bound to one request's scheme, host and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalUrls<'a> {
    scheme: &'a str,
    host: &'a str,
    path: &'a str,
    route_prefix: &'a str,
}

impl<'a> CanonicalUrls<'a> {
    #[must_use]
    pub fn new(scheme: &'a str, host: &'a str, path: &'a str) -> Self {
        Self {
            scheme,
            host,
            path,
            route_prefix: DEFAULT_ROUTE_PREFIX,
        }
    }

    #[must_use]
    pub fn with_route_prefix(mut self, route_prefix: &'a str) -> Self {
        self.route_prefix = route_prefix;
        self
    }

    /// Path up to and including the OData route segment, e.g. `/OData` for
    /// `/OData/Products`. Without a route segment the whole path is used.
    #[must_use]
    pub fn base_path(&self) -> &'a str {
        match find_ignore_ascii_case(self.path, self.route_prefix) {
            Some(idx) => &self.path[..idx + self.route_prefix.len()],
            None => self.path.trim_end_matches('/'),
        }
    }

    /// `{scheme}://{host}{base_path}/`
    #[must_use]
    pub fn service_root(&self) -> String {
        format!("{}://{}{}/", self.scheme, self.host, self.base_path())
    }

    fn metadata_url(&self, level: MetadataLevel, suffix: &str) -> Option<String> {
        if level == MetadataLevel::None {
            return None;
        }
        Some(format!(
            "{}://{}{}/{METADATA_SEGMENT}{suffix}",
            self.scheme,
            self.host,
            self.base_path()
        ))
    }

    /// `.../$metadata` (service document context).
    #[must_use]
    pub fn context(&self, level: MetadataLevel) -> Option<String> {
        self.metadata_url(level, "")
    }

    /// `.../$metadata#Products` (collection of an entity set).
    #[must_use]
    pub fn context_for_set(&self, level: MetadataLevel, entity_set: &EntitySet) -> Option<String> {
        self.metadata_url(level, &format!("#{}", entity_set.name()))
    }

    /// `.../$metadata#Products(Name,Price)` or `.../$metadata#Products(*)`.
    #[must_use]
    pub fn context_with_select(
        &self,
        level: MetadataLevel,
        entity_set: &EntitySet,
        select: &SelectOption,
    ) -> Option<String> {
        self.metadata_url(
            level,
            &format!("#{}({})", entity_set.name(), select.to_select_list()),
        )
    }

    /// `.../$metadata#Products/$entity` (single entity addressed by key).
    #[must_use]
    pub fn context_for_entity(
        &self,
        level: MetadataLevel,
        entity_set: &EntitySet,
    ) -> Option<String> {
        self.metadata_url(level, &format!("#{}/$entity", entity_set.name()))
    }

    /// `.../$metadata#Products('Milk')/Name` (single property of an entity).
    #[must_use]
    pub fn context_for_property<K: KeyLiteral + ?Sized>(
        &self,
        level: MetadataLevel,
        entity_set: &EntitySet,
        key: &K,
        property: &str,
    ) -> Option<String> {
        self.metadata_url(
            level,
            &format!("#{}{}/{property}", entity_set.name(), key.key_literal()),
        )
    }

    /// `{scheme}://{host}{base_path}/Products('Milk')`, independent of metadata level.
    #[must_use]
    pub fn id<K: KeyLiteral + ?Sized>(&self, entity_set: &EntitySet, key: &K) -> String {
        format!(
            "{}://{}{}/{}{}",
            self.scheme,
            self.host,
            self.base_path(),
            entity_set.name(),
            key.key_literal()
        )
    }

    /// Next page link: `?$skip={skip + page_size}` followed by the request's raw
    /// `$count`, `$expand`, `$filter`, `$format`, `$orderby`, `$search`,
    /// `$select` and `$top` fragments in that order.
    #[must_use]
    pub fn next_link(&self, query: &RawQueryOptions, skip: u64, page_size: u64) -> String {
        let mut link = format!(
            "{}://{}{}?$skip={}",
            self.scheme,
            self.host,
            self.path,
            skip.saturating_add(page_size)
        );
        for fragment in query.next_link_fragments() {
            link.push('&');
            link.push_str(fragment);
        }
        link
    }
}
