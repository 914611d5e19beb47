//! Raw system query options
//!
//! Next links must repeat the client's query options byte for byte, so each
//! recognized option is kept as the exact `$name=value` fragment it arrived as.
//! Decoded values are produced on demand.

/// Properties requested through `$select`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOption {
    /// `$select=*`
    All,
    /// Property names in request order.
    Properties(Vec<String>),
}

impl SelectOption {
    /// Parse a decoded `$select` value. Returns `None` when no property is named.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let items: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if items.is_empty() {
            return None;
        }
        if items.contains(&"*") {
            return Some(SelectOption::All);
        }
        Some(SelectOption::Properties(
            items.into_iter().map(str::to_owned).collect(),
        ))
    }

    /// `*` or the comma-joined property names.
    #[must_use]
    pub fn to_select_list(&self) -> String {
        match self {
            SelectOption::All => "*".to_owned(),
            SelectOption::Properties(props) => props.join(","),
        }
    }
}

/// Raw `$name=value` fragments of the system query options on a request.
///
/// When an option is repeated the first fragment is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQueryOptions {
    pub count: Option<String>,
    pub expand: Option<String>,
    pub filter: Option<String>,
    pub format: Option<String>,
    pub orderby: Option<String>,
    pub search: Option<String>,
    pub select: Option<String>,
    pub skip: Option<String>,
    pub skiptoken: Option<String>,
    pub top: Option<String>,
}

impl RawQueryOptions {
    /// Split a query string (with or without the leading `?`).
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut out = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for fragment in query.split('&').filter(|f| !f.is_empty()) {
            let name = fragment.split_once('=').map_or(fragment, |(name, _)| name);
            let slot = match name {
                "$count" => &mut out.count,
                "$expand" => &mut out.expand,
                "$filter" => &mut out.filter,
                "$format" => &mut out.format,
                "$orderby" => &mut out.orderby,
                "$search" => &mut out.search,
                "$select" => &mut out.select,
                "$skip" => &mut out.skip,
                "$skiptoken" => &mut out.skiptoken,
                "$top" => &mut out.top,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(fragment.to_owned());
            }
        }

        out
    }

    /// Fragments carried into a next link, in their fixed order.
    ///
    /// `$skip` and `$skiptoken` are excluded; the next link recomputes paging.
    pub fn next_link_fragments(&self) -> impl Iterator<Item = &str> {
        [
            &self.count,
            &self.expand,
            &self.filter,
            &self.format,
            &self.orderby,
            &self.search,
            &self.select,
            &self.top,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref())
    }

    /// Decoded `$format` value.
    #[must_use]
    pub fn format_value(&self) -> Option<String> {
        self.format.as_deref().and_then(decode_value)
    }

    /// Decoded `$select` value.
    #[must_use]
    pub fn select_option(&self) -> Option<SelectOption> {
        self.select
            .as_deref()
            .and_then(decode_value)
            .and_then(|v| SelectOption::parse(&v))
    }

    /// Whether `$count=true` was requested.
    #[must_use]
    pub fn count_requested(&self) -> bool {
        self.count
            .as_deref()
            .and_then(decode_value)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// `$skip` as a number; absent or malformed values yield `None`.
    #[must_use]
    pub fn skip_value(&self) -> Option<u64> {
        self.skip
            .as_deref()
            .and_then(decode_value)
            .and_then(|v| v.trim().parse().ok())
    }

    /// `$top` as a number; absent or malformed values yield `None`.
    #[must_use]
    pub fn top_value(&self) -> Option<u64> {
        self.top
            .as_deref()
            .and_then(decode_value)
            .and_then(|v| v.trim().parse().ok())
    }
}

/// Percent-decode the value half of a `name=value` fragment.
fn decode_value(fragment: &str) -> Option<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(fragment)
        .ok()?
        .into_iter()
        .next()
        .map(|(_, value)| value)
}
