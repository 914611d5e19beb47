use axum::Router;
use axum::middleware::from_fn_with_state;

use crate::middleware::{ODataState, odata_middleware};

/// Extension trait for installing OData negotiation on an axum [`Router`].
///
/// # Example
///
/// ```ignore
/// use odata_axum::{ODataRouterExt, ODataState};
///
/// let app = Router::new()
///     .route("/odata/Products", get(list_products))
///     .with_odata(ODataState::default());
/// ```
pub trait ODataRouterExt {
    /// Run OData negotiation for every route registered so far.
    #[must_use]
    fn with_odata(self, state: ODataState) -> Self;
}

impl<S> ODataRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_odata(self, state: ODataState) -> Self {
        self.layer(from_fn_with_state(state, odata_middleware))
    }
}
