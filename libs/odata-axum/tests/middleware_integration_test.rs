use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use odata_axum::{ODataRequest, ODataRouterExt, ODataState, service_document};
use odata_core::{
    EntityDataModel, EntityKeyType, EntitySet, IsolationLevel, MetadataLevel, ODataException,
    ODataVersion, RequestOptions, ServiceCapabilities,
};
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

fn products() -> EntitySet {
    EntitySet::new("Products", EntityKeyType::String)
}

fn model() -> Arc<EntityDataModel> {
    Arc::new(
        EntityDataModel::new()
            .with_entity_set(products())
            .with_entity_set(EntitySet::new("Orders", EntityKeyType::Int32)),
    )
}

async fn options_handler(options: RequestOptions) -> impl IntoResponse {
    Json(json!({
        "serviceRoot": options.service_root_uri(),
        "isolation": options.isolation_level().to_string(),
        "metadata": options.metadata_level().as_str(),
        "version": options.version().to_string(),
        "maxVersion": options.max_version().to_string(),
    }))
}

async fn products_handler(
    request: ODataRequest,
    Extension(model): Extension<Arc<EntityDataModel>>,
) -> Response {
    let Some(set) = request.resolve_entity_set(&model) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    Json(json!({
        "@odata.context": request.resolve_context_with_select(set),
        "@odata.nextLink": request.next_link(0, 25),
        "id": request.resolve_id(set, "Milk"),
    }))
    .into_response()
}

async fn missing_product() -> Result<Json<Value>, ODataException> {
    Err(ODataException::not_found("The entity 'Products('Tea')' does not exist."))
}

async fn metadata_document() -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], "<edmx:Edmx/>").into_response()
}

async fn plain_handler() -> &'static str {
    "plain"
}

fn app(state: ODataState) -> Router {
    Router::new()
        .route("/odata", get(service_document))
        .route("/odata/$metadata", get(metadata_document))
        .route("/odata/Options", get(options_handler))
        .route("/odata/Products", get(products_handler))
        .route("/odata/Products('Tea')", get(missing_product))
        .route("/health", get(plain_handler))
        .with_odata(state)
        .layer(Extension(model()))
}

fn get_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .header(header::HOST, "services.odata.org");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

fn header_str<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_default_negotiation() {
    let (status, headers, body) = send(
        app(ODataState::default()),
        get_request("/odata/Options", &[]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "serviceRoot": "http://services.odata.org/odata/",
            "isolation": "None",
            "metadata": "minimal",
            "version": "4.0",
            "maxVersion": "4.0",
        })
    );
    assert_eq!(
        header_str(&headers, "content-type"),
        Some("application/json;odata.metadata=minimal")
    );
    assert_eq!(header_str(&headers, "odata-version"), Some("4.0"));
}

#[tokio::test]
async fn test_unsupported_media_type_returns_envelope() {
    let (status, headers, body) = send(
        app(ODataState::default()),
        get_request("/odata/Options", &[("accept", "application/xml")]),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body,
        json!({
            "error": {
                "code": "415",
                "message": "A supported MIME type could not be found that matches the acceptable MIME types for the request. The supported type(s) 'application/json;odata.metadata=none, application/json;odata.metadata=minimal, application/json, text/plain' do not match any of the acceptable MIME types 'application/xml'."
            }
        })
    );
    assert_eq!(header_str(&headers, "content-type"), Some("application/json"));
    assert!(headers.get("odata-version").is_none());
}

#[tokio::test]
async fn test_snapshot_isolation_returns_412() {
    let (status, _, body) = send(
        app(ODataState::default()),
        get_request("/odata/Options", &[("OData-Isolation", "Snapshot")]),
    )
    .await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["error"]["code"], "412");
    assert_eq!(
        body["error"]["message"],
        "OData-Isolation 'Snapshot' is not supported by this service."
    );
}

#[tokio::test]
async fn test_invalid_max_version_returns_400() {
    let (status, _, body) = send(
        app(ODataState::default()),
        get_request("/odata/Options", &[("OData-MaxVersion", "3.0")]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "If specified, the OData-MaxVersion header must be a valid OData version supported by this service between version 4.0 and 4.0."
    );
}

#[tokio::test]
async fn test_custom_capabilities() {
    let caps = ServiceCapabilities::new(
        ODataVersion::V4_0,
        ODataVersion::new(4, 1),
        [IsolationLevel::None, IsolationLevel::Snapshot],
        [MetadataLevel::None, MetadataLevel::Minimal, MetadataLevel::Full],
        ["application/json"],
    )
    .unwrap();

    let (status, headers, body) = send(
        app(ODataState::new(caps)),
        get_request(
            "/odata/Options?$format=application/json;odata.metadata=full",
            &[
                ("OData-Isolation", "Snapshot"),
                ("OData-Version", "4.0"),
                ("OData-MaxVersion", "4.1"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isolation"], "Snapshot");
    assert_eq!(body["metadata"], "full");
    assert_eq!(body["version"], "4.0");
    assert_eq!(body["maxVersion"], "4.1");
    assert_eq!(header_str(&headers, "odata-version"), Some("4.1"));
    assert_eq!(
        header_str(&headers, "content-type"),
        Some("application/json;odata.metadata=full")
    );
}

#[tokio::test]
async fn test_non_odata_routes_pass_through() {
    let response = app(ODataState::default())
        .oneshot(get_request("/health", &[("accept", "application/xml")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("odata-version").is_none());
    assert_eq!(
        header_str(response.headers(), "content-type"),
        Some("text/plain; charset=utf-8")
    );
}

#[tokio::test]
async fn test_metadata_document_is_not_decorated() {
    let response = app(ODataState::default())
        .oneshot(get_request("/odata/$metadata", &[("accept", "application/xml")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(response.headers(), "content-type"),
        Some("application/xml")
    );
    assert_eq!(header_str(response.headers(), "odata-version"), Some("4.0"));
}

#[tokio::test]
async fn test_service_document() {
    let (status, _, body) = send(
        app(ODataState::default()),
        get_request("/odata", &[]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "@odata.context": "http://services.odata.org/odata/$metadata",
            "value": [
                {"name": "Products", "kind": "EntitySet", "url": "Products"},
                {"name": "Orders", "kind": "EntitySet", "url": "Orders"}
            ]
        })
    );

    let (_, _, body) = send(
        app(ODataState::default()),
        get_request("/odata", &[("accept", "application/json;odata.metadata=none")]),
    )
    .await;
    assert!(body.get("@odata.context").is_none());
}

#[tokio::test]
async fn test_request_helpers_use_forwarded_scheme() {
    let (status, _, body) = send(
        app(ODataState::default()),
        get_request(
            "/odata/Products?$top=25&$select=Name,Price&$skip=0",
            &[("x-forwarded-proto", "https")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "@odata.context": "https://services.odata.org/odata/$metadata#Products(Name,Price)",
            "@odata.nextLink": "https://services.odata.org/odata/Products?$skip=25&$select=Name,Price&$top=25",
            "id": "https://services.odata.org/odata/Products('Milk')",
        })
    );
}

#[tokio::test]
async fn test_handler_exception_uses_envelope() {
    let (status, _, body) = send(
        app(ODataState::default()),
        get_request("/odata/Products('Tea')", &[]),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": {"code": "404", "message": "The entity 'Products('Tea')' does not exist."}})
    );
}

#[tokio::test]
async fn test_options_extractor_without_middleware_is_500() {
    let app = Router::new().route("/odata/Options", get(options_handler));
    let (status, _, body) = send(app, get_request("/odata/Options", &[])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "500");
}
