//! Demo catalogue served over OData: `Products` keyed by name, `Orders` keyed by id.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use odata_axum::{ODataRequest, ODataRouterExt, ODataState, service_document};
use odata_core::{
    EntityDataModel, EntityKeyType, EntitySet, KeyLiteral, MetadataLevel, ODataException,
    SelectOption,
};
use serde::Serialize;
use serde_json::{Map, Value};

const PRODUCTS: &str = "Products";
const ORDERS: &str = "Orders";

const METADATA_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
  <edmx:DataServices>
    <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="Demo">
      <EntityType Name="Product">
        <Key><PropertyRef Name="Name"/></Key>
        <Property Name="Name" Type="Edm.String" Nullable="false"/>
        <Property Name="Price" Type="Edm.Decimal" Nullable="false"/>
        <Property Name="Category" Type="Edm.String"/>
      </EntityType>
      <EntityType Name="Order">
        <Key><PropertyRef Name="OrderId"/></Key>
        <Property Name="OrderId" Type="Edm.Int32" Nullable="false"/>
        <Property Name="Name" Type="Edm.String"/>
        <Property Name="Quantity" Type="Edm.Int32" Nullable="false"/>
      </EntityType>
      <EntityContainer Name="DefaultContainer">
        <EntitySet Name="Products" EntityType="Demo.Product"/>
        <EntitySet Name="Orders" EntityType="Demo.Order"/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>
"#;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub name: String,
    pub price: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    pub order_id: i32,
    pub name: String,
    pub quantity: i32,
}

/// In-memory data behind the demo routes.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub page_size: u64,
}

impl Catalog {
    #[must_use]
    pub fn model() -> EntityDataModel {
        EntityDataModel::new()
            .with_entity_set(EntitySet::new(PRODUCTS, EntityKeyType::String))
            .with_entity_set(EntitySet::new(ORDERS, EntityKeyType::Int32))
    }

    #[must_use]
    pub fn sample(page_size: u64) -> Self {
        let product = |name: &str, price: &str, category: &str| Product {
            name: name.to_owned(),
            price: price.to_owned(),
            category: category.to_owned(),
        };
        let order = |order_id: i32, name: &str, quantity: i32| Order {
            order_id,
            name: name.to_owned(),
            quantity,
        };

        Self {
            products: vec![
                product("Milk", "1.15", "Dairy"),
                product("Butter", "2.40", "Dairy"),
                product("Bread", "1.80", "Bakery"),
                product("Apples", "0.95", "Fruit"),
                product("Coffee", "5.20", "Beverages"),
            ],
            orders: vec![
                order(12345, "Weekly shop", 4),
                order(12346, "Office supplies", 12),
            ],
            page_size: page_size.max(1),
        }
    }

    fn rows(&self, set: &EntitySet) -> Vec<Value> {
        let rows: Result<Vec<Value>, serde_json::Error> = if set.name() == PRODUCTS {
            self.products.iter().map(serde_json::to_value).collect()
        } else {
            self.orders.iter().map(serde_json::to_value).collect()
        };
        rows.unwrap_or_default()
    }

    fn find(&self, set: &EntitySet, key: &KeyPredicate) -> Option<Value> {
        let found = match (set.name(), key) {
            (PRODUCTS, KeyPredicate::Text(name)) => self
                .products
                .iter()
                .find(|p| p.name == *name)
                .map(serde_json::to_value),
            (ORDERS, KeyPredicate::Number(id)) => self
                .orders
                .iter()
                .find(|o| i64::from(o.order_id) == *id)
                .map(serde_json::to_value),
            _ => None,
        };
        found.and_then(Result::ok)
    }
}

/// Parsed `Name(key)` path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyPredicate {
    Number(i64),
    Text(String),
}

impl KeyLiteral for KeyPredicate {
    fn key_literal(&self) -> String {
        match self {
            KeyPredicate::Number(n) => n.key_literal(),
            KeyPredicate::Text(s) => s.key_literal(),
        }
    }
}

/// Split `Products('Milk')` into `("Products", Some(Text("Milk")))`.
fn parse_segment(segment: &str) -> Option<(&str, Option<KeyPredicate>)> {
    let Some((name, rest)) = segment.split_once('(') else {
        return Some((segment, None));
    };
    let raw = rest.strip_suffix(')')?;
    let key = match raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        Some(text) => KeyPredicate::Text(text.to_owned()),
        None => KeyPredicate::Number(raw.trim().parse().ok()?),
    };
    Some((name, Some(key)))
}

fn not_found(segment: &str) -> ODataException {
    ODataException::not_found(format!("The resource '{segment}' does not exist."))
        .with_target(segment.to_owned())
}

fn project(row: Value, select: Option<&SelectOption>) -> Value {
    match (row, select) {
        (Value::Object(map), Some(SelectOption::Properties(props))) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| props.iter().any(|p| p.eq_ignore_ascii_case(k)))
                .collect(),
        ),
        (row, _) => row,
    }
}

fn with_annotation(
    mut body: Map<String, Value>,
    name: &str,
    value: Option<String>,
) -> Map<String, Value> {
    if let Some(value) = value {
        body.insert(name.to_owned(), Value::String(value));
    }
    body
}

fn collection(request: &ODataRequest, catalog: &Catalog, set: &EntitySet) -> Value {
    let query = request.query();
    let rows = catalog.rows(set);
    let total = u64::try_from(rows.len()).unwrap_or(u64::MAX);

    let skip = query.skip_value().unwrap_or(0);
    let page_size = query
        .top_value()
        .map_or(catalog.page_size, |top| top.min(catalog.page_size));
    let select = query.select_option();

    let value: Vec<Value> = rows
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(usize::try_from(page_size).unwrap_or(usize::MAX))
        .map(|row| project(row, select.as_ref()))
        .collect();

    let requested_more = query.top_value().is_none_or(|top| top > page_size);
    let next_link = (requested_more && skip.saturating_add(page_size) < total)
        .then(|| request.next_link(skip, page_size));

    let mut body = with_annotation(
        Map::new(),
        "@odata.context",
        request.resolve_context_with_select(set),
    );
    if query.count_requested() {
        body.insert("@odata.count".to_owned(), Value::from(total));
    }
    body.insert("value".to_owned(), Value::Array(value));
    Value::Object(with_annotation(body, "@odata.nextLink", next_link))
}

fn entity(request: &ODataRequest, set: &EntitySet, key: &KeyPredicate, row: Value) -> Value {
    let id = (request.metadata_level() != MetadataLevel::None)
        .then(|| request.resolve_id(set, key));
    let mut body = with_annotation(
        Map::new(),
        "@odata.context",
        request.resolve_context_for_entity(set),
    );
    body = with_annotation(body, "@odata.id", id);
    if let Value::Object(fields) = row {
        body.extend(fields);
    }
    Value::Object(body)
}

/// `GET /odata/{resource}`: an entity set or a single entity.
#[allow(clippy::unused_async)]
async fn get_resource(
    Path(resource): Path<String>,
    request: ODataRequest,
    Extension(model): Extension<Arc<EntityDataModel>>,
    Extension(catalog): Extension<Arc<Catalog>>,
) -> Result<Json<Value>, ODataException> {
    let (name, key) = parse_segment(&resource).ok_or_else(|| not_found(&resource))?;
    let set = model.entity_set(name).ok_or_else(|| not_found(&resource))?;

    let body = match key {
        None => collection(&request, &catalog, set),
        Some(key) => {
            let row = catalog.find(set, &key).ok_or_else(|| not_found(&resource))?;
            entity(&request, set, &key, row)
        }
    };
    Ok(Json(body))
}

/// `GET /odata/{resource}/{property}`: one property of an entity.
#[allow(clippy::unused_async)]
async fn get_property(
    Path((resource, property)): Path<(String, String)>,
    request: ODataRequest,
    Extension(model): Extension<Arc<EntityDataModel>>,
    Extension(catalog): Extension<Arc<Catalog>>,
) -> Result<Json<Value>, ODataException> {
    let (name, key) = parse_segment(&resource).ok_or_else(|| not_found(&resource))?;
    let set = model.entity_set(name).ok_or_else(|| not_found(&resource))?;
    let Some(key) = key else {
        return Err(ODataException::bad_request(format!(
            "A key is required to address the property '{property}' of '{name}'."
        )));
    };

    let row = catalog.find(set, &key).ok_or_else(|| not_found(&resource))?;
    let value = row
        .get(&property)
        .cloned()
        .ok_or_else(|| not_found(&format!("{resource}/{property}")))?;

    let mut body = with_annotation(
        Map::new(),
        "@odata.context",
        request.resolve_context_for_property(set, &key, &property),
    );
    body.insert("value".to_owned(), value);
    Ok(Json(Value::Object(body)))
}

#[allow(clippy::unused_async)]
async fn metadata_document() -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], METADATA_XML).into_response()
}

/// Router for the demo service, with OData negotiation installed.
pub fn router(state: ODataState, catalog: Catalog) -> Router {
    let prefix = state.route_prefix().to_owned();
    Router::new()
        .route(&format!("/{prefix}"), get(service_document))
        .route(&format!("/{prefix}/$metadata"), get(metadata_document))
        .route(&format!("/{prefix}/{{resource}}"), get(get_resource))
        .route(
            &format!("/{prefix}/{{resource}}/{{property}}"),
            get(get_property),
        )
        .with_odata(state)
        .layer(Extension(Arc::new(Catalog::model())))
        .layer(Extension(Arc::new(catalog)))
}
