//! OData service document (`GET {service root}`)

use std::sync::Arc;

use axum::{Extension, Json};
use serde::Serialize;

use odata_core::{EntityDataModel, EntitySet};

use crate::extract::ODataRequest;

pub const ENTITY_SET_KIND: &str = "EntitySet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDocument {
    #[serde(rename = "@odata.context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub value: Vec<ServiceDocumentItem>,
}

/// One entity set listed in the service document; `url` is relative to the service root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDocumentItem {
    pub name: String,
    pub kind: &'static str,
    pub url: String,
}

impl From<&EntitySet> for ServiceDocumentItem {
    fn from(entity_set: &EntitySet) -> Self {
        Self {
            name: entity_set.name().to_owned(),
            kind: ENTITY_SET_KIND,
            url: entity_set.name().to_owned(),
        }
    }
}

impl ServiceDocument {
    #[must_use]
    pub fn new(context: Option<String>, model: &EntityDataModel) -> Self {
        Self {
            context,
            value: model
                .entity_sets()
                .iter()
                .map(ServiceDocumentItem::from)
                .collect(),
        }
    }
}

/// Handler for the service root. Needs the model as an `Arc<EntityDataModel>` extension.
#[allow(clippy::unused_async)]
pub async fn service_document(
    request: ODataRequest,
    Extension(model): Extension<Arc<EntityDataModel>>,
) -> Json<ServiceDocument> {
    Json(ServiceDocument::new(request.resolve_context(), &model))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use odata_core::EntityKeyType;

    #[test]
    fn lists_entity_sets_in_model_order() {
        let model = EntityDataModel::new()
            .with_entity_set(EntitySet::new("Products", EntityKeyType::String))
            .with_entity_set(EntitySet::new("Orders", EntityKeyType::Int32));
        let doc = ServiceDocument::new(
            Some("https://services.odata.org/OData/$metadata".to_owned()),
            &model,
        );

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            serde_json::json!({
                "@odata.context": "https://services.odata.org/OData/$metadata",
                "value": [
                    {"name": "Products", "kind": "EntitySet", "url": "Products"},
                    {"name": "Orders", "kind": "EntitySet", "url": "Orders"}
                ]
            })
        );
    }

    #[test]
    fn context_omitted_without_metadata() {
        let doc = ServiceDocument::new(None, &EntityDataModel::new());
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"value":[]}"#);
    }
}
