use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::uuid_str;
use crate::validation::{
    cast_integer, cast_number, cast_string, cast_uuid, from_validation_errors,
    is_considerably_empty, FieldError,
};

/// Keys a client can never set through a request body
const SERVER_MANAGED_KEYS: [&str; 5] = ["_id", "id", "userId", "createdAt", "updatedAt"];

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id", with = "uuid_str")]
    pub id: Uuid,

    /// Business identifier, unique and immutable after creation
    #[validate(length(min = 1, max = 64, message = "code must be between 1 and 64 characters"))]
    #[schema(example = "SKU1")]
    pub code: String,

    #[validate(length(
        min = 1,
        max = 200,
        message = "name must be between 1 and 200 characters"
    ))]
    #[schema(example = "Widget")]
    pub name: String,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    #[schema(example = 9.99)]
    pub price: f64,

    /// Units in stock
    #[serde(default)]
    #[validate(range(min = 0, message = "total must not be negative"))]
    pub total: i64,

    /// Image URL, empty when the product has none
    #[serde(default)]
    #[validate(length(max = 2048, message = "image must be at most 2048 characters"))]
    pub image: String,

    /// The repository (stock location) holding this product
    #[serde(with = "uuid_str")]
    pub repository_id: Uuid,

    /// Last user to create or update the product
    #[serde(default, with = "uuid_str::option")]
    pub user_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new product owned by `user_id`.
    ///
    /// Fails with one [`FieldError`] per missing required field (`code`,
    /// `name`, `price`, `repositoryId`). Range and length rules are checked
    /// separately by [`Product::check_rules`].
    pub fn from_input(input: ProductInput, user_id: Uuid) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let code = required(input.code, "code", &mut errors);
        let name = required(input.name, "name", &mut errors);
        let price = required(input.price, "price", &mut errors);
        let repository_id = required(input.repository_id, "repositoryId", &mut errors);

        match (code, name, price, repository_id) {
            (Some(code), Some(name), Some(price), Some(repository_id)) => {
                let now = Utc::now();
                Ok(Self {
                    id: Uuid::now_v7(),
                    code,
                    name,
                    price,
                    total: input.total.unwrap_or(0),
                    image: input.image.unwrap_or_default(),
                    repository_id,
                    user_id: Some(user_id),
                    created_at: now,
                    updated_at: now,
                })
            }
            _ => Err(errors),
        }
    }

    /// Merge the present fields of `input` into this product.
    ///
    /// `code` and `id` never change here. The caller becomes the product's user.
    pub fn apply_update(&mut self, input: ProductInput, user_id: Uuid) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(price) = input.price {
            self.price = price;
        }
        if let Some(total) = input.total {
            self.total = total;
        }
        if let Some(image) = input.image {
            self.image = image;
        }
        if let Some(repository_id) = input.repository_id {
            self.repository_id = repository_id;
        }
        self.user_id = Some(user_id);
        self.updated_at = Utc::now();
    }

    /// Run the length and range rules declared on the fields.
    pub fn check_rules(&self) -> Result<(), Vec<FieldError>> {
        self.validate().map_err(|e| from_validation_errors(&e))
    }
}

fn required<T>(value: Option<T>, field: &str, errors: &mut Vec<FieldError>) -> Option<T> {
    if value.is_none() {
        errors.push(FieldError::required(field));
    }
    value
}

/// Stock location a product belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    #[serde(rename = "_id", alias = "id", with = "uuid_str")]
    pub id: Uuid,
    #[schema(example = "Main warehouse")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A product as returned by list and read: `repositoryId` carries the
/// referenced repository itself, or `null` when it no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub price: f64,
    pub total: i64,
    pub image: String,
    #[serde(skip)]
    pub repository_id: Uuid,
    #[serde(rename = "repositoryId")]
    pub repository: Option<Repository>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductDetails {
    pub fn new(product: Product, repository: Option<Repository>) -> Self {
        Self {
            id: product.id,
            code: product.code,
            name: product.name,
            price: product.price,
            total: product.total,
            image: product.image,
            repository_id: product.repository_id,
            repository,
            user_id: product.user_id,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }

    /// Drop the populated repository, keeping only its id.
    pub fn into_product(self) -> Product {
        Product {
            id: self.id,
            code: self.code,
            name: self.name,
            price: self.price,
            total: self.total,
            image: self.image,
            repository_id: self.repository_id,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Writable product fields, coerced from a raw JSON object.
///
/// `None` means the field was absent (or considerably empty) in the body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[schema(example = "SKU1")]
    pub code: Option<String>,
    #[schema(example = "Widget")]
    pub name: Option<String>,
    #[schema(example = 9.99)]
    pub price: Option<f64>,
    pub total: Option<i64>,
    pub image: Option<String>,
    pub repository_id: Option<Uuid>,
}

impl ProductInput {
    /// Body of a create request. Server-managed keys are discarded.
    pub fn from_create_body(body: Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        Self::from_body(body, &[])
    }

    /// Body of an update request. Server-managed keys and `code` are discarded.
    pub fn from_update_body(body: Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        Self::from_body(body, &["code"])
    }

    fn from_body(mut body: Map<String, Value>, immutable: &[&str]) -> Result<Self, Vec<FieldError>> {
        for key in SERVER_MANAGED_KEYS.iter().chain(immutable.iter()) {
            body.remove(*key);
        }

        let mut input = Self::default();
        let mut errors = Vec::new();

        for (key, value) in body {
            if is_considerably_empty(&value) {
                continue;
            }

            let outcome = match key.as_str() {
                "code" => cast_string(&key, value).map(|v| input.code = Some(v)),
                "name" => cast_string(&key, value).map(|v| input.name = Some(v)),
                "price" => cast_number(&key, value).map(|v| input.price = Some(v)),
                "total" => cast_integer(&key, value).map(|v| input.total = Some(v)),
                "image" => cast_string(&key, value).map(|v| input.image = Some(v)),
                "repositoryId" => cast_uuid(&key, value).map(|v| input.repository_id = Some(v)),
                _ => Ok(()),
            };

            if let Err(e) = outcome {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }
}

/// Query for bulk removal
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemoveListQuery {
    /// Comma-separated product codes, e.g. `SKU1,SKU2`
    pub code: Option<String>,
}

impl RemoveListQuery {
    /// The requested codes, trimmed with blanks dropped. `None` when the
    /// parameter is missing altogether.
    pub fn codes(&self) -> Option<Vec<String>> {
        self.code.as_deref().map(parse_codes)
    }
}

pub fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(String::from)
        .collect()
}

/// Outcome of a bulk removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyResult {
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn sample_product() -> Product {
        let input = ProductInput {
            code: Some("SKU1".into()),
            name: Some("Widget".into()),
            price: Some(10.0),
            repository_id: Some(Uuid::now_v7()),
            ..Default::default()
        };
        Product::from_input(input, Uuid::now_v7()).unwrap()
    }

    #[test]
    fn test_create_body_discards_server_managed_keys() {
        let caller = Uuid::now_v7();
        let input = ProductInput::from_create_body(body(json!({
            "_id": "client-chosen",
            "userId": caller.to_string(),
            "code": "SKU1",
            "name": "Widget",
            "price": "10",
            "repositoryId": Uuid::now_v7().to_string(),
            "color": "red"
        })))
        .unwrap();

        assert_eq!(input.code.as_deref(), Some("SKU1"));
        assert_eq!(input.price, Some(10.0));
    }

    #[test]
    fn test_update_body_drops_code_and_empty_values() {
        let input = ProductInput::from_update_body(body(json!({
            "_id": Uuid::now_v7().to_string(),
            "id": "x",
            "code": "NEW",
            "name": "",
            "image": null,
            "price": 12
        })))
        .unwrap();

        assert_eq!(
            input,
            ProductInput {
                price: Some(12.0),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_update_body_keeps_zero_total() {
        let input = ProductInput::from_update_body(body(json!({ "total": 0 }))).unwrap();
        assert_eq!(input.total, Some(0));
    }

    #[test]
    fn test_body_cast_failures_are_field_errors() {
        let errors = ProductInput::from_create_body(body(json!({
            "price": "cheap",
            "repositoryId": 7
        })))
        .unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["price", "repositoryId"]);
    }

    #[test]
    fn test_from_input_reports_every_missing_field() {
        let errors = Product::from_input(ProductInput::default(), Uuid::now_v7()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["code", "name", "price", "repositoryId"]);
    }

    #[test]
    fn test_from_input_defaults_and_owner() {
        let user = Uuid::now_v7();
        let input = ProductInput {
            code: Some("SKU1".into()),
            name: Some("Widget".into()),
            price: Some(10.0),
            repository_id: Some(Uuid::now_v7()),
            ..Default::default()
        };

        let product = Product::from_input(input, user).unwrap();

        assert_eq!(product.total, 0);
        assert_eq!(product.image, "");
        assert_eq!(product.user_id, Some(user));
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_apply_update_never_touches_code() {
        let mut product = sample_product();
        let editor = Uuid::now_v7();
        product.apply_update(
            ProductInput {
                code: Some("OTHER".into()),
                price: Some(12.0),
                ..Default::default()
            },
            editor,
        );

        assert_eq!(product.code, "SKU1");
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, 12.0);
        assert_eq!(product.user_id, Some(editor));
    }

    #[test]
    fn test_check_rules() {
        let mut product = sample_product();
        assert!(product.check_rules().is_ok());

        product.price = -1.0;
        product.total = -5;
        let errors = product.check_rules().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["price", "total"]);
    }

    #[test]
    fn test_product_serializes_mongo_id() {
        let product = sample_product();
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["_id"], product.id.to_string());
        assert_eq!(json["repositoryId"], product.repository_id.to_string());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_details_populate_repository_id() {
        let product = sample_product();
        let repository = Repository {
            id: product.repository_id,
            name: "Main".into(),
            description: None,
        };

        let json = serde_json::to_value(ProductDetails::new(product.clone(), Some(repository)))
            .unwrap();
        assert_eq!(json["repositoryId"]["name"], "Main");
        assert_eq!(json["repositoryId"]["_id"], product.repository_id.to_string());

        let json = serde_json::to_value(ProductDetails::new(product, None)).unwrap();
        assert!(json["repositoryId"].is_null());
    }

    #[test]
    fn test_details_round_trip_to_product() {
        let product = sample_product();
        let details = ProductDetails::new(product.clone(), None);
        assert_eq!(details.into_product(), product);
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse_codes("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_codes(" , ").is_empty());
    }

    #[test]
    fn test_remove_list_query_codes() {
        assert_eq!(RemoveListQuery { code: None }.codes(), None);
        assert_eq!(
            RemoveListQuery {
                code: Some("SKU1".into())
            }
            .codes(),
            Some(vec!["SKU1".to_string()])
        );
    }
}
