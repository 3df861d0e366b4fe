//! HTTP handlers for the product endpoints

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use axum_helpers::{
    errors::responses::{InternalServerErrorResponse, JsonExtractionResponse, UnauthorizedResponse},
    AuthUser, JsonBody,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{MessageBody, ProductError, ProductResult, ValidationBody};
use crate::extractor::ResolvedProduct;
use crate::models::{
    DeleteManyResult, Product, ProductDetails, ProductInput, RemoveListQuery, Repository,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;
use crate::validation::FieldError;

/// OpenAPI documentation for the product endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        read_product,
        update_product,
        remove_product,
        remove_products,
    ),
    components(
        schemas(
            Product, ProductDetails, ProductInput, Repository, DeleteManyResult,
            FieldError, MessageBody, ValidationBody
        ),
        responses(
            UnauthorizedResponse,
            JsonExtractionResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalogue endpoints")
    )
)]
pub struct ApiDoc;

/// Product routes, to be nested under the product prefix.
///
/// Reads are public; writes need an [`AuthUser`], so the application must
/// layer the JWT middleware over this router.
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route(
            "/",
            get(list_products)
                .post(create_product)
                .delete(remove_products),
        )
        .route(
            "/{code}",
            get(read_product)
                .put(update_product)
                .delete(remove_product),
        )
        .with_state(shared_service)
}

/// List every product with its repository populated
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    responses(
        (status = 200, description = "All products", body = Vec<ProductDetails>),
        (status = 400, description = "Store failure", body = MessageBody)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Json<Vec<ProductDetails>>> {
    let products = service.list().await?;
    Ok(Json(products))
}

/// Create a product owned by the caller
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product created", body = Product),
        (status = 400, description = "Invalid payload", body = ValidationBody),
        (status = 401, response = UnauthorizedResponse),
        (status = 415, response = JsonExtractionResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    user: AuthUser,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ProductResult<Json<Product>> {
    let input = ProductInput::from_create_body(body).map_err(ProductError::Validation)?;
    let product = service.create(input, user.id).await?;
    Ok(Json(product))
}

/// Get a product by code
#[utoipa::path(
    get,
    path = "/{code}",
    tag = "Products",
    params(("code" = String, Path, description = "Product code")),
    responses(
        (status = 200, description = "Product found", body = ProductDetails),
        (status = 400, description = "Unknown code", body = MessageBody),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn read_product(ResolvedProduct(product): ResolvedProduct) -> Json<ProductDetails> {
    Json(product)
}

/// Update a product; empty values are ignored and `code` cannot change
#[utoipa::path(
    put,
    path = "/{code}",
    tag = "Products",
    params(("code" = String, Path, description = "Product code")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Unknown code or invalid payload", body = ValidationBody),
        (status = 401, response = UnauthorizedResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    user: AuthUser,
    ResolvedProduct(existing): ResolvedProduct,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ProductResult<Json<Product>> {
    let input = ProductInput::from_update_body(body).map_err(ProductError::Validation)?;
    let product = service
        .update(existing.into_product(), input, user.id)
        .await?;
    Ok(Json(product))
}

/// Delete a product by code, returning the removed document
#[utoipa::path(
    delete,
    path = "/{code}",
    tag = "Products",
    params(("code" = String, Path, description = "Product code")),
    responses(
        (status = 200, description = "Product deleted", body = Product),
        (status = 400, description = "Unknown code", body = MessageBody),
        (status = 401, response = UnauthorizedResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn remove_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    _user: AuthUser,
    ResolvedProduct(existing): ResolvedProduct,
) -> ProductResult<Json<Product>> {
    let product = service.remove(existing.into_product()).await?;
    Ok(Json(product))
}

/// Delete every product whose code is listed in `?code=`
#[utoipa::path(
    delete,
    path = "",
    tag = "Products",
    params(RemoveListQuery),
    responses(
        (status = 200, description = "Products deleted", body = DeleteManyResult),
        (status = 400, description = "Missing query or store failure", body = MessageBody),
        (status = 401, response = UnauthorizedResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn remove_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    _user: AuthUser,
    Query(query): Query<RemoveListQuery>,
) -> ProductResult<Json<DeleteManyResult>> {
    let codes = query.codes().ok_or(ProductError::MissingCodes)?;
    let deleted_count = service.remove_list(codes).await?;
    Ok(Json(DeleteManyResult { deleted_count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        middleware::from_fn_with_state,
        response::Response,
    };
    use axum_helpers::{optional_jwt_auth_middleware, JwtAuth, JwtConfig};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "storefront-test-secret-0123456789abcdef";

    fn jwt() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET).unwrap())
    }

    fn app(mock_repo: MockProductRepository) -> Router {
        router(ProductService::new(mock_repo))
            .layer(from_fn_with_state(jwt(), optional_jwt_auth_middleware))
    }

    fn bearer(user_id: Uuid) -> String {
        let token = jwt()
            .create_access_token(&user_id.to_string(), "a@b.test", "Alice", &[])
            .unwrap();
        format!("Bearer {token}")
    }

    fn stored(code: &str) -> ProductDetails {
        let now = Utc::now();
        let repository_id = Uuid::now_v7();
        ProductDetails::new(
            Product {
                id: Uuid::now_v7(),
                code: code.to_string(),
                name: "Widget".into(),
                price: 10.0,
                total: 4,
                image: String::new(),
                repository_id,
                user_id: None,
                created_at: now,
                updated_at: now,
            },
            Some(Repository {
                id: repository_id,
                name: "Main".into(),
                description: None,
            }),
        )
    }

    fn json_request(method: &str, uri: &str, auth: Option<String>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_populates_repository() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_list_with_repository()
            .returning(|| Ok(vec![stored("SKU1")]));

        let response = app(mock_repo)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json[0]["code"], "SKU1");
        assert_eq!(json[0]["repositoryId"]["name"], "Main");
    }

    #[tokio::test]
    async fn test_list_store_failure_is_bad_request() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_list_with_repository()
            .returning(|| Err(ProductError::Database("connection reset".into())));

        let response = app(mock_repo)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "connection reset");
    }

    #[tokio::test]
    async fn test_list_malformed_document_is_bad_request() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_list_with_repository().returning(|| {
            Err(ProductError::Internal(
                "Malformed product document: missing field `code`".into(),
            ))
        });

        let response = app(mock_repo)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("Malformed product document"));
    }

    #[tokio::test]
    async fn test_create_requires_authentication() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_insert().never();

        let request = json_request("POST", "/", None, json!({ "code": "SKU1" }));
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_ignores_client_user_id() {
        let caller = Uuid::now_v7();
        let repository_id = Uuid::now_v7();
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_repository_exists().returning(|_| Ok(true));
        mock_repo.expect_exists_by_code().returning(|_| Ok(false));
        mock_repo.expect_insert().times(1).returning(Ok);

        let request = json_request(
            "POST",
            "/",
            Some(bearer(caller)),
            json!({
                "code": "SKU1",
                "name": "Widget",
                "price": 10,
                "repositoryId": repository_id.to_string(),
                "userId": Uuid::now_v7().to_string()
            }),
        );
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["userId"], caller.to_string());
        assert_eq!(json["total"], 0);
    }

    #[tokio::test]
    async fn test_create_invalid_payload_lists_fields() {
        let mock_repo = MockProductRepository::new();

        let request = json_request(
            "POST",
            "/",
            Some(bearer(Uuid::now_v7())),
            json!({ "name": "Widget", "price": -3, "repositoryId": Uuid::now_v7().to_string() }),
        );
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["validate"][0]["field"], "code");
    }

    #[tokio::test]
    async fn test_read_unknown_code() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_code_with_repository()
            .returning(|_| Ok(None));

        let response = app(mock_repo)
            .oneshot(Request::get("/NOPE").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "No Product with that identifier has been found"
        );
    }

    #[tokio::test]
    async fn test_read_store_fault_is_server_error() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_code_with_repository()
            .returning(|_| Err(ProductError::Database("timeout".into())));

        let response = app(mock_repo)
            .oneshot(Request::get("/SKU1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_update_unknown_code_never_writes() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_code_with_repository()
            .returning(|_| Ok(None));
        mock_repo.expect_replace().never();

        let request = json_request("PUT", "/NOPE", Some(bearer(Uuid::now_v7())), json!({ "price": 1 }));
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_with_empty_name_changes_price_only() {
        let editor = Uuid::now_v7();
        let existing = stored("SKU1");
        let mut mock_repo = MockProductRepository::new();
        let found = existing.clone();
        mock_repo
            .expect_find_by_code_with_repository()
            .withf(|code| code == "SKU1")
            .returning(move |_| Ok(Some(found.clone())));
        mock_repo.expect_replace().times(1).returning(Ok);

        let request = json_request(
            "PUT",
            "/SKU1",
            Some(bearer(editor)),
            json!({ "name": "", "price": 12, "code": "HACKED", "_id": Uuid::now_v7().to_string() }),
        );
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["name"], "Widget");
        assert_eq!(json["price"], 12.0);
        assert_eq!(json["code"], "SKU1");
        assert_eq!(json["_id"], existing.id.to_string());
        assert_eq!(json["userId"], editor.to_string());
    }

    #[tokio::test]
    async fn test_remove_returns_deleted_product() {
        let existing = stored("SKU1");
        let id = existing.id;
        let mut mock_repo = MockProductRepository::new();
        let found = existing.clone();
        mock_repo
            .expect_find_by_code_with_repository()
            .returning(move |_| Ok(Some(found.clone())));
        let removed = existing.clone().into_product();
        mock_repo
            .expect_delete()
            .withf(move |candidate| *candidate == id)
            .returning(move |_| Ok(Some(removed.clone())));

        let request = Request::delete("/SKU1")
            .header(header::AUTHORIZATION, bearer(Uuid::now_v7()))
            .body(Body::empty())
            .unwrap();
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["code"], "SKU1");
    }

    #[tokio::test]
    async fn test_remove_requires_authentication_before_lookup() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_find_by_code_with_repository().never();
        mock_repo.expect_delete().never();

        let response = app(mock_repo)
            .oneshot(Request::delete("/SKU1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_remove_list_parses_codes() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_delete_by_codes()
            .withf(|codes| codes == &vec!["SKU1".to_string(), "SKU2".to_string()])
            .times(1)
            .returning(|_| Ok(2));

        let request = Request::delete("/?code=SKU1,%20SKU2,")
            .header(header::AUTHORIZATION, bearer(Uuid::now_v7()))
            .body(Body::empty())
            .unwrap();
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["deletedCount"], 2);
    }

    #[tokio::test]
    async fn test_remove_list_without_code_query() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_delete_by_codes().never();

        let request = Request::delete("/")
            .header(header::AUTHORIZATION, bearer(Uuid::now_v7()))
            .body(Body::empty())
            .unwrap();
        let response = app(mock_repo).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "Query parameter 'code' is required"
        );
    }
}
