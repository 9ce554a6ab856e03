//! OpenAPI document for the REST API.
//!
//! Served at `/api-docs/openapi.json` and printed by the `openapi-dump`
//! binary.

use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::routes::{account, health, orders, products, reviews};

/// Adds the bearer JWT security scheme referenced by the guarded routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /v1/account/login/{role}, sent as `Bearer <jwt>`.",
                    ))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Online ordering system API",
        description = "Catalog, checkout, order tracking and reviews for customers and providers."
    ),
    paths(
        account::login,
        products::list_visible,
        products::get,
        products::list_all,
        products::create,
        products::update,
        products::delete,
        orders::create,
        orders::get,
        orders::status,
        orders::list_active,
        orders::list_history,
        orders::update_cart,
        orders::delete_cart,
        orders::list,
        orders::update_status,
        reviews::create,
        reviews::list_for_product,
        reviews::list,
        health::check,
    ),
    components(schemas(
        common::OrderStatus,
        common::Order,
        common::Product,
        common::Review,
        common::ReviewView,
        store::ProductSort,
    )),
    tags(
        (name = "account", description = "Token issuance"),
        (name = "products", description = "Catalog"),
        (name = "orders", description = "Checkout and order lifecycle"),
        (name = "reviews", description = "Order and product reviews"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/v1/account/login/{role}"));
        assert!(paths.contains_key("/v1/customer/orders/{id}/cart"));
        assert!(paths.contains_key("/v1/provider/reviews/orders"));
        assert!(paths.contains_key("/health"));
        assert_eq!(paths.len(), 17);
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.schemas.contains_key("OrderStatus"));
    }
}
