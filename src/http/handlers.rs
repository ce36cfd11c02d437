use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::order::{Order, OrderService, ServiceError};
use crate::metrics::OrderMetrics;
use crate::store::StoreError;

pub struct AppState {
    pub service: Arc<OrderService>,
    pub metrics: Arc<OrderMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub isbn: String,
    pub quantity: i32,
}

impl OrderRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.isbn.trim().is_empty() {
            return Err("The book ISBN must be defined.".to_string());
        }
        if self.quantity < 1 {
            return Err("You must order at least 1 item.".to_string());
        }
        Ok(())
    }
}

fn error_body(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

fn service_error_response(err: &ServiceError) -> HttpResponse {
    match err {
        ServiceError::Catalog(_) => HttpResponse::BadGateway().json(error_body(err)),
        ServiceError::Store(StoreError::Conflict { .. }) => HttpResponse::Conflict().json(error_body(err)),
        _ => HttpResponse::InternalServerError().json(error_body(err)),
    }
}

pub async fn submit_order(state: web::Data<AppState>, request: web::Json<OrderRequest>) -> impl Responder {
    let request = request.into_inner();
    if let Err(message) = request.validate() {
        return HttpResponse::BadRequest().json(error_body(message));
    }

    match state.service.submit_order(request.isbn.trim(), request.quantity).await {
        Ok(order) => HttpResponse::Ok().json(order),
        Err(e) => {
            tracing::error!(error = %e, isbn = %request.isbn, "Order submission failed");
            service_error_response(&e)
        }
    }
}

pub async fn list_orders(state: web::Data<AppState>) -> impl Responder {
    let orders: Result<Vec<Order>, StoreError> = state.service.get_all_orders().try_collect().await;

    match orders {
        Ok(orders) => HttpResponse::Ok().json(orders),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list orders");
            HttpResponse::InternalServerError().json(error_body(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::http::configure;
    use crate::store::InMemoryOrderRepository;
    use crate::test_support::{lotr, FailingCatalog, FakeCatalog, RecordingPublisher};
    use crate::catalog::BookCatalog;
    use actix_web::{http::StatusCode, test, App};

    fn state_with(catalog: Arc<dyn BookCatalog>) -> web::Data<AppState> {
        let metrics = Arc::new(OrderMetrics::new().unwrap());
        let service = OrderService::new(
            catalog,
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(RecordingPublisher::accepting()),
            "order-accepted",
        )
        .with_metrics(metrics.clone());

        web::Data::new(AppState {
            service: Arc::new(service),
            metrics,
        })
    }

    fn state() -> web::Data<AppState> {
        state_with(Arc::new(FakeCatalog::with_books(vec![lotr()])))
    }

    #[::core::prelude::v1::test]
    fn test_request_validation() {
        let ok = OrderRequest { isbn: "1234567890".to_string(), quantity: 1 };
        let blank = OrderRequest { isbn: "  ".to_string(), quantity: 1 };
        let zero = OrderRequest { isbn: "1234567890".to_string(), quantity: 0 };

        assert!(ok.validate().is_ok());
        assert!(blank.validate().is_err());
        assert!(zero.validate().is_err());
    }

    #[actix_web::test]
    async fn test_post_order_for_known_book() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(OrderRequest { isbn: "1234567890".to_string(), quantity: 3 })
            .to_request();
        let order: Order = test::call_and_read_body_json(&app, req).await;

        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.book_name.as_deref(), Some("Lord of the Rings - J.R.R. Tolkien"));
        assert_eq!(order.quantity, 3);
    }

    #[actix_web::test]
    async fn test_post_order_for_unknown_book_is_rejected_not_failed() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(OrderRequest { isbn: "7390201231".to_string(), quantity: 1 })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let order: Order = test::read_body_json(resp).await;
        assert_eq!(order.status, OrderStatus::Rejected);
        assert!(order.book_name.is_none());
    }

    #[actix_web::test]
    async fn test_post_invalid_order_is_bad_request() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(OrderRequest { isbn: "1234567890".to_string(), quantity: 0 })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_catalog_outage_is_bad_gateway() {
        let app = test::init_service(
            App::new().app_data(state_with(Arc::new(FailingCatalog))).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(OrderRequest { isbn: "1234567890".to_string(), quantity: 1 })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_get_orders_lists_submissions() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        state.service.submit_order("1234567890", 1).await.unwrap();
        state.service.submit_order("7390201231", 2).await.unwrap();

        let req = test::TestRequest::get().uri("/orders").to_request();
        let orders: Vec<Order> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(orders.len(), 2);
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_exposes_order_counters() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        state.service.submit_order("1234567890", 1).await.unwrap();

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("orders_submitted_total"));
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }
}
