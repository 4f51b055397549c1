/*
 * Responsibility
 * - GET /cas/validate (CAS から redirect されてきた ticket の検証)
 * - request URL + query → service URL (ticket 除去) → serviceValidate
 * - 成功なら user を返す / 失敗は理由を問わず 401
 */
use axum::{
    Json,
    extract::{OriginalUri, Query, State},
    http::HeaderMap,
};
use casauth::build_service_url;

use crate::api::v1::dto::cas::{ValidateQuery, ValidateResponse};
use crate::error::AppError;
use crate::services::request_url::request_url;
use crate::state::AppState;

pub async fn validate(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
    headers: HeaderMap,
    // nest() strips "/api/v1" from `Uri`; the service URL needs the full path
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ValidateResponse>, AppError> {
    let ticket = query
        .ticket
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_TICKET", "ticket is required"))?;

    let base = request_url(&headers, &uri, state.public_base_url.as_deref());
    let service = build_service_url(&base, uri.query());

    // Failure details are reported by the validator's observer.
    let user = state
        .validator
        .validate_ticket(&ticket, &state.cas_server_url, service.as_str())
        .await
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(ValidateResponse {
        user: user.into_string(),
        service: service.into_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use casauth::{ClientConfig, TicketValidator};
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use crate::app::build_router;
    use crate::state::AppState;

    const PUBLIC_BASE_URL: &str = "https://app.example.org";

    fn test_app(cas_server_url: &str) -> axum::Router {
        let validator = TicketValidator::new(&ClientConfig::default()).unwrap();
        let state = AppState::new(validator, cas_server_url, Some(PUBLIC_BASE_URL));
        build_router(state, Duration::from_secs(30))
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validates_ticket_against_stripped_service_url() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/serviceValidate"))
            .and(query_param(
                "service",
                "https://app.example.org/api/v1/cas/validate?next=%2Fdocs&lang=en",
            ))
            .and(query_param("ticket", "ST-42-xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationSuccess><cas:user>alice</cas:user></cas:authenticationSuccess>
</cas:serviceResponse>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let app = test_app(&mock_server.uri());
        let (status, body) = get_json(
            app,
            "/api/v1/cas/validate?next=%2Fdocs&ticket=ST-42-xyz&lang=en",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], "alice");
        assert_eq!(
            body["service"],
            "https://app.example.org/api/v1/cas/validate?next=%2Fdocs&lang=en"
        );
    }

    #[tokio::test]
    async fn service_url_from_host_header_keeps_nested_path() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/serviceValidate"))
            .and(query_param(
                "service",
                "http://app.internal:8080/api/v1/cas/validate?next=%2F",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationSuccess><cas:user>bob</cas:user></cas:authenticationSuccess>
</cas:serviceResponse>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let validator = TicketValidator::new(&ClientConfig::default()).unwrap();
        let state = AppState::new(validator, &mock_server.uri(), None);
        let app = build_router(state, Duration::from_secs(30));

        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/cas/validate?ticket=ST-7&next=%2F")
            .header("host", "app.internal:8080")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejected_ticket_is_unauthorized() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/serviceValidate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationFailure code="INVALID_TICKET">not recognized</cas:authenticationFailure>
</cas:serviceResponse>"#,
            ))
            .mount(&mock_server)
            .await;

        let app = test_app(&mock_server.uri());
        let (status, body) = get_json(app, "/api/v1/cas/validate?ticket=ST-1").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn cas_server_error_is_unauthorized() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/serviceValidate"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let app = test_app(&mock_server.uri());
        let (status, _) = get_json(app, "/api/v1/cas/validate?ticket=ST-1").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_ticket_is_bad_request() {
        let mock_server = MockServer::start().await;
        let app = test_app(&mock_server.uri());

        let (status, body) = get_json(app, "/api/v1/cas/validate?next=%2F").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_TICKET");
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = test_app("https://cas.example.org");
        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cas_server_url"], "https://cas.example.org");
    }
}
