//! End-to-end view rendering through an axum router

use std::path::PathBuf;
use std::sync::Arc;

use acton_views::prelude::*;
use acton_views::{AppEnvironment, ViewsSettings};
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use axum_test::TestServer;

fn config() -> ViewsConfig {
    ViewsConfig {
        views: ViewsSettings {
            environment: AppEnvironment::Production,
            template_dirs: vec![PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/templates")],
            webapp_dir: None,
        },
    }
}

async fn attach_attributes(mut req: Request, next: Next) -> Response {
    let mut attributes = RequestAttributes::new();
    attributes.insert("request", "request");
    attributes.insert("local", "request");
    req.extensions_mut().insert(attributes);
    next.run(req).await
}

fn app() -> Router {
    let mut global = GlobalModel::new();
    global.insert("global", "global");
    global.insert("request", "global");
    global.insert("local", "global");

    let mut registry = ViewResolverRegistry::new();
    TemplateModule::new(config())
        .with_embedded([("ftl/greeting.ftl", "Hi {{ name }}")])
        .start(&mut registry, Arc::new(global));

    Router::new()
        .route(
            "/variables",
            get(|| async { TemplateView::with_model("/variable.ftl", Model::new().with("local", "local")) }),
        )
        .route(
            "/greeting",
            get(|| async { TemplateView::with_model("greeting", Model::new().with("name", "Ada")) }),
        )
        .route(
            "/created",
            get(|| async {
                TemplateView::builder("basic-relative")
                    .model(Model::new().with("message", "made"))
                    .status(StatusCode::CREATED)
                    .header("Location", "/things/1")
                    .cookie(
                        Cookie::build("flash")
                            .value("created")
                            .path("/")
                            .http_only(true)
                            .same_site(SameSite::Strict)
                            .build(),
                    )
                    .build()
            }),
        )
        .route("/missing", get(|| async { TemplateView::new("nowhere") }))
        .route("/health", get(|| async { "ok" }))
        .layer(registry.into_layer())
        .layer(middleware::from_fn(attach_attributes))
}

#[tokio::test]
async fn renders_with_all_three_variable_sources() {
    let server = TestServer::new(app()).unwrap();

    let response = server.get("/variables").await;

    response.assert_status_ok();
    response.assert_text("Template with global and request and local");
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html; charset=UTF-8"
    );
}

#[tokio::test]
async fn embedded_templates_are_searched_first() {
    let server = TestServer::new(app()).unwrap();

    let response = server.get("/greeting").await;

    response.assert_status_ok();
    response.assert_text("Hi Ada");
}

#[tokio::test]
async fn view_metadata_reaches_the_client() {
    let server = TestServer::new(app()).unwrap();

    let response = server.get("/created").await;

    response.assert_status(StatusCode::CREATED);
    response.assert_text("made");
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/things/1");
    assert_eq!(
        response.headers().get(header::SET_COOKIE).unwrap(),
        "flash=created; Path=/; SameSite=Strict; HttpOnly"
    );
}

#[tokio::test]
async fn missing_template_is_a_server_error() {
    let server = TestServer::new(app()).unwrap();

    let response = server.get("/missing").expect_failure().await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_text("Template rendering failed");
}

#[tokio::test]
async fn non_view_responses_are_untouched() {
    let server = TestServer::new(app()).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("ok");
}
