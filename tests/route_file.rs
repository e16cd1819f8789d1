//! Gateways built from a YAML route file instead of the built-in table.

use std::io::Write;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use advisor_gateway::GatewayServiceFactory;

mod common;

const ROUTES: &str = r#"
routes:
  - method: get
    path: /finnhub/*
  - method: get
    path: /finnhub/news/:ticker
    upstream: /news/:ticker
  - method: put
    path: /watchlist/:name
    upstream: /v2/watchlist/:name
"#;

fn route_file() -> tempfile::NamedTempFile {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(ROUTES.as_bytes()).unwrap();
  file
}

#[actix_web::test]
async fn param_route_beats_wildcard_registered_before_it() {
  let upstream = MockServer::start().await;
  let assets = common::asset_root();
  let routes = route_file();

  Mock::given(method("GET"))
    .and(path("/news/AAPL"))
    .respond_with(ResponseTemplate::new(200).set_body_string("param"))
    .expect(1)
    .mount(&upstream)
    .await;
  Mock::given(method("GET"))
    .and(path("/finnhub/quote/AAPL"))
    .respond_with(ResponseTemplate::new(200).set_body_string("wildcard"))
    .expect(1)
    .mount(&upstream)
    .await;

  let mut config = common::config(&upstream.uri(), &assets);
  config.routes_file = Some(routes.path().to_path_buf());
  let app = test::init_service(App::new().default_service(GatewayServiceFactory::create(common::gateway(config)))).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/finnhub/news/AAPL").to_request()).await;
  assert_eq!(test::read_body(resp).await.as_ref(), b"param");

  let resp = test::call_service(&app, test::TestRequest::get().uri("/finnhub/quote/AAPL").to_request()).await;
  assert_eq!(test::read_body(resp).await.as_ref(), b"wildcard");
}

#[actix_web::test]
async fn file_routes_replace_builtin_table() {
  let upstream = MockServer::start().await;
  let assets = common::asset_root();
  let routes = route_file();

  Mock::given(method("PUT"))
    .and(path("/v2/watchlist/growth"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&upstream)
    .await;

  let mut config = common::config(&upstream.uri(), &assets);
  config.routes_file = Some(routes.path().to_path_buf());
  let app = test::init_service(App::new().default_service(GatewayServiceFactory::create(common::gateway(config)))).await;

  let req = test::TestRequest::put()
    .uri("/watchlist/growth")
    .set_payload(r#"["AAPL"]"#)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  // /health is not in the file, so it falls through to the asset root
  let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let received = upstream.received_requests().await.unwrap();
  assert_eq!(received.len(), 1);
  assert_eq!(received[0].body, br#"["AAPL"]"#.to_vec());
}
