//! Routing of everything outside `/xhr`: static assets and health probes.

mod support;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::{fixture, rstest};
use slot_service::inbound::http::health::LifecyclePhase;
use slot_service::server::build_app;
use slot_service::test_support::TestHarness;

use support::header;

#[fixture]
fn harness() -> TestHarness {
    TestHarness::new().expect("harness")
}

#[rstest]
#[case("/", "text/html; charset=utf-8", "<h1>slots</h1>")]
#[case("/index.html", "text/html; charset=utf-8", "<h1>slots</h1>")]
#[case("/static/app.js", "text/javascript; charset=utf-8", "console.log('slots')")]
#[actix_web::test]
async fn assets_are_served_with_immutable_caching(
    harness: TestHarness,
    #[case] uri: &str,
    #[case] content_type: &str,
    #[case] body: &str,
) {
    let app = actix_test::init_service(build_app(harness.dependencies().expect("deps"))).await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header(res.headers(), "content-type"), Some(content_type));
    assert_eq!(
        header(res.headers(), "cache-control"),
        Some("max-age=31536000, immutable")
    );
    assert_eq!(header(res.headers(), "x-content-type-options"), Some("nosniff"));
    assert!(header(res.headers(), "trace-id").is_some());
    assert_eq!(&actix_test::read_body(res).await[..], body.as_bytes());
}

#[rstest]
#[case("/missing.html")]
#[case("/../Cargo.toml")]
#[case("/static/../../Cargo.toml")]
#[actix_web::test]
async fn unknown_or_escaping_paths_are_not_found(harness: TestHarness, #[case] uri: &str) {
    let app = actix_test::init_service(build_app(harness.dependencies().expect("deps"))).await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn get_on_xhr_is_not_a_command(harness: TestHarness) {
    let app = actix_test::init_service(build_app(harness.dependencies().expect("deps"))).await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/xhr").to_request()).await;

    assert_ne!(res.status(), StatusCode::OK);
}

#[rstest]
#[case(LifecyclePhase::Serving, StatusCode::OK, StatusCode::OK)]
#[case(LifecyclePhase::Draining, StatusCode::SERVICE_UNAVAILABLE, StatusCode::SERVICE_UNAVAILABLE)]
#[actix_web::test]
async fn probes_follow_the_lifecycle(
    harness: TestHarness,
    #[case] phase: LifecyclePhase,
    #[case] expect_ready: StatusCode,
    #[case] expect_live: StatusCode,
) {
    harness.health.enter(phase);
    let app = actix_test::init_service(build_app(harness.dependencies().expect("deps"))).await;

    let ready_res =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health/ready").to_request()).await;
    let live_res =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health/live").to_request()).await;

    assert_eq!(ready_res.status(), expect_ready);
    assert_eq!(live_res.status(), expect_live);
    assert_eq!(
        header(ready_res.headers(), "x-lifecycle-phase"),
        Some(phase.as_str())
    );
}
