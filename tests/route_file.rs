//! Loading route files and answering calls from them.

use fetch_mock::config::loader::{build_mock, load_config, parse_config, ConfigError};
use fetch_mock::{CallFilter, RequestOptions};

mod common;

#[tokio::test]
async fn test_fixture_routes_answer_calls() {
    let file = load_config(&common::fixture("routes.toml")).unwrap();
    assert_eq!(file.routes.len(), 5);
    let fm = build_mock(&file).unwrap();
    assert_eq!(
        fm.route_identifiers(),
        vec![
            "list-users",
            "/users",
            "express:/users/:id",
            "begin:http://api.example.com/search",
            "^/v[0-9]+/health$",
        ]
    );

    let listed = fm.fetch("/users", RequestOptions::new()).await.unwrap();
    assert_eq!(listed.status, 200);
    assert_eq!(listed.body.as_deref(), Some("[]"));
    assert!(listed.headers.get_ignore_case("content-type").is_some());

    let created = fm.fetch("/users", common::method("post")).await.unwrap();
    assert_eq!(created.status, 201);

    let deleted = fm.fetch("/users/7", common::method("DELETE")).await.unwrap();
    assert_eq!(deleted.status, 204);
    let again = fm.fetch("/users/7", common::method("DELETE")).await.unwrap();
    assert_eq!(again.status, 404);
    assert_eq!(again.body.as_deref(), Some("not mocked"));

    let search = fm
        .fetch("http://API.example.com/search?q=rust", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(search.body.as_deref(), Some("results"));
    let other = fm
        .fetch("http://api.example.com/search?q=go", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(other.status, 404);

    let probe = RequestOptions::new().with_header("X-Probe", "yes");
    let healthy = fm.fetch("/v2/health", probe).await.unwrap();
    assert_eq!(healthy.body.as_deref(), Some("healthy"));

    assert_eq!(fm.calls(CallFilter::Unmatched).len(), 2);
    assert!(fm.done());
    assert_eq!(fm.last_url(CallFilter::Route("list-users")).as_deref(), Some("/users"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_config(&common::fixture("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_empty_matcher_is_rejected_with_every_error() {
    let err = parse_config(
        r#"
        [[routes]]
        matcher = ""
        response = 200

        [[routes]]
        response = 999
        "#,
    )
    .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 3);
            assert_eq!(errors[0].route, Some(0));
            assert_eq!(errors[1].route, Some(1));
        }
        other => panic!("expected validation error, got {other}"),
    }
}
