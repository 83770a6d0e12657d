//! Integration tests for the per-thread request context

use pretty_assertions::assert_eq;
use rstest::rstest;
use routemap::*;
use std::sync::Arc;

/// Routes library logs to the test output; later calls are no-ops
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

fn shared_mapper() -> Arc<Mapper> {
    init_tracing();
    let mut mapper = Mapper::new();
    mapper
        .collection("messages", "message", CollectionOptions::new())
        .unwrap();
    Arc::new(mapper)
}

fn environ(pairs: &[(&str, &str)]) -> Environ {
    pairs.iter().copied().collect()
}

#[rstest]
#[case(&[("HTTP_X_FORWARDED_HOST", "a.com, b.com"), ("HTTP_HOST", "c.com")], Some("a.com"))]
#[case(&[("HTTP_X_FORWARDED_HOST", "proxy.internal")], Some("proxy.internal"))]
#[case(&[("HTTP_HOST", "c.com:8443"), ("SERVER_NAME", "d.com")], Some("c.com:8443"))]
#[case(&[("SERVER_NAME", "d.com"), ("SERVER_PORT", "443"), ("wsgi.url_scheme", "https")], Some("d.com"))]
#[case(&[("SERVER_NAME", "d.com"), ("SERVER_PORT", "8000"), ("wsgi.url_scheme", "http")], Some("d.com:8000"))]
#[case(&[("PATH_INFO", "/")], None)]
fn test_host_resolution(#[case] pairs: &[(&str, &str)], #[case] expected: Option<&str>) {
    assert_eq!(resolve_host(&environ(pairs)).as_deref(), expected);
}

#[test]
fn test_load_environ_matches_with_request_method() {
    let mapper = shared_mapper();
    RequestConfig::with_mut(|config| {
        config.set_mapper(Arc::clone(&mapper));
        config.load_environ(environ(&[
            ("PATH_INFO", "/messages/8"),
            ("REQUEST_METHOD", "DELETE"),
            ("HTTP_HOST", "mail.example.com"),
        ]));
    });

    let config = RequestConfig::snapshot();
    let vars = config.mapper_dict.unwrap();
    assert_eq!(vars.get("action").map(String::as_str), Some("delete"));
    assert_eq!(vars.get("id").map(String::as_str), Some("8"));
    assert_eq!(
        config.route.unwrap().name.as_deref(),
        Some("delete_message")
    );
    assert_eq!(config.host.as_deref(), Some("mail.example.com"));
    assert_eq!(config.protocol.as_deref(), Some("http"));
    assert!(config.environ.is_some());
}

#[test]
fn test_load_environ_clears_stale_match() {
    let mapper = shared_mapper();
    RequestConfig::with_mut(|config| {
        config.set_mapper(mapper);
        config.load_environ(environ(&[("PATH_INFO", "/messages"), ("HTTP_HOST", "h")]));
        assert!(config.mapper_dict.is_some());

        config.load_environ(environ(&[("PATH_INFO", "/unknown"), ("HTTP_HOST", "h")]));
        assert!(config.mapper_dict.is_none());
        assert!(config.route.is_none());

        config.load_environ(environ(&[("PATH_INFO", "/messages"), ("HTTP_HOST", "h")]));
        config.load_environ(environ(&[("HTTP_HOST", "h")]));
        assert!(config.mapper_dict.is_none());
    });
}

#[test]
fn test_load_environ_without_mapper() {
    init_tracing();
    RequestConfig::with_mut(|config| {
        config.reset();
        config.mapper = None;
        config.load_environ(environ(&[
            ("PATH_INFO", "/messages"),
            ("HTTP_X_FORWARDED_PROTO", "https"),
            ("HTTP_HOST", "secure.example.com"),
        ]));
        assert!(config.route.is_none());
        assert_eq!(config.protocol.as_deref(), Some("https"));
        assert_eq!(
            config.qualified_url("/messages").as_deref(),
            Some("https://secure.example.com/messages")
        );
    });
}

#[test]
fn test_context_is_per_thread() {
    let mapper = shared_mapper();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mapper = Arc::clone(&mapper);
            std::thread::spawn(move || {
                let id = i.to_string();
                let path = format!("/messages/{}", id);
                let host = format!("host{}.example.com", i);
                RequestConfig::with_mut(|config| {
                    config.set_mapper(mapper);
                    config.load_environ(environ(&[
                        ("PATH_INFO", path.as_str()),
                        ("HTTP_HOST", host.as_str()),
                    ]));
                });
                std::thread::yield_now();

                let config = RequestConfig::snapshot();
                let vars = config.mapper_dict.unwrap();
                assert_eq!(vars.get("id"), Some(&id));
                assert_eq!(config.host, Some(host));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Fresh thread state stays empty
    std::thread::spawn(|| {
        assert!(RequestConfig::with(|config| config.mapper.is_none()));
    })
    .join()
    .unwrap();
}

#[test]
fn test_environ_from_http_request() {
    let mapper = shared_mapper();
    let request = http::Request::builder()
        .method("PUT")
        .uri("/messages/3.json")
        .header("Host", "api.example.com:8080")
        .header("X-Forwarded-Proto", "https")
        .body(())
        .unwrap();

    let environ = Environ::from_request(&request);
    assert_eq!(environ.request_method(), http::Method::PUT);
    assert_eq!(environ.get("HTTP_HOST"), Some("api.example.com:8080"));

    let mut config = RequestConfig::default();
    config.set_mapper(mapper);
    config.load_environ(environ);

    let vars = config.mapper_dict.as_ref().unwrap();
    assert_eq!(vars.get("action").map(String::as_str), Some("update"));
    assert_eq!(vars.get("format").map(String::as_str), Some("json"));
    assert_eq!(
        config.qualified_url("/messages/3").as_deref(),
        Some("https://api.example.com:8080/messages/3")
    );
}
