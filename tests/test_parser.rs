use tinyserve::http::parser::{ParseError, header_block_len, parse_request_head};
use tinyserve::http::request::Method;

fn head_of(raw: &[u8]) -> &[u8] {
    let len = header_block_len(raw).expect("complete header block");
    &raw[..len - 4]
}

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request_head(head_of(req)).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.target.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
}

#[test]
fn test_parse_post_request_announces_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let parsed = parse_request_head(head_of(req)).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.target.path, "/api");
    assert_eq!(parsed.content_length(), 5);
    assert_eq!(header_block_len(req), Some(req.len() - 5));
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let parsed = parse_request_head(head_of(req)).unwrap();

    assert_eq!(parsed.headers.get("host").unwrap(), "example.com");
    assert_eq!(parsed.headers.get("USER-AGENT").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
    assert_eq!(parsed.headers.len(), 3);
}

#[test]
fn test_parse_duplicate_header_last_wins() {
    let req = b"GET / HTTP/1.1\r\nX-Id: 1\r\nx-id: 2\r\n\r\n";
    let parsed = parse_request_head(head_of(req)).unwrap();

    assert_eq!(parsed.headers.get("X-Id").unwrap(), "2");
    assert_eq!(parsed.headers.len(), 1);
}

#[test]
fn test_parse_header_value_trimmed_and_keeps_colons() {
    let req = b"GET / HTTP/1.1\r\nHost: \t example.com:8080 \r\n\r\n";
    let parsed = parse_request_head(head_of(req)).unwrap();

    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com:8080");
}

#[test]
fn test_parse_request_with_query_and_fragment() {
    let req = b"GET /search?q=rust+lang&Page=2&flag#results HTTP/1.1\r\n\r\n";
    let parsed = parse_request_head(head_of(req)).unwrap();

    assert_eq!(parsed.target.path, "/search");
    assert_eq!(parsed.target.query.get("q").unwrap(), "rust lang");
    assert_eq!(parsed.target.query.get("page").unwrap(), "2");
    assert!(parsed.target.query.get("flag").is_none());
    assert_eq!(parsed.target.fragment.as_deref(), Some("results"));
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    assert_eq!(header_block_len(req), None);
}

#[test]
fn test_parse_invalid_http_method() {
    let result = parse_request_head(b"INVALID / HTTP/1.1");
    assert_eq!(result.unwrap_err(), ParseError::InvalidMethod);
}

#[test]
fn test_parse_method_is_case_insensitive() {
    let parsed = parse_request_head(b"get /x HTTP/1.1").unwrap();
    assert_eq!(parsed.method, Method::GET);
}

#[test]
fn test_parse_unsupported_version() {
    let result = parse_request_head(b"GET / HTTP/1.0");
    assert_eq!(result.unwrap_err(), ParseError::InvalidVersion);
}

#[test]
fn test_parse_wrong_token_count() {
    assert_eq!(
        parse_request_head(b"GET /").unwrap_err(),
        ParseError::InvalidRequest
    );
    assert_eq!(
        parse_request_head(b"GET / HTTP/1.1 extra").unwrap_err(),
        ParseError::InvalidRequest
    );
    assert_eq!(parse_request_head(b"").unwrap_err(), ParseError::InvalidRequest);
}

#[test]
fn test_parse_repeated_spaces_in_request_line() {
    for line in ["GET  / HTTP/1.1", "GET /  HTTP/1.1", " GET / HTTP/1.1", "GET  HTTP/1.1"] {
        assert_eq!(
            parse_request_head(line.as_bytes()).unwrap_err(),
            ParseError::InvalidRequest,
            "line {:?}",
            line
        );
    }
}

#[test]
fn test_parse_thousands_of_distinct_headers() {
    let count = 20_000;
    let mut raw = String::from("GET / HTTP/1.1");
    for i in 0..count {
        raw.push_str(&format!("\r\nh{}: v{}", i, i));
    }

    let started = std::time::Instant::now();
    let parsed = parse_request_head(raw.as_bytes()).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(parsed.headers.len(), count);
    assert_eq!(parsed.headers.get("H0").unwrap(), "v0");
    assert_eq!(parsed.headers.get("h19999").unwrap(), "v19999");
    let order: Vec<&str> = parsed.headers.iter().take(3).map(|(k, _)| k).collect();
    assert_eq!(order, vec!["h0", "h1", "h2"]);
    assert!(elapsed < std::time::Duration::from_secs(2), "took {:?}", elapsed);
}

#[test]
fn test_parse_header_without_separator_is_skipped() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\nHost: a\r\n\r\n";
    let parsed = parse_request_head(head_of(req)).unwrap();

    assert_eq!(parsed.headers.len(), 1);
    assert_eq!(parsed.headers.get("Host").unwrap(), "a");
}

#[test]
fn test_parse_non_utf8_header_block() {
    let result = parse_request_head(b"GET /\xff HTTP/1.1");
    assert_eq!(result.unwrap_err(), ParseError::InvalidEncoding);
}

#[test]
fn test_content_length_invalid_values_mean_no_body() {
    for value in ["abc", "-4", "0", ""] {
        let raw = format!("POST / HTTP/1.1\r\nContent-Length: {}", value);
        let parsed = parse_request_head(raw.as_bytes()).unwrap();
        assert_eq!(parsed.content_length(), 0, "value {:?}", value);
    }
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("CONNECT", Method::CONNECT),
        ("DELETE", Method::DELETE),
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("OPTIONS", Method::OPTIONS),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("TRACE", Method::TRACE),
    ];

    for (method_str, expected) in methods {
        let raw = format!("{} / HTTP/1.1", method_str);
        let parsed = parse_request_head(raw.as_bytes()).unwrap();
        assert_eq!(parsed.method, expected);
    }
}
