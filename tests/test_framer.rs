mod common;

use common::chunked_connection;
use tinyserve::http::framer::{FrameError, FrameLimits, RequestFramer};
use tinyserve::http::parser::ParseError;
use tinyserve::http::request::Method;

#[tokio::test]
async fn test_frame_single_request() {
    let mut conn = chunked_connection([b"GET /index.html HTTP/1.1\r\nHost: a\r\n\r\n"]);
    let mut framer = RequestFramer::default();

    let req = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path(), "/index.html");
    assert!(req.body.is_none());
    assert_eq!(req.peer, Some(common::test_peer()));

    // Peer closed afterwards: clean end of stream
    assert!(framer.next_request(&mut conn).await.unwrap().is_none());
}

#[tokio::test]
async fn test_frame_one_byte_at_a_time() {
    let raw = b"POST /submit HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world";
    let mut conn = chunked_connection(raw.iter().map(|b| [*b]));
    let mut framer = RequestFramer::default();

    let req = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.body.as_deref(), Some(&b"hello world"[..]));
    assert_eq!(req.content_length(), 11);
}

#[tokio::test]
async fn test_frame_terminator_split_across_reads() {
    let mut conn = chunked_connection([&b"GET / HTTP/1.1\r\nHost: a\r"[..], b"\n\r", b"\n"]);
    let mut framer = RequestFramer::default();

    let req = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert_eq!(req.header("Host"), Some("a"));
}

#[tokio::test]
async fn test_frame_pipelined_requests_in_one_read() {
    let raw = b"POST /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcGET /b HTTP/1.1\r\n\r\nGET /c HTTP/1.1\r\n\r\n";
    let mut conn = chunked_connection([raw]);
    let mut framer = RequestFramer::default();

    let first = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert_eq!(first.path(), "/a");
    assert_eq!(first.body.as_deref(), Some(&b"abc"[..]));

    let second = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert_eq!(second.path(), "/b");
    assert!(second.body.is_none());

    let third = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert_eq!(third.path(), "/c");

    assert!(framer.buffered().is_empty());
    assert!(framer.next_request(&mut conn).await.unwrap().is_none());
}

#[tokio::test]
async fn test_frame_body_arriving_with_header_block() {
    let mut conn = chunked_connection([
        &b"PUT /x HTTP/1.1\r\nContent-Length: 6\r\n\r\nab"[..],
        b"cd",
        b"ef",
    ]);
    let mut framer = RequestFramer::default();

    let req = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert_eq!(req.body.as_deref(), Some(&b"abcdef"[..]));
}

#[tokio::test]
async fn test_frame_truncated_body() {
    let mut conn = chunked_connection([b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello"]);
    let mut framer = RequestFramer::default();

    let err = framer.next_request(&mut conn).await.unwrap_err();
    assert!(matches!(err, FrameError::Truncated { .. }));
    assert!(!conn.is_open());
}

#[tokio::test]
async fn test_frame_truncated_header_block() {
    let mut conn = chunked_connection([b"GET / HTTP/1.1\r\nHost: a\r\n"]);
    let mut framer = RequestFramer::default();

    let err = framer.next_request(&mut conn).await.unwrap_err();
    assert!(matches!(err, FrameError::Truncated { .. }));
}

#[tokio::test]
async fn test_frame_malformed_start_line() {
    let mut conn = chunked_connection([b"BREW /pot HTTP/1.1\r\n\r\n"]);
    let mut framer = RequestFramer::default();

    let err = framer.next_request(&mut conn).await.unwrap_err();
    assert!(matches!(err, FrameError::Malformed(ParseError::InvalidMethod)));
}

#[tokio::test]
async fn test_frame_header_block_too_large() {
    let limits = FrameLimits {
        max_header_bytes: 32,
        ..FrameLimits::default()
    };
    let mut conn = chunked_connection([format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", "a".repeat(64))]);
    let mut framer = RequestFramer::new(limits);

    let err = framer.next_request(&mut conn).await.unwrap_err();
    assert!(matches!(err, FrameError::TooLarge { limit: 32 }));
}

#[tokio::test]
async fn test_frame_body_too_large() {
    let limits = FrameLimits {
        max_body_bytes: 4,
        ..FrameLimits::default()
    };
    let mut conn = chunked_connection([b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello"]);
    let mut framer = RequestFramer::new(limits);

    let err = framer.next_request(&mut conn).await.unwrap_err();
    assert!(matches!(err, FrameError::TooLarge { limit: 4 }));
}

#[tokio::test]
async fn test_frame_non_numeric_content_length_has_no_body() {
    let mut conn = chunked_connection([b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n"]);
    let mut framer = RequestFramer::default();

    let req = framer.next_request(&mut conn).await.unwrap().unwrap();
    assert!(req.body.is_none());
}

#[tokio::test]
async fn test_frame_empty_stream_is_clean_close() {
    let mut conn = chunked_connection(Vec::<Vec<u8>>::new());
    let mut framer = RequestFramer::default();

    assert!(framer.next_request(&mut conn).await.unwrap().is_none());
}
