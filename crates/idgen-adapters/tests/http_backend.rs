//! HTTP backend tests against a one-shot local server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;
use std::time::Duration;

use idgen_adapters::HttpBackend;
use idgen_core::imaging::BgrImage;
use idgen_core::{DepthEstimator, FaceAnalyzer, SafetyClassifier};
use idgen_test_support::SyntheticImageBuilder;

/// Serves one request with `status` and `body`, returning the request body.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" {
                break;
            }
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        format!("{}{}", request_line, String::from_utf8(request_body).unwrap())
    });

    (url, handle)
}

fn backend(url: &str) -> HttpBackend {
    HttpBackend::new(url, Duration::from_secs(5)).unwrap()
}

#[test]
fn test_faces_round_trip() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"faces":[{"bbox":[10,20,110,140],"embedding":[0.1,0.2],"kps":[[30,50],[90,50],[60,80],[40,110],[80,110]]}]}"#,
    );
    let image = BgrImage::from_dynamic(&SyntheticImageBuilder::portrait(64, 64));
    let faces = backend(&url).detect(&image, (640, 480)).unwrap();

    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].kps.len(), 5);
    let request = server.join().unwrap();
    assert!(request.starts_with("POST /v1/faces"));
    assert!(request.contains(r#""det_size":[640,480]"#));
}

#[test]
fn test_depth_response_mapped() {
    let (url, server) = serve_once("200 OK", r#"{"width":2,"height":1,"values":[0.5,1.5]}"#);
    let depth = backend(&url)
        .estimate(&SyntheticImageBuilder::solid(8, 8, [1, 2, 3]))
        .unwrap();

    assert_eq!((depth.width, depth.height), (2, 1));
    assert_eq!(depth.values, vec![0.5, 1.5]);
    assert!(server.join().unwrap().starts_with("POST /v1/depth"));
}

#[test]
fn test_safety_flags_returned() {
    let (url, server) = serve_once("200 OK", r#"{"has_nsfw_concepts":[true]}"#);
    let flags = backend(&url)
        .check(&[SyntheticImageBuilder::solid(8, 8, [0, 0, 0])])
        .unwrap();

    assert_eq!(flags, vec![true]);
    server.join().unwrap();
}

#[test]
fn test_error_status_carries_body() {
    let (url, server) = serve_once("500 Internal Server Error", r#"{"error":"out of memory"}"#);
    let err = backend(&url)
        .estimate(&SyntheticImageBuilder::solid(8, 8, [0, 0, 0]))
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("/v1/depth"));
    assert!(message.contains("500"));
    assert!(message.contains("out of memory"));
    server.join().unwrap();
}
