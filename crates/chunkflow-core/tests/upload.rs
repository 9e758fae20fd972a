//! Uploads against a local endpoint that records what it receives.

mod common;

use chunkflow_core::config::ChunkflowConfig;
use chunkflow_core::listener::Notification;
use chunkflow_core::orchestrator::{TransferMode, UploadRequest};
use chunkflow_core::TransferError;
use common::range_server::{self, RangeServerOptions};

fn request(url: String, data: &[u8], chunk_count: usize) -> UploadRequest {
    UploadRequest {
        data: data.to_vec(),
        file_name: "notes.txt".into(),
        mime_type: Some("text/plain".into()),
        upload_url: url,
        chunk_count,
    }
}

#[tokio::test]
async fn ranged_endpoint_receives_content_range_chunks() {
    let server = range_server::start(Vec::new());
    let h = common::local_harness(ChunkflowConfig::default()).await;
    let data = b"0123456789";

    let report = h
        .orchestrator
        .upload(request(server.url("upload"), data, 4))
        .await
        .unwrap();
    assert_eq!(report.outcome.mode(), TransferMode::Chunked);

    let mut posts = server.posts();
    posts.sort_by_key(|p| p.body.first().copied());
    let ranges: Vec<_> = posts
        .iter()
        .map(|p| p.content_range.clone().unwrap())
        .collect();
    assert_eq!(
        ranges,
        ["bytes 0-2/10", "bytes 3-5/10", "bytes 6-8/10", "bytes 9-9/10"]
    );
    let joined: Vec<u8> = posts.iter().flat_map(|p| p.body.clone()).collect();
    assert_eq!(joined, data);
    assert!(posts
        .iter()
        .all(|p| p.content_type.as_deref() == Some("application/octet-stream")));
}

#[tokio::test]
async fn plain_endpoint_receives_one_multipart_post() {
    let server = range_server::start_with_options(
        Vec::new(),
        RangeServerOptions {
            support_ranges: false,
            ..Default::default()
        },
    );
    let h = common::local_harness(ChunkflowConfig::default()).await;

    let report = h
        .orchestrator
        .upload(request(server.url("upload"), b"hello upload", 4))
        .await
        .unwrap();
    assert_eq!(report.outcome.mode(), TransferMode::Normal);

    let posts = server.posts();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert!(post.content_range.is_none());
    assert!(post
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&post.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"notes.txt\""));
    assert!(body.contains("hello upload"));
}

#[tokio::test]
async fn unreachable_endpoint_fails_and_notifies() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut h = common::local_harness(ChunkflowConfig::default()).await;

    let err = h
        .orchestrator
        .upload(request(format!("http://127.0.0.1:{port}/up"), b"x", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::UploadFailed(_)));
    let notes = common::drain(&mut h.notes);
    assert!(matches!(
        notes.as_slice(),
        [Notification::Error { message }] if message.starts_with("Upload failed:")
    ));
}
