#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use bytes::{BufMut, Bytes, BytesMut};
use http_body_util::BodyExt;
use image_logger::config::UploadConfig;
use image_logger::services::storage::LocalStorageService;
use image_logger::{AppState, create_app};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

pub struct TestApp {
    pub app: Router,
    pub dest: PathBuf,
    _root: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// `configure` receives a config rooted in a fresh temp dir whose
    /// `detections` subdirectory already exists.
    pub fn with_config(configure: impl FnOnce(UploadConfig) -> UploadConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("detections");
        let staging = root.path().join("staging");
        std::fs::create_dir(&dest).unwrap();
        std::fs::create_dir(&staging).unwrap();

        let config = configure(UploadConfig::with_dirs(&dest, &staging));
        let storage = Arc::new(LocalStorageService::new(
            &config.destination_dir,
            &config.staging_dir,
        ));
        let app = create_app(AppState::new(config, storage));

        Self {
            app,
            dest,
            _root: root,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn upload(&self, parts: &[Part<'_>]) -> (StatusCode, String) {
        let response = self.send(upload_request("/", parts)).await;
        let status = response.status();
        (status, body_text(response).await)
    }

    pub fn stored(&self, name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.dest.join(name)).ok()
    }

    pub fn stored_count(&self) -> usize {
        std::fs::read_dir(&self.dest).unwrap().count()
    }
}

/// One multipart section; `file_name: None` makes it a plain form value.
pub struct Part<'a> {
    pub field: &'a str,
    pub file_name: Option<&'a str>,
    pub data: &'a [u8],
}

pub fn image<'a>(file_name: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        field: "captured_image",
        file_name: Some(file_name),
        data,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Bytes {
    let mut body = BytesMut::new();
    for part in parts {
        body.put_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => body.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.field, file_name
                )
                .as_bytes(),
            ),
            None => body.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.field
                )
                .as_bytes(),
            ),
        }
        body.put_slice(part.data);
        body.put_slice(b"\r\n");
    }
    body.put_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body.freeze()
}

pub fn upload_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}
