//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

/// Keywords that define the axes of the mock embedding space.
pub const TOPICS: [&str; 3] = ["rust", "python", "garden"];

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Write a minimal `.docx` whose body has one `<w:p>` per paragraph.
pub fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
        WORDML_NS, body
    );

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Deterministic embedding: one dimension per entry in [`TOPICS`],
/// holding how often that keyword occurs.
pub fn topic_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    TOPICS
        .iter()
        .map(|t| lower.matches(t).count() as f32)
        .collect()
}

/// Start an HTTP server answering Ollama `/api/embed` requests with
/// [`topic_vector`]. Returns its base URL.
///
/// The server runs on its own thread and runtime so that it also serves
/// plain `#[test]` functions driving the CLI binary.
pub fn spawn_mock_ollama() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let app = Router::new().route("/api/embed", post(handle_embed));
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}", addr)
}

async fn handle_embed(
    Json(request): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let input = request["input"].as_str().ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Json(serde_json::json!({
        "model": request["model"],
        "embeddings": [topic_vector(input)],
    })))
}
