#![allow(missing_docs, clippy::expect_used, clippy::indexing_slicing)]

use exemplar_core::capture::{self, ContextStore};
use exemplar_core::client::{Call, Engine};
use rstest::rstest;
use serde_json::json;

mod common;
pub use self::common::*;

fn upload<E: Engine>(call: Call<E>, avatar: &std::path::Path) -> Call<E> {
    call.field("name", "Ada")
        .field("age", 36)
        .attach("avatar", avatar, None)
        .attach("notes", b"first line".to_vec(), Some("notes.txt"))
}

#[rstest]
#[case::in_process("in-process")]
#[case::http("http")]
#[case::fetch("fetch")]
#[tokio::test]
async fn should_capture_multipart_upload(
    #[future] app: TestApp,
    #[case] adapter: &str,
) -> anyhow::Result<()> {
    let app = app.await;
    let dir = std::env::temp_dir().join(format!("exemplar-upload-{adapter}"));
    tokio::fs::create_dir_all(&dir).await?;
    let avatar = dir.join("avatar.png");
    tokio::fs::write(&avatar, b"\x89PNG fake image").await?;

    let (response, store): (_, ContextStore) = capture::record("upload", None, || async {
        match adapter {
            "in-process" => upload(app.in_process().post("/upload"), &avatar).await,
            "http" => upload(app.http().post("/upload"), &avatar).await,
            _ => upload(app.fetch().post("/upload"), &avatar).await,
        }
    })
    .await;

    let response = response?;
    assert_eq!(response.body["fields"], json!({"name": "Ada", "age": "36"}));
    assert_eq!(
        response.body["files"],
        json!([
            {"field": "avatar", "filename": "avatar.png", "contentType": "image/png", "size": 15},
            {"field": "notes", "filename": "notes.txt", "contentType": "text/plain", "size": 10}
        ])
    );

    let request = &store.captured_requests[0];
    assert!(request.body.is_none());
    assert!(
        request.headers["content-type"].starts_with("multipart/form-data; boundary="),
        "multipart content type captured"
    );
    insta::allow_duplicates! {
        insta::assert_json_snapshot!(request.form_data, @r#"
        {
          "fields": {
            "name": "Ada",
            "age": 36
          },
          "files": [
            {
              "field": "avatar",
              "filename": "avatar.png",
              "mimetype": "image/png"
            },
            {
              "field": "notes",
              "filename": "notes.txt",
              "mimetype": "text/plain"
            }
          ]
        }
        "#);
    }

    tokio::fs::remove_dir_all(&dir).await?;
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_report_missing_file_after_capture(#[future] app: TestApp) -> anyhow::Result<()> {
    let app = app.await;

    let (result, store) = capture::record("missing file", None, || async {
        app.in_process()
            .post("/upload")
            .attach("avatar", "does/not/exist.png", None)
            .await
    })
    .await;

    assert!(matches!(result, Err(exemplar_core::ClientError::Io(_))));
    let request = &store.captured_requests[0];
    assert_eq!(
        request.form_data.as_ref().map(|form| form.files[0].filename.as_str()),
        Some("exist.png")
    );
    assert!(request.response.is_none());
    Ok(())
}
