mod common;

use anyhow::Result;
use reqwest::multipart;
use reqwest::StatusCode;

// Upload validation runs after the database pool is acquired, mirroring the
// rest of the report pipeline, so these tests tolerate a missing Postgres
// (503) but pin the exact message whenever validation is reached.

async fn send_form(
    server: &common::TestServer,
    form: multipart::Form,
) -> Result<(StatusCode, serde_json::Value)> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/reports/upload", server.base_url))
        .bearer_auth(common::auth_token())
        .multipart(form)
        .send()
        .await?;
    let status = res.status();
    let body = res.json::<serde_json::Value>().await?;
    Ok((status, body))
}

fn expect_validation(
    status: StatusCode,
    body: &serde_json::Value,
    message: &str,
) {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return;
    }
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["message"], message, "{}", body);
}

#[tokio::test]
async fn upload_requires_the_gate() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/reports/upload", server.base_url))
        .multipart(multipart::Form::new().text("testDate", "2024-03-01"))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn upload_without_a_file_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let form = multipart::Form::new().text("testDate", "2024-03-01");
    let (status, body) = send_form(server, form).await?;
    expect_validation(status, &body, "Please upload a file");

    Ok(())
}

#[tokio::test]
async fn upload_without_a_test_date_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let file = multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF])
        .file_name("scan.jpg")
        .mime_str("image/jpeg")?;
    let form = multipart::Form::new().part("file", file);

    let (status, body) = send_form(server, form).await?;
    expect_validation(status, &body, "Please provide test date");

    Ok(())
}

#[tokio::test]
async fn upload_rejects_unknown_mime_types() -> Result<()> {
    let server = common::ensure_server().await?;

    let file = multipart::Part::bytes(b"MZ".to_vec())
        .file_name("report.exe")
        .mime_str("application/octet-stream")?;
    let form = multipart::Form::new()
        .part("file", file)
        .text("testDate", "2024-03-01");

    let (status, body) = send_form(server, form).await?;
    expect_validation(
        status,
        &body,
        "File type not allowed. Please upload JPEG, PNG, WebP, or PDF",
    );

    Ok(())
}

#[tokio::test]
async fn upload_rejects_malformed_member_ids() -> Result<()> {
    let server = common::ensure_server().await?;

    let file = multipart::Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("report.pdf")
        .mime_str("application/pdf")?;
    let form = multipart::Form::new()
        .part("file", file)
        .text("testDate", "2024-03-01")
        .text("familyMemberId", "not-a-uuid");

    let (status, body) = send_form(server, form).await?;
    expect_validation(status, &body, "Invalid familyMemberId: not-a-uuid");

    Ok(())
}
