mod support;

#[tokio::test]
async fn when_health_is_requested_then_environment_name_is_returned() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body = res.text().await.expect("text body");
    let expected = std::env::var("APP_ENV")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "development".to_string());
    assert_eq!(body, expected);
}
