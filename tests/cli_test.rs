use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_config_set_get() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("userctl").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path")
        .arg(dir.path())
        .arg("config")
        .arg("set")
        .arg("entry_point")
        .arg("http://users.internal:9090/api/users");
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("userctl").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path")
        .arg(dir.path())
        .arg("config")
        .arg("get")
        .arg("entry_point");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("users.internal"));
}

#[test]
fn test_config_rejects_invalid_entry_point() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("userctl").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path")
        .arg(dir.path())
        .arg("config")
        .arg("set")
        .arg("entry_point")
        .arg("not a url");
    cmd.assert().failure();
}

#[test]
fn test_config_shows_defaults() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("userctl").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path").arg(dir.path()).arg("config");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("default_page_size: 10"));
}

#[test]
fn test_add_rejects_invalid_fields_locally() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("userctl").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path")
        .arg(dir.path())
        .arg("add")
        .arg("--first-name")
        .arg("Jane")
        .arg("--last-name")
        .arg("Doe")
        .arg("--address")
        .arg("1 Main St")
        .arg("--city")
        .arg("Springfield")
        .arg("--state")
        .arg("Virginia") // must be a two-letter abbreviation
        .arg("--zip-code")
        .arg("22150")
        .arg("--email")
        .arg("jane@example.com")
        .arg("--dob")
        .arg("01/31/1990")
        .arg("--ssn")
        .arg("123-45-6789");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("state abbreviation"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_renders_page_from_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "users": [{
                "id": 1, "firstName": "Jane", "lastName": "Doe",
                "address": "1 Main St", "city": "Springfield",
                "state": "VA", "zipCode": "22150", "phone": "",
                "email": "jane.doe@example.com", "dob": "01/31/1990",
                "ssn": "123-45-6789", "picture": ""
            }] },
            "page": { "size": 10, "totalElements": 23, "totalPages": 3, "number": 0 }
        })))
        .mount(&server)
        .await;

    let endpoint = format!("{}/api/users", server.uri());
    let dir = tempdir().unwrap();
    let assert = tokio::task::spawn_blocking(move || {
        let mut cmd = Command::cargo_bin("userctl").unwrap();
        cmd.timeout(Duration::from_secs(10));
        cmd.arg("--data-path")
            .arg(dir.path())
            .arg("--endpoint")
            .arg(endpoint)
            .arg("list");
        cmd.assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("Jane Doe"))
        .stdout(predicate::str::contains("Page 1 of 3 (23 users total, 10 per page)"));
}
