/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
#![allow(dead_code)]

use gphotos::photos::{Client, ClientOptions, Creds, Endpoints};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const USER_ID: &str = "116012345678901234567";
pub(crate) const TOKEN: &str = "abc123";
pub(crate) const GALX: &str = "galx-cookie";
pub(crate) const HOME_PAGE: &str =
    "<html><script>window.photos_PhotosUi = {He: function (k) { return {wa: function () {}} }}</script></html>";

pub(crate) fn creds() -> Creds {
    Creds::new("someone@example.com", "hunter2")
}

// Stands in for a script sandbox running the home page
pub(crate) fn evaluate_token(html: &str) -> Option<String> {
    html.contains("photos_PhotosUi").then(|| TOKEN.to_string())
}

pub(crate) fn options(server: &MockServer) -> ClientOptions {
    ClientOptions {
        endpoints: Endpoints::with_origin(&server.uri()),
        ..ClientOptions::default()
    }
}

pub(crate) async fn mount_login_page(server: &MockServer, set_cookie: bool) {
    let mut page = ResponseTemplate::new(200).set_body_string("<html>login</html>");
    if set_cookie {
        page = page.insert_header("Set-Cookie", format!("{GALX_COOKIE}={GALX}; Path=/"));
    }
    Mock::given(method("GET"))
        .and(path("/ServiceLoginAuth"))
        .respond_with(page)
        .mount(server)
        .await;
}

const GALX_COOKIE: &str = "GALX";

pub(crate) async fn mount_credentials(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/ServiceLoginAuth"))
        .and(body_string_contains(format!("GALX={GALX}")))
        .and(body_string_contains("PersistentCookie=yes"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("Location", format!("{}/ManageAccount", server.uri())),
        )
        .mount(server)
        .await;
}

pub(crate) async fn mount_profile(server: &MockServer) {
    Mock::given(method("HEAD"))
        .and(path("/u/0/me"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/u/0/{USER_ID}", server.uri())),
        )
        .mount(server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(format!("/u/0/{USER_ID}")))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

pub(crate) async fn mount_home(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(status).set_body_string(HOME_PAGE))
        .mount(server)
        .await;
}

pub(crate) async fn mount_login(server: &MockServer) {
    mount_login_page(server, true).await;
    mount_credentials(server, 302).await;
    mount_profile(server).await;
    mount_home(server, 200).await;
}

pub(crate) async fn logged_in_client(server: &MockServer) -> Client {
    mount_login(server).await;
    Client::login_with_options(&creds(), &evaluate_token, options(server))
        .await
        .unwrap()
}

/// Body of a `/data` response carrying `payload` under `key`
pub(crate) fn data_body(key: &str, payload: Value) -> String {
    let mut entry = serde_json::Map::new();
    entry.insert(key.to_string(), payload);
    format!(")]}}'\n{}", json!([["wrb.fr", null, entry]]))
}

/// Body of a `/mutate` response carrying `payload` under `key`
pub(crate) fn mutate_body(key: &str, payload: Value) -> String {
    let mut entry = serde_json::Map::new();
    entry.insert(key.to_string(), payload);
    format!(")]}}'\n{}", json!([["af.maf", entry]]))
}

pub(crate) fn album_row(id: &str, title: &str, count: u64) -> Value {
    json!([
        id,
        null,
        {"72930366": [null, title, [1_500_000_000_000i64, 1_500_000_100_000i64], count]}
    ])
}

pub(crate) fn photo_row(id: &str) -> Value {
    json!([
        id,
        [format!("https://lh3.example/{id}"), 640, 480, [1]],
        1_500_000_000_000i64,
        null,
        null,
        1_500_000_500_000i64,
        null,
        null,
        null,
        {}
    ])
}
