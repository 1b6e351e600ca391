/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::photos::errors::GPhotosError;
use crate::photos::session::Session;
use futures::lock::{Mutex, MutexGuard};
use log::debug;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::redirect::Policy;
use reqwest::{Body, RequestBuilder};
use std::sync::Arc;
use url::Url;

/// Identifying header sent on every request
pub const DEFAULT_USER_AGENT: &str = concat!("Mozilla/5.0 GPhotos/", env!("CARGO_PKG_VERSION"));

/// Content type the web UI uses for both RPC forms and the upload session request
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

// Production hosts
const ACCOUNTS_ORIGIN: &str = "https://accounts.google.com";
const PHOTOS_ORIGIN: &str = "https://photos.google.com";
const PROFILE_ORIGIN: &str = "https://plus.google.com";

/// Every URL the protocol talks to.
///
/// The defaults point at the production hosts. [`Endpoints::with_origin`] rebases all of them
/// onto a single origin which is mostly useful for pointing the client at a mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub login: String,
    pub profile: String,
    pub home: String,
    pub data: String,
    pub mutate: String,
    pub upload: String,
}

impl Endpoints {
    const LOGIN_PATH: &'static str = "/ServiceLoginAuth?service=lh2";
    const PROFILE_PATH: &'static str = "/u/0/me";
    const HOME_PATH: &'static str = "/";
    const DATA_PATH: &'static str = "/_/PhotosUi/data";
    const MUTATE_PATH: &'static str = "/_/PhotosUi/mutate";
    const UPLOAD_PATH: &'static str = "/_/upload/photos/resumable?authuser=0";

    /// Uses the same origin for every endpoint
    pub fn with_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            login: format!("{origin}{}", Self::LOGIN_PATH),
            profile: format!("{origin}{}", Self::PROFILE_PATH),
            home: format!("{origin}{}", Self::HOME_PATH),
            data: format!("{origin}{}", Self::DATA_PATH),
            mutate: format!("{origin}{}", Self::MUTATE_PATH),
            upload: format!("{origin}{}", Self::UPLOAD_PATH),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: format!("{ACCOUNTS_ORIGIN}{}", Self::LOGIN_PATH),
            profile: format!("{PROFILE_ORIGIN}{}", Self::PROFILE_PATH),
            home: PHOTOS_ORIGIN.to_string(),
            data: format!("{PHOTOS_ORIGIN}{}", Self::DATA_PATH),
            mutate: format!("{PHOTOS_ORIGIN}{}", Self::MUTATE_PATH),
            upload: format!("{PHOTOS_ORIGIN}{}", Self::UPLOAD_PATH),
        }
    }
}

/// Settings used when building the underlying HTTP clients
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoints: Endpoints,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Status, final url and body of a request.
///
/// Non-2xx statuses are returned as-is so the caller can decide whether they are fatal.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub url: Url,
    pub body: String,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Form fields as name/value pairs
pub type FormFields<'a> = [(&'a str, &'a str)];

/// Directly communicates with the web endpoints.
///
/// Both inner clients share one cookie jar. The redirect-less client exists for the login POST,
/// where the redirect status itself is the only success signal.
pub struct ApiClient {
    endpoints: Endpoints,
    cookies: Arc<Jar>,
    https_client: reqwest::Client,
    no_redirect_client: reqwest::Client,
    mutation_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(options: ClientOptions) -> Result<Self, GPhotosError> {
        let cookies = Arc::new(Jar::default());
        let https_client = reqwest::Client::builder()
            .user_agent(options.user_agent.as_str())
            .cookie_provider(cookies.clone())
            .build()?;
        let no_redirect_client = reqwest::Client::builder()
            .user_agent(options.user_agent.as_str())
            .cookie_provider(cookies.clone())
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            endpoints: options.endpoints,
            cookies,
            https_client,
            no_redirect_client,
            mutation_lock: Mutex::new(()),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Looks up a cookie the jar would send to `url`
    pub fn cookie(&self, url: &str, name: &str) -> Result<Option<String>, GPhotosError> {
        let url = Url::parse(url)?;
        Ok(self
            .cookies
            .cookies(&url)
            .and_then(|header| header.to_str().ok().map(str::to_string))
            .and_then(|header| {
                header
                    .split(';')
                    .filter_map(|pair| pair.trim().split_once('='))
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value.to_string())
            }))
    }

    pub async fn get(&self, url: &str) -> Result<ApiResponse, GPhotosError> {
        self.send(self.https_client.get(url)).await
    }

    pub async fn head(&self, url: &str) -> Result<ApiResponse, GPhotosError> {
        self.send(self.https_client.head(url)).await
    }

    /// Posts url-encoded form fields
    pub async fn post_form(
        &self,
        url: &str,
        fields: &FormFields<'_>,
        follow_redirects: bool,
    ) -> Result<ApiResponse, GPhotosError> {
        let client = if follow_redirects {
            &self.https_client
        } else {
            &self.no_redirect_client
        };
        let req = client
            .post(url)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(encode_form(fields));
        self.send(req).await
    }

    /// Posts an arbitrary body with the given extra headers
    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse, GPhotosError> {
        let req = headers
            .iter()
            .fold(self.https_client.post(url), |req, (name, value)| {
                req.header(*name, *value)
            })
            .body(body);
        self.send(req).await
    }

    /// Posts an RPC request (`f.req`) signed with the session's anti-forgery token (`at`)
    pub async fn post_rpc(
        &self,
        session: &Session,
        url: &str,
        request: &serde_json::Value,
    ) -> Result<ApiResponse, GPhotosError> {
        let f_req = request.to_string();
        debug!("rpc {} f.req={}", url, f_req);
        let fields = [("f.req", f_req.as_str()), ("at", session.token())];
        self.post_form(url, &fields, true).await
    }

    /// Held for the duration of any sequence of mutation RPCs
    pub(crate) async fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation_lock.lock().await
    }

    async fn send(&self, req: RequestBuilder) -> Result<ApiResponse, GPhotosError> {
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let url = resp.url().clone();
        let body = resp.text().await?;
        debug!("{} <- {}", status, url);
        Ok(ApiResponse { status, url, body })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

// Url-encodes name/value pairs
fn encode_form(fields: &FormFields<'_>) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
