/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! Login and derivation of the per-session anti-forgery token.
//!
//! Logging in walks through four steps, each depending on the previous one:
//!
//! 1. GET the login page so the server sets its `GALX` anti-automation cookie.
//! 2. POST the credentials along with that cookie. Only a `302` means success.
//! 3. HEAD the profile page. The last path segment of the redirected url is the user id.
//! 4. GET the home page and hand it to a [`TokenEvaluator`] which runs the page's scripts and
//!    returns the token.

use crate::photos::api::ApiClient;
use crate::photos::errors::GPhotosError;
use log::{debug, error, info};

/// Page-scoped object exposing the token function once the home page scripts have run
pub const TOKEN_SOURCE_OBJECT: &str = "photos_PhotosUi";

/// Function on [`TOKEN_SOURCE_OBJECT`] returning the token
pub const TOKEN_SOURCE_FUNCTION: &str = "He";

/// Argument passed to [`TOKEN_SOURCE_FUNCTION`]
pub const TOKEN_SOURCE_ARGUMENT: &str = "SNlM0e";

const ANTI_AUTOMATION_COOKIE: &str = "GALX";

// Status the login endpoint answers with when the credentials were accepted
const LOGIN_ACCEPTED: u16 = 302;

/// Computes the anti-forgery token from the service home page.
///
/// The token is produced by client-side code, so an implementation has to execute the page's
/// initialization scripts in a DOM-capable sandbox and then call
/// `TOKEN_SOURCE_OBJECT.TOKEN_SOURCE_FUNCTION(TOKEN_SOURCE_ARGUMENT)`.
/// Returning `None` means the expected object or function was not present.
///
/// Any `Fn(&str) -> Option<String>` is an evaluator.
pub trait TokenEvaluator: Send + Sync {
    fn evaluate(&self, html: &str) -> Option<String>;
}

impl<F> TokenEvaluator for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn evaluate(&self, html: &str) -> Option<String> {
        self(html)
    }
}

/// Account credentials used to log in
#[derive(Clone)]
pub struct Creds {
    username: String,
    password: String,
}

impl Creds {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for Creds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creds")
            .field("username", &self.username)
            .field("password", &"xxx")
            .finish()
    }
}

/// An authenticated session.
///
/// The session cookies live in the [`ApiClient`] jar. The session itself is never refreshed, an
/// expired token only shows up as failing RPCs.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    token: String,
}

impl Session {
    pub(crate) fn new(user_id: &str, token: &str) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Anti-forgery token sent as `at` on every RPC
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"xxx")
            .finish()
    }
}

/// Runs the whole login sequence
pub(crate) async fn login(
    api: &ApiClient,
    creds: &Creds,
    evaluator: &dyn TokenEvaluator,
) -> Result<Session, GPhotosError> {
    submit_credentials(api, creds).await?;
    let user_id = fetch_user_id(api).await?;
    let token = fetch_token(api, evaluator).await?;
    Ok(Session::new(&user_id, &token))
}

async fn submit_credentials(api: &ApiClient, creds: &Creds) -> Result<(), GPhotosError> {
    let login_url = api.endpoints().login.as_str();
    api.get(login_url).await?;

    let galx = api
        .cookie(login_url, ANTI_AUTOMATION_COOKIE)?
        .ok_or_else(|| {
            error!("Login page did not set the {} cookie", ANTI_AUTOMATION_COOKIE);
            GPhotosError::Auth(format!("{ANTI_AUTOMATION_COOKIE} cookie not found"))
        })?;
    debug!("Got {} cookie", ANTI_AUTOMATION_COOKIE);

    let resp = api
        .post_form(login_url, &login_form(creds, &galx), false)
        .await?;
    if resp.status != LOGIN_ACCEPTED {
        error!("Failed to login, status {}", resp.status);
        return Err(GPhotosError::Auth(format!(
            "Failed to login, status {}",
            resp.status
        )));
    }
    info!("Logged in as {}", creds.username);
    Ok(())
}

fn login_form<'a>(creds: &'a Creds, galx: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("Email", creds.username.as_str()),
        ("Passwd", creds.password.as_str()),
        ("pstMsg", "1"),
        (ANTI_AUTOMATION_COOKIE, galx),
        ("_utf8", "\u{9731}"),
        ("bgresponse", "js_disabled"),
        ("checkedDomains", "youtube"),
        ("checkConnection", "youtube:56:1"),
        ("PersistentCookie", "yes"),
    ]
}

async fn fetch_user_id(api: &ApiClient) -> Result<String, GPhotosError> {
    let resp = api.head(&api.endpoints().profile).await?;
    let user_id = resp
        .url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            error!("No user id in {}", resp.url);
            GPhotosError::Auth(format!("Can't find the user id in {}", resp.url))
        })?;
    info!("UserID is {}", user_id);
    Ok(user_id)
}

async fn fetch_token(api: &ApiClient, evaluator: &dyn TokenEvaluator) -> Result<String, GPhotosError> {
    let home_url = api.endpoints().home.as_str();
    let resp = api.get(home_url).await?;
    if !resp.is_ok() {
        error!("Can't access the home page, status {}", resp.status);
        return Err(GPhotosError::Transport(resp.status, home_url.to_string()));
    }

    let token = evaluator
        .evaluate(&resp.body)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            error!("Home page did not expose {}", TOKEN_SOURCE_OBJECT);
            GPhotosError::Auth("Can't generate token".to_string())
        })?;
    debug!("Derived anti-forgery token ({} chars)", token.len());
    Ok(token)
}
