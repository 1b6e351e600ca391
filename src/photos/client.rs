/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::photos::api::{ApiClient, ClientOptions};
use crate::photos::errors::GPhotosError;
use crate::photos::session::{self, Creds, Session, TokenEvaluator};
use crate::photos::{album, pagination, upload, Album, Photo};
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::sync::Arc;

/// An authenticated client.
///
/// The only way to get one is by logging in, so every RPC issued through it carries the session
/// cookies and the anti-forgery token. Cloning is cheap and clones share the same session.
///
/// ```rust,no_run
/// use gphotos::photos::{Album, Client, Creds};
///
/// async fn list(evaluate: impl Fn(&str) -> Option<String> + Send + Sync) -> anyhow::Result<()> {
///     let client = Client::login(&Creds::new("someone@gmail.com", "password"), &evaluate).await?;
///     for album in Album::fetch_all(&client).await? {
///         println!("{album}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    api_client: Arc<ApiClient>,
    session: Arc<Session>,
}

impl Client {
    /// Logs in against the production endpoints
    pub async fn login(
        creds: &Creds,
        evaluator: &dyn TokenEvaluator,
    ) -> Result<Self, GPhotosError> {
        Self::login_with_options(creds, evaluator, ClientOptions::default()).await
    }

    /// Logs in with custom endpoints or user agent
    pub async fn login_with_options(
        creds: &Creds,
        evaluator: &dyn TokenEvaluator,
        options: ClientOptions,
    ) -> Result<Self, GPhotosError> {
        let api_client = ApiClient::new(options)?;
        let session = session::login(&api_client, creds, evaluator).await?;
        Ok(Self {
            api_client: Arc::new(api_client),
            session: Arc::new(session),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user_id(&self) -> &str {
        self.session.user_id()
    }

    /// Lower level access for issuing requests directly
    pub fn api(&self) -> &ApiClient {
        &self.api_client
    }

    /// Streams every album, fetching the next page only once the previous one was consumed
    pub fn albums(&self) -> impl Stream<Item = Result<Album, GPhotosError>> {
        pagination::stream::<Album>(self.api_client.clone(), self.session.clone())
    }

    /// Streams every photo and video, fetching the next page only once the previous one was
    /// consumed
    pub fn photos(&self) -> impl Stream<Item = Result<Photo, GPhotosError>> {
        pagination::stream::<Photo>(self.api_client.clone(), self.session.clone())
    }

    /// Removes items from the album `album_id`.
    ///
    /// Waits for any other mutation issued through this client, or its clones, to finish first.
    pub async fn remove_items_from_album(
        &self,
        album_id: &str,
        item_ids: &[String],
    ) -> Result<(), GPhotosError> {
        let _mutating = self.api_client.lock_mutations().await;
        album::send_removal(self, album_id, item_ids).await
    }

    /// Uploads `size` bytes from `data` as `file_name`.
    ///
    /// The stream must yield exactly `size` bytes, otherwise the transfer fails.
    pub async fn upload<S>(
        &self,
        file_name: &str,
        size: u64,
        data: S,
    ) -> Result<Photo, GPhotosError>
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        upload::upload(&self.api_client, &self.session, file_name, size, data).await
    }
}
