/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # GPhotos
//!
//! Client for the undocumented RPC interface the Google Photos web UI talks to.
//!
//! ## Features
//!
//! - Login with account credentials
//! - Album information
//!     - List albums a page at a time or all at once
//!     - Search an album by id or title
//!     - Create an (empty) album
//! - Photo information
//!     - List photos and videos a page at a time or all at once
//!     - Upload a file through the resumable upload protocol
//! - Lower level interface for handling the raw communication
//!
//! *The anti-forgery token every RPC needs is computed by scripts on the home page. Running those
//! scripts is left up to the consumer of this library through [`photos::TokenEvaluator`].*
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gphotos::photos::{Album, Client, ClientOptions, Creds, GPhotosError, Photo};
//! use futures::stream;
//!
//! async fn upload_into_album(
//!     username: &str,
//!     password: &str,
//!     evaluate_token: impl Fn(&str) -> Option<String> + Send + Sync,
//!     file_name: &str,
//!     data: Vec<u8>,
//! ) -> Result<(), GPhotosError> {
//!     let client = Client::login_with_options(
//!         &Creds::new(username, password),
//!         &evaluate_token,
//!         ClientOptions::default(),
//!     )
//!     .await?;
//!
//!     // Find the album or create an empty one
//!     let album = Album::resolve_or_create(&client, "Uploads").await?;
//!     println!("Album: {:?}", album);
//!
//!     let size = data.len() as u64;
//!     let photo = Photo::upload(
//!         &client,
//!         file_name,
//!         size,
//!         stream::once(async move { Ok(data.into()) }),
//!     )
//!     .await?;
//!     println!("Uploaded {photo}");
//!     Ok(())
//! }
//! ```
//!
pub mod photos;
