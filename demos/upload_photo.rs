/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

extern crate gphotos;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use gphotos::photos::{Album, Client, Creds, Photo};
use std::path::PathBuf;
use tokio_util::io::ReaderStream;

// Logs in and uploads one file, printing the album it would belong to.
//
// GPHOTOS_TOKEN stands in for a script sandbox: copy the `at` value out of a logged in
// browser session.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let username = std::env::var("GPHOTOS_USERNAME")?;
    let password = std::env::var("GPHOTOS_PASSWORD")?;
    let token = std::env::var("GPHOTOS_TOKEN")?;
    let path: PathBuf = std::env::args()
        .nth(1)
        .context("usage: upload_photo <file> [album]")?
        .into();
    let album_name = std::env::args().nth(2);

    let evaluator = move |_: &str| Some(token.clone());
    let client = Client::login(&Creds::new(&username, &password), &evaluator).await?;

    // List what is already there
    for album in Album::fetch_all(&client).await? {
        println!("{album}");
    }

    if let Some(album_name) = album_name {
        match Album::resolve_or_create(&client, &album_name).await? {
            Some(album) => println!("Using album {album}"),
            None => println!("Could not create album {album_name}"),
        }
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("file name is not valid UTF-8")?
        .to_string();
    let file = tokio::fs::File::open(&path).await?;
    let size = file.metadata().await?.len();
    let photo = Photo::upload(&client, &file_name, size, ReaderStream::new(file)).await?;

    println!("Uploaded {photo} created at {}", photo.created_at);
    Ok(())
}
