/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::photos::errors::GPhotosError;
use crate::photos::pagination::{self, Listable, Page};
use crate::photos::parsers::{as_datetime, as_u64, RawRow};
use crate::photos::protocol::{self, RpcKey};
use crate::photos::{Client, Photo};
use chrono::{DateTime, Utc};
use futures::{pin_mut, Stream, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::hash::{Hash, Hasher};

/// An album as returned by the album listing or by album creation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Album {
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<AlbumPeriod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,
}

/// Time span covered by the items of an album
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AlbumPeriod {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Album {
    /// Retrieves one page of the album listing
    pub async fn fetch_page(
        client: &Client,
        cursor: Option<&str>,
    ) -> Result<Page<Album>, GPhotosError> {
        pagination::fetch_page(client.api(), client.session(), cursor).await
    }

    /// Retrieves every album, in the order the server lists them
    pub async fn fetch_all(client: &Client) -> Result<Vec<Album>, GPhotosError> {
        pagination::fetch_all(client.api(), client.session()).await
    }

    /// Streams the album listing one page at a time
    pub fn stream(client: &Client) -> impl Stream<Item = Result<Album, GPhotosError>> {
        client.albums()
    }

    /// True when `name` is this album's id or title
    pub fn matches(&self, name: &str) -> bool {
        self.id == name || self.title == name
    }

    /// Looks for an album whose id or title is `name`.
    ///
    /// Pages are only fetched until a match is found. `None` when no album matches.
    pub async fn search(
        client: &Client,
        name: impl ToString,
    ) -> Result<Option<Album>, GPhotosError> {
        let name = name.to_string();
        let albums = Self::stream(client);
        pin_mut!(albums);
        while let Some(album) = albums.next().await {
            let album = album?;
            if album.matches(&name) {
                debug!("Found album {}", album);
                return Ok(Some(album));
            }
        }
        warn!("Album \"{}\" is not found.", name);
        Ok(None)
    }

    /// Creates an empty album titled `title`.
    ///
    /// The server only creates albums seeded with at least one item, so the most recent photo is
    /// used as the seed and removed again once the album exists. `None` when the server refuses
    /// to create the album.
    pub async fn create(client: &Client, title: &str) -> Result<Option<Album>, GPhotosError> {
        let seed = Photo::latest(client)
            .await?
            .ok_or(GPhotosError::NoSeedPhoto())?;

        let _mutating = client.api().lock_mutations().await;
        let request = protocol::mutation_request(
            RpcKey::AlbumCreate,
            json!([[seed.id], null, title]),
        );
        let resp = client
            .api()
            .post_rpc(client.session(), &client.api().endpoints().mutate, &request)
            .await?;
        if !resp.is_ok() {
            error!("Failed to create album \"{}\", status {}", title, resp.status);
            return Ok(None);
        }

        let payload = protocol::decode_mutation(&resp.body, RpcKey::AlbumCreate)?;
        let id = payload
            .get(0)
            .and_then(Value::as_str)
            .ok_or_else(|| GPhotosError::parse("album creation response has no album id"))?
            .to_string();
        let seeded: Vec<String> = payload
            .get(1)
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let album = Album {
            id,
            title: title.to_string(),
            period: None,
            item_count: Some(0),
        };
        send_removal(client, &album.id, &seeded).await?;

        info!("AlbumID is {}.", album.id);
        Ok(Some(album))
    }

    /// Returns the album matching `name`, creating it when no album matches
    pub async fn resolve_or_create(
        client: &Client,
        name: impl ToString,
    ) -> Result<Option<Album>, GPhotosError> {
        let name = name.to_string();
        match Self::search(client, &name).await? {
            Some(album) => Ok(Some(album)),
            None => Self::create(client, &name).await,
        }
    }

    /// Removes the given items from this album. Items not in the album are ignored by the server.
    pub async fn remove_items(
        &self,
        client: &Client,
        item_ids: &[String],
    ) -> Result<(), GPhotosError> {
        client.remove_items_from_album(&self.id, item_ids).await
    }
}

// Callers must hold the mutation lock
pub(crate) async fn send_removal(
    client: &Client,
    album_id: &str,
    item_ids: &[String],
) -> Result<(), GPhotosError> {
    if item_ids.is_empty() {
        return Ok(());
    }
    let request = protocol::mutation_request(RpcKey::AlbumRemoveItems, json!([item_ids, []]));
    let mutate_url = client.api().endpoints().mutate.as_str();
    let resp = client
        .api()
        .post_rpc(client.session(), mutate_url, &request)
        .await?;
    if !resp.is_ok() {
        error!(
            "Failed to remove {} items from album {}, status {}",
            item_ids.len(),
            album_id,
            resp.status
        );
        return Err(GPhotosError::Transport(resp.status, mutate_url.to_string()));
    }
    debug!("Removed {} items from album {}", item_ids.len(), album_id);
    Ok(())
}

impl Listable for Album {
    const LIST_KEY: RpcKey = RpcKey::AlbumList;

    // Row: [id, ..., {"72930366": [_, title, [from, to], count, ...]}]
    fn from_row(row: RawRow) -> Result<Self, GPhotosError> {
        let id = row.str_field(0, "album id")?;
        let info = row
            .metadata(Self::LIST_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| GPhotosError::parse(format!("album {id} has no info entry")))?;

        let period = info.get(2).and_then(Value::as_array).and_then(|span| {
            Some(AlbumPeriod {
                from: as_datetime(span.first()?)?,
                to: as_datetime(span.get(1)?)?,
            })
        });

        Ok(Album {
            title: info
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            period,
            item_count: info.get(3).and_then(as_u64),
            id,
        })
    }
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Album {}

impl Hash for Album {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Album {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "title: {}, id: {}", self.title, self.id)
    }
}
