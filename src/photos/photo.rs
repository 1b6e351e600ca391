/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::photos::errors::GPhotosError;
use crate::photos::pagination::{self, Listable, Page};
use crate::photos::parsers::{as_u64, RawRow};
use crate::photos::protocol::RpcKey;
use crate::photos::upload::UploadInfo;
use crate::photos::{Client, MediaType};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::hash::{Hash, Hasher};
use std::io;

/// A photo or video in the library.
///
/// Listing rows carry dimensions (and the duration for videos). Items coming back from an upload
/// carry a title and the raw [`UploadInfo`] instead.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Photo {
    pub id: String,

    pub media_type: MediaType,

    pub created_at: DateTime<Utc>,

    pub uploaded_at: DateTime<Utc>,

    #[serde(default)]
    pub width: Option<u64>,

    #[serde(default)]
    pub height: Option<u64>,

    /// Video length, `None` for photos
    #[serde(default)]
    pub duration: Option<u64>,

    pub raw_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_info: Option<UploadInfo>,
}

impl Photo {
    /// Retrieves one page of the photo listing
    pub async fn fetch_page(
        client: &Client,
        cursor: Option<&str>,
    ) -> Result<Page<Photo>, GPhotosError> {
        pagination::fetch_page(client.api(), client.session(), cursor).await
    }

    /// Retrieves every item in the library, in the order the server lists them
    pub async fn fetch_all(client: &Client) -> Result<Vec<Photo>, GPhotosError> {
        pagination::fetch_all(client.api(), client.session()).await
    }

    /// Streams the photo listing one page at a time
    pub fn stream(client: &Client) -> impl Stream<Item = Result<Photo, GPhotosError>> {
        client.photos()
    }

    /// The most recently listed item
    pub async fn latest(client: &Client) -> Result<Option<Photo>, GPhotosError> {
        Ok(Self::fetch_page(client, None).await?.items.into_iter().next())
    }

    /// Uploads `size` bytes from `data` as `file_name`.
    ///
    /// The stream must yield exactly `size` bytes, otherwise the transfer fails.
    pub async fn upload<S>(
        client: &Client,
        file_name: &str,
        size: u64,
        data: S,
    ) -> Result<Photo, GPhotosError>
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        client.upload(file_name, size, data).await
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    // Builds the item described by a finalized upload
    pub(crate) fn from_upload(info: UploadInfo) -> Result<Self, GPhotosError> {
        let created_at = info
            .timestamp
            .checked_mul(1000)
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| {
                GPhotosError::Upload(format!("invalid upload timestamp {}", info.timestamp))
            })?;
        Ok(Photo {
            id: info.photo_media_key.clone(),
            media_type: info.kind,
            created_at,
            uploaded_at: Utc::now(),
            width: None,
            height: None,
            duration: None,
            raw_url: info.url.clone().unwrap_or_default(),
            title: info.title.clone(),
            upload_info: Some(info),
        })
    }
}

impl Listable for Photo {
    const LIST_KEY: RpcKey = RpcKey::PhotoList;

    // Row: [id, [url, width, height, ..., [marker, ...]], created, _, _, uploaded, ..., {video info}]
    fn from_row(row: RawRow) -> Result<Self, GPhotosError> {
        let id = row.str_field(0, "photo id")?;
        let media = row
            .field(1)
            .and_then(Value::as_array)
            .ok_or_else(|| GPhotosError::parse(format!("photo {id} has no media entry")))?;

        let marker = media
            .last()
            .and_then(|entry| entry.get(0))
            .and_then(as_u64)
            .and_then(|marker| RpcKey::try_from(marker).ok());
        let media_type = if marker == Some(RpcKey::VideoMarker) {
            MediaType::Video
        } else {
            MediaType::Photo
        };

        let (width, height, duration) = match media_type {
            MediaType::Video => {
                let video_key = RpcKey::VideoInfo.key();
                let info = row
                    .metadata(RpcKey::VideoInfo)
                    .or_else(|| row.field(9).and_then(|f| f.get(video_key.as_str())))
                    .and_then(Value::as_array);
                let at = |idx: usize| info.and_then(|info| info.get(idx)).and_then(as_u64);
                (at(2), at(3), at(0))
            }
            _ => (
                media.get(1).and_then(as_u64),
                media.get(2).and_then(as_u64),
                None,
            ),
        };

        Ok(Photo {
            raw_url: media
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| GPhotosError::parse(format!("photo {id} has no url")))?
                .to_string(),
            media_type,
            created_at: row.time_field(2, "creation time")?,
            uploaded_at: row.time_field(5, "upload time")?,
            width,
            height,
            duration,
            title: None,
            upload_info: None,
            id,
        })
    }
}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Photo {}

impl Hash for Photo {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.media_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn photo_row() -> Value {
        json!([
            "photo-1",
            ["https://lh3.example/photo-1", 4032, 3024, [1]],
            1_500_000_000_000i64,
            null,
            null,
            1_500_000_500_000i64,
            null,
            null,
            null,
            {"1": []}
        ])
    }

    #[test]
    fn photo_row_decodes() {
        let photo = Photo::from_row(RawRow::from_value(photo_row()).unwrap()).unwrap();
        assert_eq!(photo.id, "photo-1");
        assert_eq!(photo.media_type, MediaType::Photo);
        assert_eq!(photo.raw_url, "https://lh3.example/photo-1");
        assert_eq!((photo.width, photo.height), (Some(4032), Some(3024)));
        assert_eq!(photo.duration, None);
        assert_eq!(photo.created_at.timestamp_millis(), 1_500_000_000_000);
        assert_eq!(photo.uploaded_at.timestamp_millis(), 1_500_000_500_000);
    }

    #[test]
    fn video_row_uses_video_info() {
        let row = json!([
            "video-1",
            ["https://lh3.example/video-1", 320, 180, [15658734]],
            1_500_000_000_000i64,
            null,
            null,
            1_500_000_500_000i64,
            null,
            null,
            null,
            {"76647426": [42000, null, 1920, 1080]}
        ]);
        let photo = Photo::from_row(RawRow::from_value(row).unwrap()).unwrap();
        assert!(photo.is_video());
        assert_eq!(photo.duration, Some(42000));
        assert_eq!((photo.width, photo.height), (Some(1920), Some(1080)));
        assert_eq!(photo.to_string(), "VIDEO: video-1");
    }

    #[test]
    fn row_without_timestamps_is_rejected() {
        let row = json!(["photo-1", ["https://lh3.example/photo-1", 1, 1, [1]]]);
        let result = Photo::from_row(RawRow::from_value(row).unwrap());
        assert!(matches!(result, Err(GPhotosError::Parse(_))));
    }
}
