/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! Resumable upload handshake.
//!
//! A session is requested first, describing the file and its owner. The server answers with a
//! one-time url the bytes are sent to in a single transfer. The transfer's answer holds the final
//! session state and, once finalized, the metadata of the new item.

use crate::photos::api::{ApiClient, FORM_CONTENT_TYPE};
use crate::photos::errors::GPhotosError;
use crate::photos::parsers::{from_media_kind, from_number_or_string};
use crate::photos::session::Session;
use crate::photos::{MediaType, Photo};
use async_stream::try_stream;
use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use log::{debug, error, info};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;

/// Session state reported once every byte has been received
pub const FINALIZED_STATE: &str = "FINALIZED";

const PROTOCOL_VERSION: &str = "0.8";
const TEXT_CONTENT_TYPE: &str = "text/plain";

// Inlined fields holding the uploading user's id
const USER_FIELDS: [&str; 2] = ["effective_id", "owner_name"];

/// Body of the session creation request
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionRequest {
    protocol_version: &'static str,
    create_session_request: CreateSessionRequest,
}

#[derive(Serialize, Debug)]
struct CreateSessionRequest {
    fields: Vec<SessionField>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "lowercase")]
enum SessionField {
    External(ExternalField),
    Inlined(InlinedField),
}

#[derive(Serialize, Debug)]
struct ExternalField {
    name: &'static str,
    filename: String,
    put: Map<String, Value>,
    size: u64,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlinedField {
    name: &'static str,
    content: String,
    content_type: &'static str,
}

impl InlinedField {
    fn text(name: &'static str, content: &str) -> SessionField {
        SessionField::Inlined(Self {
            name,
            content: content.to_string(),
            content_type: TEXT_CONTENT_TYPE,
        })
    }
}

impl SessionRequest {
    /// The request the web UI sends, with file and owner fields left blank
    fn template() -> Self {
        let now_ms = Utc::now().timestamp_millis().to_string();
        Self {
            protocol_version: PROTOCOL_VERSION,
            create_session_request: CreateSessionRequest {
                fields: vec![
                    SessionField::External(ExternalField {
                        name: "file",
                        filename: String::new(),
                        put: Map::new(),
                        size: 0,
                    }),
                    InlinedField::text("auto_create_album", "camera_sync.active"),
                    InlinedField::text("auto_downsize", "true"),
                    InlinedField::text("storage_policy", "use_manual_setting"),
                    InlinedField::text("disable_asbe_notification", "true"),
                    InlinedField::text("client", "photoweb"),
                    InlinedField::text("effective_id", ""),
                    InlinedField::text("owner_name", ""),
                    InlinedField::text("timestamp_ms", &now_ms),
                ],
            },
        }
    }

    pub(crate) fn new(file_name: &str, size: u64, user_id: &str) -> Self {
        let mut request = Self::template();
        for field in request.create_session_request.fields.iter_mut() {
            match field {
                SessionField::External(external) => {
                    external.filename = file_name.to_string();
                    external.size = size;
                }
                SessionField::Inlined(inlined) if USER_FIELDS.contains(&inlined.name) => {
                    inlined.content = user_id.to_string();
                }
                SessionField::Inlined(_) => (),
            }
        }
        request
    }
}

/// Completion metadata of a finalized upload
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub photo_media_key: String,

    /// Original creation time in seconds
    #[serde(deserialize_with = "from_number_or_string")]
    pub timestamp: i64,

    #[serde(deserialize_with = "from_media_kind")]
    pub kind: MediaType,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    /// Whatever else the server reported
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Expected response to both the session request and the transfer
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ServerStatus {
    session_status: Option<SessionStatus>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SessionStatus {
    // Only meaningful once the bytes were sent
    #[serde(default)]
    state: Option<String>,

    #[serde(default)]
    external_field_transfers: Vec<FieldTransfer>,

    #[serde(default)]
    additional_info: Option<AdditionalInfo>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct FieldTransfer {
    put_info: Option<PutInfo>,
}

#[derive(Deserialize, Debug)]
struct PutInfo {
    url: String,
}

#[derive(Deserialize, Debug)]
struct AdditionalInfo {
    #[serde(rename = "uploader_service.GoogleRupioAdditionalInfo")]
    rupio: Option<RupioInfo>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RupioInfo {
    completion_info: Option<CompletionInfo>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CompletionInfo {
    customer_specific_info: Option<UploadInfo>,
}

impl SessionStatus {
    fn transfer_url(self) -> Option<String> {
        self.external_field_transfers
            .into_iter()
            .find_map(|transfer| transfer.put_info)
            .map(|put| put.url)
    }

    fn upload_info(self) -> Option<UploadInfo> {
        self.additional_info?
            .rupio?
            .completion_info?
            .customer_specific_info
    }
}

fn session_status(body: &str) -> Result<SessionStatus, GPhotosError> {
    serde_json::from_str::<ServerStatus>(body)
        .map_err(|err| GPhotosError::parse(format!("upload response is malformed: {err}")))?
        .session_status
        .ok_or_else(|| {
            error!("Server Error: sessionStatus is not found.");
            GPhotosError::Upload("sessionStatus is not found".to_string())
        })
}

// Any answer to the session request without a session status, JSON or not, fails the upload
fn opened_session(body: &str) -> Result<SessionStatus, GPhotosError> {
    session_status(body).map_err(|err| match err {
        GPhotosError::Parse(msg) => {
            error!("Server Error: {}", msg);
            GPhotosError::Upload(msg)
        }
        other => other,
    })
}

/// Runs the whole handshake and returns the uploaded item
pub(crate) async fn upload<S>(
    api: &ApiClient,
    session: &Session,
    file_name: &str,
    size: u64,
    data: S,
) -> Result<Photo, GPhotosError>
where
    S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
{
    let request = SessionRequest::new(file_name, size, session.user_id());
    let resp = api
        .post(
            &api.endpoints().upload,
            serde_json::to_string(&request)?,
            &[("Content-Type", FORM_CONTENT_TYPE)],
        )
        .await?;
    if !resp.is_ok() {
        error!("Server Error: {}", resp.status);
        return Err(GPhotosError::Upload(format!("Server Error: {}", resp.status)));
    }

    let send_url = opened_session(&resp.body)?
        .transfer_url()
        .ok_or_else(|| GPhotosError::Upload("no transfer url in session status".to_string()))?;
    debug!("Upload session opened for \"{}\" ({} bytes)", file_name, size);

    let content_length = size.to_string();
    let resp = api
        .post(
            &send_url,
            Body::wrap_stream(exact_length(data, size)),
            &[
                ("Content-Type", "application/octet-stream"),
                ("Content-Length", content_length.as_str()),
                ("X-HTTP-Method-Override", "PUT"),
            ],
        )
        .await?;
    if !resp.is_ok() {
        error!("Upload Error: status {}", resp.status);
        return Err(GPhotosError::Upload(format!("Server Error: {}", resp.status)));
    }

    let status = session_status(&resp.body)?;
    if status.state.as_deref() != Some(FINALIZED_STATE) {
        let state = status.state.as_deref().unwrap_or("no state");
        error!("Upload Error: {}", state);
        return Err(GPhotosError::Upload(format!("Upload Error: {state}")));
    }

    let info = status
        .upload_info()
        .ok_or_else(|| GPhotosError::Upload("completion info is missing".to_string()))?;
    info!("Uploaded \"{}\" successfully!", file_name);
    Photo::from_upload(info)
}

// Passes `data` through, failing the transfer when it is not exactly `size` bytes long
fn exact_length<S>(data: S, size: u64) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
{
    try_stream! {
        let mut sent: u64 = 0;
        for await chunk in data {
            let chunk = chunk?;
            sent += chunk.len() as u64;
            if sent > size {
                Err::<(), io::Error>(length_mismatch(size, sent))?;
            }
            yield chunk;
        }
        if sent != size {
            Err::<(), io::Error>(length_mismatch(size, sent))?;
        }
    }
}

fn length_mismatch(expected: u64, sent: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("upload stream length {sent} does not match declared size {expected}"),
    )
}
