/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::photos::api::ApiClient;
use crate::photos::errors::GPhotosError;
use crate::photos::parsers::RawRow;
use crate::photos::protocol::{self, RpcKey};
use crate::photos::session::Session;
use async_stream::try_stream;
use futures::Stream;
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

/// Items that can be listed through the `/data` RPC endpoint
pub(crate) trait Listable: Sized {
    /// Key selecting the collection to list
    const LIST_KEY: RpcKey;

    /// Decodes one listing row
    fn from_row(row: RawRow) -> Result<Self, GPhotosError>;
}

/// One page of a listing.
///
/// `next_cursor` is passed back verbatim to get the following page. `None` means the listing is
/// exhausted.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    fn exhausted() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }
}

/// Fetches the page following `cursor`, or the first page when `cursor` is `None`.
///
/// A non-200 response is treated as the end of the listing rather than an error.
pub(crate) async fn fetch_page<T: Listable>(
    api: &ApiClient,
    session: &Session,
    cursor: Option<&str>,
) -> Result<Page<T>, GPhotosError> {
    let request = protocol::list_request(T::LIST_KEY, cursor);
    let resp = api
        .post_rpc(session, &api.endpoints().data, &request)
        .await?;
    if !resp.is_ok() {
        warn!(
            "Listing {} returned status {}, treating as end of list",
            T::LIST_KEY.id(),
            resp.status
        );
        return Ok(Page::exhausted());
    }

    let payload = protocol::decode_data(&resp.body, T::LIST_KEY)?;
    let (rows, next_cursor) = split_listing(payload)?;
    let items = rows
        .into_iter()
        .map(|row| RawRow::from_value(row).and_then(T::from_row))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Listing {} page: {} items, next cursor {:?}",
        T::LIST_KEY.id(),
        items.len(),
        next_cursor
    );
    Ok(Page { items, next_cursor })
}

/// Follows the cursors until the listing is exhausted, keeping server order
pub(crate) async fn fetch_all<T: Listable>(
    api: &ApiClient,
    session: &Session,
) -> Result<Vec<T>, GPhotosError> {
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fetch_page::<T>(api, session, cursor.as_deref()).await?;
        all.extend(page.items);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(all)
}

/// Streams the listing, fetching a page only once the previous one was consumed
pub(crate) fn stream<T: Listable>(
    api: Arc<ApiClient>,
    session: Arc<Session>,
) -> impl Stream<Item = Result<T, GPhotosError>> {
    try_stream! {
        let mut cursor: Option<String> = None;
        loop {
            let page = fetch_page::<T>(&api, &session, cursor.as_deref()).await?;
            for item in page.items {
                yield item;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
    }
}

// A listing payload is [rows, cursor]
fn split_listing(payload: Value) -> Result<(Vec<Value>, Option<String>), GPhotosError> {
    let Value::Array(mut parts) = payload else {
        return Err(GPhotosError::parse("listing payload is not an array"));
    };
    parts.resize(2, Value::Null);
    let next_cursor = parts[1]
        .as_str()
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string);
    let rows = match parts.swap_remove(0) {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        _ => return Err(GPhotosError::parse("listing rows are not an array")),
    };
    Ok((rows, next_cursor))
}
