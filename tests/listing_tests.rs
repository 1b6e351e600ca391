/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
mod helpers;

#[cfg(test)]
mod test {
    use crate::helpers;
    use futures::{StreamExt, pin_mut};
    use gphotos::photos::{Album, GPhotosError, Photo};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALBUM_KEY: &str = "72930366";
    const PHOTO_KEY: &str = "74806772";

    #[tokio::test]
    async fn fetch_all_albums_from_single_page() {
        let server = MockServer::start().await;
        let client = helpers::logged_in_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/_/PhotosUi/data"))
            .and(body_string_contains(ALBUM_KEY))
            .and(body_string_contains(format!("at={}", helpers::TOKEN)))
            .respond_with(ResponseTemplate::new(200).set_body_string(helpers::data_body(
                ALBUM_KEY,
                json!([
                    [
                        helpers::album_row("album-1", "Holidays", 3),
                        helpers::album_row("album-2", "Pets", 7)
                    ],
                    null
                ]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let albums = Album::fetch_all(&client).await.unwrap();
        assert_eq!(client.session().token(), "abc123");
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].id, "album-1");
        assert_eq!(albums[0].title, "Holidays");
        assert_eq!(albums[0].item_count, Some(3));
        assert_eq!(albums[1].id, "album-2");
        assert_eq!(albums[1].title, "Pets");
    }

    #[tokio::test]
    async fn fetch_all_follows_cursors_in_order() {
        let server = MockServer::start().await;
        let client = helpers::logged_in_client(&server).await;

        let pages = [
            (None, json!([[helpers::photo_row("p1"), helpers::photo_row("p2")], "cursor-b"])),
            (Some("cursor-b"), json!([[helpers::photo_row("p3")], "cursor-c"])),
            (Some("cursor-c"), json!([[helpers::photo_row("p4")], null])),
        ];
        for (cursor, payload) in pages {
            let mock = Mock::given(method("POST"))
                .and(path("/_/PhotosUi/data"))
                .and(body_string_contains(PHOTO_KEY));
            let (mock, priority) = match cursor {
                Some(cursor) => (mock.and(body_string_contains(cursor)), 1),
                None => (mock, 10),
            };
            mock.respond_with(
                ResponseTemplate::new(200).set_body_string(helpers::data_body(PHOTO_KEY, payload)),
            )
            .with_priority(priority)
            .expect(1)
            .mount(&server)
            .await;
        }

        let photos = Photo::fetch_all(&client).await.unwrap();
        let ids: Vec<_> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2", "p3", "p4"]);
    }

    #[tokio::test]
    async fn fetch_page_returns_cursor() {
        let server = MockServer::start().await;
        let client = helpers::logged_in_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/_/PhotosUi/data"))
            .and(body_string_contains(PHOTO_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_string(helpers::data_body(
                PHOTO_KEY,
                json!([[helpers::photo_row("p1")], "next-one"]),
            )))
            .mount(&server)
            .await;

        let page = Photo::fetch_page(&client, None).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].width, Some(640));
        assert_eq!(page.next_cursor.as_deref(), Some("next-one"));
    }

    #[tokio::test]
    async fn failed_page_ends_listing() {
        let server = MockServer::start().await;
        let client = helpers::logged_in_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/_/PhotosUi/data"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let page = Album::fetch_page(&client, Some("anything")).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
        assert!(Album::fetch_all(&client).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn response_without_prefix_is_a_parse_error() {
        let server = MockServer::start().await;
        let client = helpers::logged_in_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/_/PhotosUi/data"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"[["wrb.fr",null,{"72930366":[[],null]}]]"#),
            )
            .mount(&server)
            .await;

        let result = Album::fetch_all(&client).await;
        assert!(matches!(result, Err(GPhotosError::Parse(_))));
    }

    #[tokio::test]
    async fn stream_yields_every_album() {
        let server = MockServer::start().await;
        let client = helpers::logged_in_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/_/PhotosUi/data"))
            .and(body_string_contains(ALBUM_KEY))
            .and(body_string_contains("second"))
            .respond_with(ResponseTemplate::new(200).set_body_string(helpers::data_body(
                ALBUM_KEY,
                json!([[helpers::album_row("b", "B", 1)]]),
            )))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/_/PhotosUi/data"))
            .and(body_string_contains(ALBUM_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_string(helpers::data_body(
                ALBUM_KEY,
                json!([[helpers::album_row("a", "A", 1)], "second"]),
            )))
            .with_priority(10)
            .mount(&server)
            .await;

        let albums = Album::stream(&client);
        pin_mut!(albums);
        let mut ids = Vec::new();
        while let Some(album) = albums.next().await {
            ids.push(album.unwrap().id);
        }
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn client_streams_photos() {
        let server = MockServer::start().await;
        let client = helpers::logged_in_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/_/PhotosUi/data"))
            .and(body_string_contains(PHOTO_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_string(helpers::data_body(
                PHOTO_KEY,
                json!([[helpers::photo_row("p1"), helpers::photo_row("p2")]]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let photos = client.photos();
        pin_mut!(photos);
        let mut ids = Vec::new();
        while let Some(photo) = photos.next().await {
            ids.push(photo.unwrap().id);
        }
        assert_eq!(ids, ["p1", "p2"]);
    }
}
