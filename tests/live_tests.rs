/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
#[cfg(test)]
mod test {
    use dotenvy::dotenv;
    use gphotos::photos::{Album, Client, Creds, Photo};

    // The token has to be read off a browser session since there is no script sandbox here
    fn live_client_inputs() -> anyhow::Result<(Creds, String)> {
        let username = std::env::var("GPHOTOS_USERNAME")?;
        let password = std::env::var("GPHOTOS_PASSWORD")?;
        let token = std::env::var("GPHOTOS_TOKEN")?;
        Ok((Creds::new(&username, &password), token))
    }

    // Disabling for ci/cd builds since it needs a real account
    #[ignore]
    #[tokio::test]
    async fn list_live_library() {
        dotenv().ok();
        let (creds, token) = live_client_inputs().unwrap();
        let evaluator = move |_: &str| Some(token.clone());
        let client = Client::login(&creds, &evaluator).await.unwrap();
        println!("User id: {}", client.user_id());

        let albums = Album::fetch_all(&client).await.unwrap();
        println!("{} albums", albums.len());

        let page = Photo::fetch_page(&client, None).await.unwrap();
        println!("First page: {} items, next: {:?}", page.items.len(), page.next_cursor);
    }
}
