use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use reqwest::Method;
use serde::Deserialize;

use crate::board::{BoardRepository, CardFilter};
use crate::config::Credentials;
use crate::models::{BoardList, Card};

const API_BASE: &str = "https://api.trello.com/1";

/// Thin client over the Trello REST API. Authentication rides along as
/// key/token query parameters on every request.
pub struct TrelloClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl TrelloClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("trello-sync/0.1")
            .build()
            .context("Failed to build the Trello HTTP client")?;
        Ok(Self { http, credentials })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{API_BASE}{path}"))
            .query(&[
                ("key", self.credentials.app_key.as_str()),
                ("token", self.credentials.token.as_str()),
            ])
    }
}

async fn expect_success(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("{action} failed with {status}: {body}")
}

impl BoardRepository for TrelloClient {
    async fn board_id(&self, board: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Board {
            id: String,
        }

        let response = self
            .request(Method::GET, &format!("/boards/{board}"))
            .send()
            .await
            .context("Board lookup request failed")?;
        if !response.status().is_success() {
            bail!("Incorrect board {board:?}: update the board id or shortlink");
        }
        let board: Board = response.json().await.context("Malformed board response")?;
        Ok(board.id)
    }

    async fn lists(&self, board_id: &str) -> Result<Vec<BoardList>> {
        let response = self
            .request(Method::GET, &format!("/boards/{board_id}/lists"))
            .send()
            .await
            .context("List lookup request failed")?;
        let response = expect_success(response, "Fetching board lists").await?;
        response.json().await.context("Malformed lists response")
    }

    async fn create_list(&self, board_id: &str, name: &str) -> Result<BoardList> {
        let response = self
            .request(Method::POST, "/lists")
            .query(&[("name", name), ("idBoard", board_id)])
            .send()
            .await
            .context("List creation request failed")?;
        let response = expect_success(response, "Creating list").await?;
        response.json().await.context("Malformed list response")
    }

    async fn cards(&self, list_id: &str, filter: CardFilter) -> Result<Vec<Card>> {
        let response = self
            .request(
                Method::GET,
                &format!("/lists/{list_id}/cards/{}", filter.as_str()),
            )
            .send()
            .await
            .context("Card lookup request failed")?;
        let response = expect_success(response, "Fetching cards").await?;
        response.json().await.context("Malformed cards response")
    }

    async fn create_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card> {
        let response = self
            .request(Method::POST, "/cards")
            .query(&[("idList", list_id), ("name", name), ("desc", desc)])
            .send()
            .await
            .context("Card creation request failed")?;
        let response = expect_success(response, "Creating card").await?;
        response.json().await.context("Malformed card response")
    }

    async fn set_due(&self, card_id: &str, due: NaiveDateTime) -> Result<()> {
        let value = due.format("%Y-%m-%dT%H:%M:%S").to_string();
        let response = self
            .request(Method::PUT, &format!("/cards/{card_id}/due"))
            .query(&[("value", value.as_str())])
            .send()
            .await
            .context("Due date request failed")?;
        expect_success(response, "Setting card due date").await?;
        Ok(())
    }

    async fn add_label(&self, card_id: &str, color: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &format!("/cards/{card_id}/labels"))
            .query(&[("color", color)])
            .send()
            .await
            .context("Label request failed")?;
        expect_success(response, "Attaching card label").await?;
        Ok(())
    }

    async fn close_card(&self, card_id: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, &format!("/cards/{card_id}/closed"))
            .query(&[("value", "true")])
            .send()
            .await
            .context("Card close request failed")?;
        expect_success(response, "Closing card").await?;
        Ok(())
    }
}
