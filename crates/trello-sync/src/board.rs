use anyhow::Result;
use chrono::NaiveDateTime;

use crate::models::{BoardList, Card};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFilter {
    All,
    Open,
}

impl CardFilter {
    pub fn as_str(&self) -> &str {
        match self {
            CardFilter::All => "all",
            CardFilter::Open => "open",
        }
    }
}

/// The board operations the sync needs, and nothing else. The live
/// implementation talks to the Trello REST API; tests run against an
/// in-memory board.
pub trait BoardRepository {
    /// Resolve a board id or shortlink to the canonical board id.
    async fn board_id(&self, board: &str) -> Result<String>;

    async fn lists(&self, board_id: &str) -> Result<Vec<BoardList>>;

    async fn create_list(&self, board_id: &str, name: &str) -> Result<BoardList>;

    async fn cards(&self, list_id: &str, filter: CardFilter) -> Result<Vec<Card>>;

    async fn create_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card>;

    async fn set_due(&self, card_id: &str, due: NaiveDateTime) -> Result<()>;

    async fn add_label(&self, card_id: &str, color: &str) -> Result<()>;

    async fn close_card(&self, card_id: &str) -> Result<()>;
}
