use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::board::BoardRepository;
use crate::models::{card_description, description_link, Card, Event};

#[derive(Debug, Default)]
pub struct SyncStats {
    pub created: usize,
    pub matched: usize,
    pub skipped_stale: usize,
}

#[derive(Debug, Default)]
pub struct ArchiveStats {
    pub closed: usize,
    pub skipped: usize,
}

/// Find the card already tracking an event: exact equality between the
/// card's `Link:` field and the event link. First match in input order wins.
pub fn find_card<'a>(cards: &'a [Card], event: &Event) -> Option<&'a Card> {
    cards
        .iter()
        .find(|card| description_link(&card.desc) == Some(event.link.as_str()))
}

/// Find the named list on the board, creating it when absent.
pub async fn ensure_list<R: BoardRepository>(
    repo: &R,
    board_id: &str,
    name: &str,
) -> Result<String> {
    let lists = repo.lists(board_id).await?;
    if let Some(list) = lists.into_iter().find(|list| list.name == name) {
        return Ok(list.id);
    }
    tracing::debug!("Unable to detect list {name:?}, creating a new one");
    Ok(repo.create_list(board_id, name).await?.id)
}

/// Create cards for events that have none yet. Matching runs against the
/// `existing_cards` snapshot taken before the run; cards created here are
/// not added back into the matching set, so a link appearing twice in one
/// event sequence can produce two cards.
///
/// `antyflood` caps creations per run. Once it is exhausted the remaining
/// events are left entirely unprocessed, not even matched or logged.
pub async fn add_missing_cards<R: BoardRepository>(
    repo: &R,
    list_id: &str,
    events: impl IntoIterator<Item = Event>,
    existing_cards: &[Card],
    antyflood: u32,
    now: NaiveDateTime,
) -> Result<SyncStats> {
    let mut stats = SyncStats::default();
    let mut remaining = antyflood;

    for event in events {
        if remaining == 0 {
            tracing::info!(
                "Anti-flood limit of {antyflood} created cards reached, \
                 leaving remaining events for the next run"
            );
            break;
        }

        match find_card(existing_cards, &event) {
            Some(card) => {
                tracing::info!(
                    "Card {} ({}) for event {} ({}) detected",
                    card.name,
                    card.id,
                    event.title,
                    event.link
                );
                stats.matched += 1;
            }
            None if now > event.date => {
                tracing::debug!("Skip creating a card for stale event {}", event.title);
                stats.skipped_stale += 1;
            }
            None => {
                let desc = card_description(&event);
                let card = repo.create_card(list_id, &event.title, &desc).await?;
                repo.set_due(&card.id, event.date).await?;
                if event.is_free {
                    repo.add_label(&card.id, "green").await?;
                }
                remaining -= 1;
                stats.created += 1;
                tracing::info!("Created card {} for {}", event.title, event.link);
            }
        }
    }

    Ok(stats)
}

/// Close open cards whose due date has elapsed. Cards without a due date are
/// left untouched; closing is the only mutation performed here.
pub async fn archive_due_cards<R: BoardRepository>(
    repo: &R,
    open_cards: &[Card],
    now: NaiveDateTime,
) -> Result<ArchiveStats> {
    let mut stats = ArchiveStats::default();

    for card in open_cards {
        let Some(due) = card.due.as_deref() else {
            tracing::debug!("Skip card {} without a due date", card.name);
            stats.skipped += 1;
            continue;
        };

        let due = parse_due(due).with_context(|| {
            format!("Card {} ({}) has a malformed due date", card.name, card.id)
        })?;

        if now > due {
            repo.close_card(&card.id).await?;
            stats.closed += 1;
            tracing::info!("Closed old card {} ({})", card.name, card.id);
        } else {
            tracing::debug!("Skip fresh card {} ({})", card.name, card.id);
            stats.skipped += 1;
        }
    }

    Ok(stats)
}

/// Parse a card due date into a naive local date-time. A timezone offset is
/// discarded, not converted: `10:00:00+09:00` compares as 10:00:00.
fn parse_due(due: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(due)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(due, "%Y-%m-%dT%H:%M:%S%.f").ok())
}
