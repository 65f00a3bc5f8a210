use chrono::NaiveDateTime;
use serde::Deserialize;

/// One row of the Crossweb event listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Absolute URL of the event detail page; unique per event.
    pub link: String,
    pub date: NaiveDateTime,
    pub title: String,
    pub city: String,
    pub topic: String,
    pub kind: String,
    pub cost: String,
    pub is_free: bool,
}

/// Card fields the sync consumes, matching the board's JSON exactly.
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub due: Option<String>,
    pub closed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub name: String,
}

/// Render the card description block. Boards created by earlier versions of
/// this tool carry exactly this layout, so the labels and field order must
/// not change.
pub fn card_description(event: &Event) -> String {
    format!(
        "\nData: {date}\nTytuł: {title}\nMiasto: {city}\nTemat: {topic}\nTyp: {kind}\nKoszt: {cost}\nLink: {link}\n",
        date = event.date.format("%Y-%m-%d %H:%M:%S"),
        title = event.title,
        city = event.city,
        topic = event.topic,
        kind = event.kind,
        cost = event.cost,
        link = event.link,
    )
}

/// Recover the event link from a card description. The `Link:` line is the
/// only field read back programmatically; everything else is for humans.
pub fn description_link(desc: &str) -> Option<&str> {
    desc.lines()
        .find_map(|line| line.strip_prefix("Link:"))
        .map(str::trim)
        .filter(|link| !link.is_empty())
}
