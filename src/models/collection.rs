use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::Card;

/// A card in a player's gallery, with the number of copies owned.
///
/// The card fields are flattened into the JSON response alongside `count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedCard {
    #[serde(flatten)]
    pub card: Card,
    pub count: i64,
}

/// One row of the collector ranking: total copies owned, all cards combined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub player_id: Uuid,
    pub player_name: String,
    pub total: i64,
}
