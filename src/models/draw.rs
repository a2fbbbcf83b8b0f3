use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::Card;

/// A card produced by a draw, paired with the delay (in milliseconds, relative
/// to the draw) after which its face flips up on the reveal board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawnCard {
    #[serde(flatten)]
    pub card: Card,
    pub reveal_delay_ms: u64,
}

/// Response to a daily draw: the board to watch and the cards it will reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawResponse {
    pub board_id: Uuid,
    pub cards: Vec<DrawnCard>,
}

/// Input for sacrificing a card in exchange for a fresh draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SacrificeInput {
    pub card_id: Uuid,
}

/// Response to a sacrifice: the replacement card on its own reveal board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SacrificeResponse {
    pub board_id: Uuid,
    pub card: DrawnCard,
}

/// One face on a reveal board: the card plus its current marker set.
///
/// `revealed` is derived from the markers for convenience; clients style the
/// face entirely off the marker list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceView {
    pub card: Card,
    pub markers: Vec<String>,
    pub revealed: bool,
}

/// Snapshot of a reveal board, faces in draw order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub id: Uuid,
    pub player_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub faces: Vec<FaceView>,
}
