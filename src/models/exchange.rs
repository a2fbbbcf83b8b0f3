use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A card deposited on the exchange board.
///
/// Depositing removes the copy from the owner's inventory; the copy lives on
/// the board until another player takes the offer (giving a card of their own
/// in return) or indefinitely — offers do not expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeOffer {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub card_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An offer joined with its card and owner, as shown on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeOfferView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub card: super::Card,
    pub created_at: DateTime<Utc>,
}

/// Input for depositing a card onto the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositOfferInput {
    pub card_id: Uuid,
}

/// Input for taking an offer: the card given to the offer's owner in return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakeOfferInput {
    pub offered_card_id: Uuid,
}

/// Result of a completed trade, from the taker's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// The card received from the board.
    pub received: super::Card,
    /// The card handed over to the offer's owner.
    pub given: super::Card,
}
