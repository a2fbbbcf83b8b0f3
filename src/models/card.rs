use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A card in the collection catalog.
///
/// Cards are identified by their (rarity, name) pair; the uuid is the stable
/// handle used by the API and the inventory tables. `image_id` is a key into
/// the remote image store and may be absent for cards without artwork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub name: String,
    pub rarity: Rarity,
    pub image_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rarity tier of a card.
///
/// Tiers carry the draw weights of the collection: a daily draw first picks
/// a tier by weight, then a card uniformly within that tier. Weights do not
/// sum to exactly 1.0; the weighted pick normalizes over the total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Secrete,
    Fondateur,
    Historique,
    Maitre,
    BlackHole,
    Architectes,
    Professeurs,
    Autre,
    Eleves,
}

impl Rarity {
    /// Every tier, in descending scarcity order.
    pub const ALL: [Rarity; 9] = [
        Self::Secrete,
        Self::Fondateur,
        Self::Historique,
        Self::Maitre,
        Self::BlackHole,
        Self::Architectes,
        Self::Professeurs,
        Self::Autre,
        Self::Eleves,
    ];

    /// Relative probability of this tier coming up in a draw.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Secrete => 0.005,
            Self::Fondateur => 0.01,
            Self::Historique => 0.02,
            Self::Maitre => 0.06,
            Self::BlackHole => 0.06,
            Self::Architectes => 0.07,
            Self::Professeurs => 0.1167,
            Self::Autre => 0.2569,
            Self::Eleves => 0.4203,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secrete => "secrete",
            Self::Fondateur => "fondateur",
            Self::Historique => "historique",
            Self::Maitre => "maitre",
            Self::BlackHole => "black_hole",
            Self::Architectes => "architectes",
            Self::Professeurs => "professeurs",
            Self::Autre => "autre",
            Self::Eleves => "eleves",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "secrete" => Some(Self::Secrete),
            "fondateur" => Some(Self::Fondateur),
            "historique" => Some(Self::Historique),
            "maitre" => Some(Self::Maitre),
            "black_hole" => Some(Self::BlackHole),
            "architectes" => Some(Self::Architectes),
            "professeurs" => Some(Self::Professeurs),
            "autre" => Some(Self::Autre),
            "eleves" => Some(Self::Eleves),
            _ => None,
        }
    }
}

/// Input for adding a card to the catalog (API and seed file share this shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardInput {
    pub name: String,
    pub rarity: Rarity,
    pub image_id: Option<String>,
}
