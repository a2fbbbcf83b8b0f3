use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A collector.
///
/// Players are the top-level actors: they draw, sacrifice and trade cards.
/// Names are unique across the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlayerInput {
    pub name: String,
}
