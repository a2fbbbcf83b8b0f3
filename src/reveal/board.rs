use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{BoardView, Card};

use super::{schedule_reveals, Clock, FaceHandle};

/// An ephemeral board holding the faces of one draw, in draw order.
///
/// Boards are immutable snapshots: the face list is fixed at creation and
/// cards drawn later never join an existing board.
pub struct RevealBoard {
    id: Uuid,
    player_id: Uuid,
    created_at: DateTime<Utc>,
    faces: Vec<FaceHandle>,
}

impl RevealBoard {
    fn new(player_id: Uuid, cards: &[Card]) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            created_at: Utc::now(),
            faces: cards.iter().cloned().map(FaceHandle::drawn).collect(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn faces(&self) -> &[FaceHandle] {
        &self.faces
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            id: self.id,
            player_id: self.player_id,
            created_at: self.created_at,
            faces: self.faces.iter().map(FaceHandle::view).collect(),
        }
    }
}

/// In-memory registry of live reveal boards.
///
/// Boards are never persisted; a restart forgets them, which loses nothing
/// but the cosmetic cascade.
#[derive(Clone, Default)]
pub struct BoardRegistry {
    boards: Arc<Mutex<HashMap<Uuid, RevealBoard>>>,
}

impl BoardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a board for a draw and arm its cascade.
    ///
    /// This is the board's one-time ready hook: the reveal schedule is armed
    /// here and never again for the same board.
    pub fn open_board(&self, player_id: Uuid, cards: &[Card], clock: &dyn Clock) -> Uuid {
        let board = RevealBoard::new(player_id, cards);
        schedule_reveals(board.faces(), clock);

        let id = board.id();
        self.boards
            .lock()
            .expect("board registry lock poisoned")
            .insert(id, board);
        id
    }

    pub fn view(&self, id: Uuid) -> Option<BoardView> {
        self.boards
            .lock()
            .expect("board registry lock poisoned")
            .get(&id)
            .map(RevealBoard::view)
    }

    pub fn len(&self) -> usize {
        self.boards
            .lock()
            .expect("board registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rarity;
    use crate::reveal::ManualClock;

    fn card(name: &str) -> Card {
        Card {
            id: Uuid::new_v4(),
            name: name.to_string(),
            rarity: Rarity::Autre,
            image_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn opening_a_board_arms_one_action_per_card() {
        let registry = BoardRegistry::new();
        let clock = ManualClock::new();
        let cards = vec![card("a"), card("b")];

        let id = registry.open_board(Uuid::new_v4(), &cards, &clock);

        assert_eq!(clock.pending(), 2);
        let view = registry.view(id).expect("board exists");
        assert_eq!(view.faces.len(), 2);
        assert!(view.faces.iter().all(|f| !f.revealed));
    }

    #[test]
    fn board_views_track_reveals() {
        let registry = BoardRegistry::new();
        let clock = ManualClock::new();
        let cards = vec![card("a"), card("b"), card("c")];

        let id = registry.open_board(Uuid::new_v4(), &cards, &clock);
        clock.advance(std::time::Duration::from_millis(700));

        let view = registry.view(id).expect("board exists");
        let revealed: Vec<bool> = view.faces.iter().map(|f| f.revealed).collect();
        assert_eq!(revealed, vec![true, true, false]);
    }

    #[test]
    fn unknown_boards_are_absent() {
        let registry = BoardRegistry::new();
        assert!(registry.view(Uuid::new_v4()).is_none());
        assert!(registry.is_empty());
    }
}
