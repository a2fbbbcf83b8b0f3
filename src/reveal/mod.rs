//! Staggered cascade-reveal of freshly drawn cards.
//!
//! Every draw opens an ephemeral board of face-down cards. The scheduler
//! walks the board once, in draw order, and arms one deferred action per
//! card: the card at index `i` gains the [`REVEALED_MARKER`] after
//! `i * STAGGER_DELAY`. Clients poll the board and style faces off their
//! marker sets; the server never does anything visual.
//!
//! The scheduler is stateless and takes its inputs explicitly — the face
//! snapshot and a [`Clock`] — so tests inject a fake collection and run
//! virtual time synchronously.

mod board;
mod clock;

pub use board::{BoardRegistry, RevealBoard};
pub use clock::{Action, Clock, ManualClock, TokioClock};

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{Card, FaceView};

/// Marker carried by every face that participates in the reveal cascade.
pub const DRAW_CARD_MARKER: &str = "draw-card";

/// Marker added when a face flips up.
pub const REVEALED_MARKER: &str = "revealed";

/// Fixed per-index stagger between consecutive reveals.
pub const STAGGER_DELAY: Duration = Duration::from_millis(700);

/// Delay before the face at ordinal `index` reveals, relative to scheduling.
pub fn reveal_delay(index: usize) -> Duration {
    STAGGER_DELAY * index as u32
}

struct CardFace {
    card: Card,
    markers: BTreeSet<String>,
}

/// Shared handle to one face on a reveal board.
///
/// A face is a card plus a set of string markers. Marker insertion is
/// idempotent and markers are never removed, so the `revealed` flag moves
/// unset → set exactly once and never reverts.
#[derive(Clone)]
pub struct FaceHandle(Arc<Mutex<CardFace>>);

impl FaceHandle {
    /// A face entering the cascade: starts face-down, bearing the
    /// [`DRAW_CARD_MARKER`].
    pub fn drawn(card: Card) -> Self {
        Self::with_markers(card, [DRAW_CARD_MARKER])
    }

    /// A face with an arbitrary starting marker set.
    pub fn with_markers<'a>(card: Card, markers: impl IntoIterator<Item = &'a str>) -> Self {
        Self(Arc::new(Mutex::new(CardFace {
            card,
            markers: markers.into_iter().map(str::to_owned).collect(),
        })))
    }

    /// Add a marker. A no-op when already present.
    pub fn add_marker(&self, marker: &str) {
        let mut face = self.0.lock().expect("face lock poisoned");
        face.markers.insert(marker.to_owned());
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.0
            .lock()
            .expect("face lock poisoned")
            .markers
            .contains(marker)
    }

    pub fn is_revealed(&self) -> bool {
        self.has_marker(REVEALED_MARKER)
    }

    pub fn card(&self) -> Card {
        self.0.lock().expect("face lock poisoned").card.clone()
    }

    pub fn view(&self) -> FaceView {
        let face = self.0.lock().expect("face lock poisoned");
        FaceView {
            card: face.card.clone(),
            markers: face.markers.iter().cloned().collect(),
            revealed: face.markers.contains(REVEALED_MARKER),
        }
    }
}

/// Arm the cascade for a board.
///
/// Takes a snapshot of `faces`, keeps those bearing the [`DRAW_CARD_MARKER`]
/// (others are never mutated and not counted), and schedules one action per
/// kept face: the face at snapshot index `i` gains the [`REVEALED_MARKER`]
/// after `i * STAGGER_DELAY`. Call this exactly once per board, when the
/// board is opened; faces added later are not picked up.
///
/// Zero matching faces schedules nothing. There is no error path: the
/// cascade is cosmetic, and a reveal that never fires is an accepted loss.
pub fn schedule_reveals(faces: &[FaceHandle], clock: &dyn Clock) {
    let matched = faces
        .iter()
        .filter(|face| face.has_marker(DRAW_CARD_MARKER))
        .cloned();

    for (index, face) in matched.enumerate() {
        clock.schedule(
            reveal_delay(index),
            Box::new(move || face.add_marker(REVEALED_MARKER)),
        );
    }
}
