//! Weighted card draws.
//!
//! A draw is two-stage: pick a rarity tier by weight, then a card uniformly
//! within that tier's pool. A tier whose pool is empty contributes nothing,
//! so a draw can come up short of the requested count when the catalog is
//! sparse.

mod rng;

pub use rng::DrawRng;

use std::collections::HashMap;

use crate::models::{Card, Rarity};

/// Cards handed out by one daily draw.
pub const CARDS_PER_DAILY_DRAW: usize = 3;

/// Draw up to `count` cards from the catalog.
///
/// Duplicates are allowed — the catalog is a distribution, not a deck, and
/// nothing is consumed by drawing.
pub fn draw_cards(catalog: &[Card], rng: &mut DrawRng, count: usize) -> Vec<Card> {
    let mut pools: HashMap<Rarity, Vec<&Card>> = HashMap::new();
    for card in catalog {
        pools.entry(card.rarity).or_default().push(card);
    }

    let weights: Vec<f32> = Rarity::ALL.iter().map(Rarity::weight).collect();

    let mut drawn = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(idx) = rng.choose_weighted(&weights) else {
            break;
        };
        let Some(pool) = pools.get(&Rarity::ALL[idx]) else {
            continue;
        };
        if let Some(card) = rng.choose(pool) {
            drawn.push((*card).clone());
        }
    }
    drawn
}
