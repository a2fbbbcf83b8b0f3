use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::api::AppState;
use crate::draw;
use crate::images::ImageError;
use crate::models::*;
use crate::reveal;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
///
/// Some errors are validation errors that should be exposed to the client
/// (e.g., "Player does not own that card"). These are returned as-is with
/// a BAD_REQUEST status.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    // Known validation errors that are safe to expose
    if msg.contains("not found") || msg.contains("already") || msg.contains("own") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Card catalog
// ============================================================

pub async fn list_cards(
    State(state): State<AppState>,
) -> Result<Json<Vec<Card>>, (StatusCode, String)> {
    state.db.get_all_cards().map(Json).map_err(internal_error)
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Card>, (StatusCode, String)> {
    state
        .db
        .get_card(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Card not found".to_string()))
}

pub async fn create_card(
    State(state): State<AppState>,
    Json(input): Json<CreateCardInput>,
) -> Result<(StatusCode, Json<Card>), (StatusCode, String)> {
    state
        .db
        .create_card(input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

pub async fn get_card_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let card = state
        .db
        .get_card(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Card not found".to_string()))?;

    let image_id = card
        .image_id
        .ok_or((StatusCode::NOT_FOUND, "Card has no image".to_string()))?;

    match state.images.fetch(&image_id).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
        Err(ImageError::Disabled) => Err((
            StatusCode::NOT_FOUND,
            "Image store is not configured".to_string(),
        )),
        Err(ImageError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Image not found".to_string()))
        }
        Err(ImageError::Http(e)) => {
            tracing::error!("Image store request failed: {}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                "Image store request failed".to_string(),
            ))
        }
    }
}

// ============================================================
// Players
// ============================================================

pub async fn list_players(
    State(state): State<AppState>,
) -> Result<Json<Vec<Player>>, (StatusCode, String)> {
    state.db.get_all_players().map(Json).map_err(internal_error)
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Player>, (StatusCode, String)> {
    state
        .db
        .get_player(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Player not found".to_string()))
}

pub async fn create_player(
    State(state): State<AppState>,
    Json(input): Json<CreatePlayerInput>,
) -> Result<(StatusCode, Json<Player>), (StatusCode, String)> {
    state
        .db
        .create_player(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

// ============================================================
// Draws
// ============================================================

pub async fn daily_draw(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<DrawResponse>), (StatusCode, String)> {
    let player = state
        .db
        .get_player(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Player not found".to_string()))?;

    let today = Utc::now().date_naive();
    if !state
        .db
        .can_draw_on(player.id, today)
        .map_err(internal_error)?
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Daily draw already performed today".to_string(),
        ));
    }

    let catalog = state.db.get_all_cards().map_err(internal_error)?;
    let drawn = {
        let mut rng = state.rng.lock().expect("rng lock poisoned");
        draw::draw_cards(&catalog, &mut rng, draw::CARDS_PER_DAILY_DRAW)
    };

    for card in &drawn {
        state
            .db
            .add_card_to_player(player.id, card.id)
            .map_err(internal_error)?;
    }
    state
        .db
        .record_draw(player.id, today)
        .map_err(internal_error)?;

    let board_id = state
        .boards
        .open_board(player.id, &drawn, state.clock.as_ref());

    tracing::info!("Player {} drew {} cards", player.name, drawn.len());

    let cards = drawn
        .into_iter()
        .enumerate()
        .map(|(i, card)| DrawnCard {
            card,
            reveal_delay_ms: reveal::reveal_delay(i).as_millis() as u64,
        })
        .collect();

    Ok((StatusCode::CREATED, Json(DrawResponse { board_id, cards })))
}

pub async fn sacrifice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SacrificeInput>,
) -> Result<(StatusCode, Json<SacrificeResponse>), (StatusCode, String)> {
    let player = state
        .db
        .get_player(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Player not found".to_string()))?;

    if !state
        .db
        .remove_card_from_player(player.id, input.card_id)
        .map_err(internal_error)?
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Player does not own that card".to_string(),
        ));
    }

    let catalog = state.db.get_all_cards().map_err(internal_error)?;
    let drawn = {
        let mut rng = state.rng.lock().expect("rng lock poisoned");
        draw::draw_cards(&catalog, &mut rng, 1)
    };

    // The sacrificed copy is gone either way; an empty catalog pick is the
    // player's bad luck.
    let card = drawn.into_iter().next().ok_or((
        StatusCode::BAD_REQUEST,
        "No card available to draw".to_string(),
    ))?;

    state
        .db
        .add_card_to_player(player.id, card.id)
        .map_err(internal_error)?;

    let board_id = state
        .boards
        .open_board(player.id, std::slice::from_ref(&card), state.clock.as_ref());

    Ok((
        StatusCode::CREATED,
        Json(SacrificeResponse {
            board_id,
            card: DrawnCard {
                card,
                reveal_delay_ms: 0,
            },
        }),
    ))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardView>, (StatusCode, String)> {
    state
        .boards
        .view(id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Board not found".to_string()))
}

// ============================================================
// Gallery and ranking
// ============================================================

pub async fn get_player_cards(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OwnedCard>>, (StatusCode, String)> {
    state
        .db
        .get_player(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Player not found".to_string()))?;

    state
        .db
        .get_player_cards(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_ranking(
    State(state): State<AppState>,
) -> Result<Json<Vec<RankingEntry>>, (StatusCode, String)> {
    state.db.compute_ranking().map(Json).map_err(internal_error)
}

// ============================================================
// Exchange board
// ============================================================

pub async fn list_offers(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExchangeOfferView>>, (StatusCode, String)> {
    state.db.get_open_offers().map(Json).map_err(internal_error)
}

pub async fn deposit_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<DepositOfferInput>,
) -> Result<(StatusCode, Json<ExchangeOffer>), (StatusCode, String)> {
    state
        .db
        .deposit_offer(id, input.card_id)
        .map(|o| (StatusCode::CREATED, Json(o)))
        .map_err(internal_error)
}

pub async fn take_offer(
    State(state): State<AppState>,
    Path((id, offer_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<TakeOfferInput>,
) -> Result<Json<TradeOutcome>, (StatusCode, String)> {
    state
        .db
        .take_offer(offer_id, id, input.offered_card_id)
        .map(Json)
        .map_err(internal_error)
}
