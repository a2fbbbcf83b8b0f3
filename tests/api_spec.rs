use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum_test::TestServer;
use citadelle::api::middleware::SecurityConfig;
use citadelle::api::{create_router_with_security, AppState};
use citadelle::db::Database;
use citadelle::draw::DrawRng;
use citadelle::images::ImageStore;
use citadelle::models::*;
use citadelle::reveal::{BoardRegistry, ManualClock};

/// Server wired for tests: virtual time, seeded draws, no image store.
fn setup() -> (TestServer, Arc<ManualClock>) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");

    let clock = Arc::new(ManualClock::new());
    let state = AppState {
        db,
        boards: BoardRegistry::new(),
        clock: clock.clone(),
        rng: Arc::new(Mutex::new(DrawRng::new(42))),
        images: ImageStore::disabled(),
    };

    let app = create_router_with_security(state, SecurityConfig::disabled());
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, clock)
}

async fn create_test_player(server: &TestServer, name: &str) -> Player {
    server
        .post("/api/v1/players")
        .json(&CreatePlayerInput {
            name: name.to_string(),
        })
        .await
        .json::<Player>()
}

/// One card per rarity tier, so a weighted pick always lands on a
/// populated pool and a daily draw always yields three cards.
async fn seed_full_catalog(server: &TestServer) {
    for rarity in Rarity::ALL {
        server
            .post("/api/v1/cards")
            .json(&CreateCardInput {
                name: format!("card-{}", rarity.as_str()),
                rarity,
                image_id: None,
            })
            .await
            .assert_status(StatusCode::CREATED);
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let (server, _clock) = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
    }
}

mod players {
    use super::*;

    #[tokio::test]
    async fn creates_and_fetches_a_player() {
        let (server, _clock) = setup();
        let player = create_test_player(&server, "freed").await;

        let response = server.get(&format!("/api/v1/players/{}", player.id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Player>().name, "freed");
    }

    #[tokio::test]
    async fn rejects_duplicate_names() {
        let (server, _clock) = setup();
        create_test_player(&server, "freed").await;

        let response = server
            .post("/api/v1/players")
            .json(&CreatePlayerInput {
                name: "freed".to_string(),
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod daily_draw {
    use super::*;

    #[tokio::test]
    async fn draws_three_cards_and_opens_a_reveal_board() {
        let (server, clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;

        let response = server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await;
        response.assert_status(StatusCode::CREATED);

        let draw: DrawResponse = response.json();
        assert_eq!(draw.cards.len(), 3);

        // Reveal delays follow the fixed 700ms stagger.
        let delays: Vec<u64> = draw.cards.iter().map(|c| c.reveal_delay_ms).collect();
        assert_eq!(delays, vec![0, 700, 1400]);

        // The board starts fully face-down and flips as time passes.
        let board: BoardView = server
            .get(&format!("/api/v1/draws/{}", draw.board_id))
            .await
            .json();
        assert_eq!(board.faces.len(), 3);
        assert!(board.faces.iter().all(|f| !f.revealed));
        assert!(board
            .faces
            .iter()
            .all(|f| f.markers.contains(&"draw-card".to_string())));

        clock.run_pending();

        let board: BoardView = server
            .get(&format!("/api/v1/draws/{}", draw.board_id))
            .await
            .json();
        assert!(board.faces.iter().all(|f| f.revealed));
        assert!(board
            .faces
            .iter()
            .all(|f| f.markers.contains(&"draw-card".to_string())));
    }

    #[tokio::test]
    async fn adds_the_drawn_cards_to_the_gallery() {
        let (server, _clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;

        server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await
            .assert_status(StatusCode::CREATED);

        let gallery: Vec<OwnedCard> = server
            .get(&format!("/api/v1/players/{}/cards", player.id))
            .await
            .json();
        let total: i64 = gallery.iter().map(|c| c.count).sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn blocks_a_second_draw_the_same_day() {
        let (server, _clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;

        server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unknown_players() {
        let (server, _clock) = setup();
        let response = server
            .post(&format!("/api/v1/players/{}/draw", uuid::Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn draws_from_an_empty_catalog_yield_no_cards() {
        let (server, _clock) = setup();
        let player = create_test_player(&server, "freed").await;

        let response = server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert!(response.json::<DrawResponse>().cards.is_empty());
    }
}

mod reveal_boards {
    use super::*;

    #[tokio::test]
    async fn unknown_boards_are_not_found() {
        let (server, _clock) = setup();
        let response = server
            .get(&format!("/api/v1/draws/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

mod sacrifice {
    use super::*;

    #[tokio::test]
    async fn trades_an_owned_card_for_a_fresh_draw() {
        let (server, clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;

        server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await
            .assert_status(StatusCode::CREATED);

        let gallery: Vec<OwnedCard> = server
            .get(&format!("/api/v1/players/{}/cards", player.id))
            .await
            .json();
        let sacrificed = gallery[0].card.id;

        let response = server
            .post(&format!("/api/v1/players/{}/sacrifice", player.id))
            .json(&SacrificeInput {
                card_id: sacrificed,
            })
            .await;
        response.assert_status(StatusCode::CREATED);

        let result: SacrificeResponse = response.json();
        assert_eq!(result.card.reveal_delay_ms, 0);

        // A single-card board reveals immediately.
        clock.run_pending();
        let board: BoardView = server
            .get(&format!("/api/v1/draws/{}", result.board_id))
            .await
            .json();
        assert_eq!(board.faces.len(), 1);
        assert!(board.faces[0].revealed);

        // Three drawn, one sacrificed, one gained.
        let gallery: Vec<OwnedCard> = server
            .get(&format!("/api/v1/players/{}/cards", player.id))
            .await
            .json();
        let total: i64 = gallery.iter().map(|c| c.count).sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn rejects_sacrificing_an_unowned_card() {
        let (server, _clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;

        let cards: Vec<Card> = server.get("/api/v1/cards").await.json();
        let response = server
            .post(&format!("/api/v1/players/{}/sacrifice", player.id))
            .json(&SacrificeInput {
                card_id: cards[0].id,
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod exchange {
    use super::*;

    async fn drawn_card_ids(server: &TestServer, player: &Player) -> Vec<uuid::Uuid> {
        server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .get(&format!("/api/v1/players/{}/cards", player.id))
            .await
            .json::<Vec<OwnedCard>>()
            .into_iter()
            .map(|c| c.card.id)
            .collect()
    }

    #[tokio::test]
    async fn deposits_and_lists_offers() {
        let (server, _clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;
        let cards = drawn_card_ids(&server, &player).await;

        let response = server
            .post(&format!("/api/v1/players/{}/exchange", player.id))
            .json(&DepositOfferInput { card_id: cards[0] })
            .await;
        response.assert_status(StatusCode::CREATED);

        let offers: Vec<ExchangeOfferView> = server.get("/api/v1/exchange").await.json();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].owner_name, "freed");
        assert_eq!(offers[0].card.id, cards[0]);
    }

    #[tokio::test]
    async fn settles_a_trade_between_two_players() {
        let (server, _clock) = setup();
        seed_full_catalog(&server).await;
        let owner = create_test_player(&server, "owner").await;
        let taker = create_test_player(&server, "taker").await;

        let owner_cards = drawn_card_ids(&server, &owner).await;
        let taker_cards = drawn_card_ids(&server, &taker).await;

        let offer: ExchangeOffer = server
            .post(&format!("/api/v1/players/{}/exchange", owner.id))
            .json(&DepositOfferInput {
                card_id: owner_cards[0],
            })
            .await
            .json();

        let response = server
            .post(&format!(
                "/api/v1/players/{}/exchange/{}/take",
                taker.id, offer.id
            ))
            .json(&TakeOfferInput {
                offered_card_id: taker_cards[0],
            })
            .await;
        response.assert_status_ok();

        let outcome: TradeOutcome = response.json();
        assert_eq!(outcome.received.id, owner_cards[0]);
        assert_eq!(outcome.given.id, taker_cards[0]);

        let offers: Vec<ExchangeOfferView> = server.get("/api/v1/exchange").await.json();
        assert!(offers.is_empty());
    }

    #[tokio::test]
    async fn rejects_taking_your_own_offer() {
        let (server, _clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;
        let cards = drawn_card_ids(&server, &player).await;

        let offer: ExchangeOffer = server
            .post(&format!("/api/v1/players/{}/exchange", player.id))
            .json(&DepositOfferInput { card_id: cards[0] })
            .await
            .json();

        let response = server
            .post(&format!(
                "/api/v1/players/{}/exchange/{}/take",
                player.id, offer.id
            ))
            .json(&TakeOfferInput {
                offered_card_id: cards[0],
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod ranking {
    use super::*;

    #[tokio::test]
    async fn ranks_collectors_by_gallery_size() {
        let (server, _clock) = setup();
        seed_full_catalog(&server).await;
        let player = create_test_player(&server, "freed").await;

        server
            .post(&format!("/api/v1/players/{}/draw", player.id))
            .await
            .assert_status(StatusCode::CREATED);

        let ranking: Vec<RankingEntry> = server.get("/api/v1/ranking").await.json();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].player_name, "freed");
        assert_eq!(ranking[0].total, 3);
    }
}

mod card_images {
    use super::*;

    #[tokio::test]
    async fn cards_without_artwork_have_no_image() {
        let (server, _clock) = setup();
        let card: Card = server
            .post("/api/v1/cards")
            .json(&CreateCardInput {
                name: "plain".to_string(),
                rarity: Rarity::Autre,
                image_id: None,
            })
            .await
            .json();

        let response = server
            .get(&format!("/api/v1/cards/{}/image", card.id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_lookups_fail_when_the_store_is_disabled() {
        let (server, _clock) = setup();
        let card: Card = server
            .post("/api/v1/cards")
            .json(&CreateCardInput {
                name: "fancy".to_string(),
                rarity: Rarity::Autre,
                image_id: Some("1AbC".to_string()),
            })
            .await
            .json();

        let response = server
            .get(&format!("/api/v1/cards/{}/image", card.id))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

mod auth {
    use super::*;

    fn setup_with_api_key(key: &str) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");

        let clock = Arc::new(ManualClock::new());
        let state = AppState {
            db,
            boards: BoardRegistry::new(),
            clock,
            rng: Arc::new(Mutex::new(DrawRng::new(42))),
            images: ImageStore::disabled(),
        };

        let app = create_router_with_security(state, SecurityConfig::with_api_key(key));
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn rejects_requests_without_a_key() {
        let server = setup_with_api_key("secret");
        let response = server.get("/api/v1/health").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepts_a_valid_bearer_token() {
        let server = setup_with_api_key("secret");
        let response = server
            .get("/api/v1/health")
            .add_header("Authorization", "Bearer secret")
            .await;
        response.assert_status_ok();
    }
}
