mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "citadelle")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("citadelle.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Card catalog operations
    // ============================================================

    pub fn create_card(&self, input: CreateCardInput) -> Result<Card> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let duplicates: i32 = conn.query_row(
            "SELECT COUNT(*) FROM cards WHERE rarity = ? AND name = ?",
            (input.rarity.as_str(), &input.name),
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            anyhow::bail!("Card already exists: {} ({})", input.name, input.rarity.as_str());
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO cards (id, name, rarity, image_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                input.rarity.as_str(),
                &input.image_id,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Card {
            id,
            name: input.name,
            rarity: input.rarity,
            image_id: input.image_id,
            created_at: now,
        })
    }

    pub fn get_card(&self, id: Uuid) -> Result<Option<Card>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, rarity, image_id, created_at FROM cards WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(card_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn get_all_cards(&self) -> Result<Vec<Card>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, rarity, image_id, created_at FROM cards ORDER BY rarity, name",
        )?;

        let cards = stmt
            .query_map([], |row| card_from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    // ============================================================
    // Player operations
    // ============================================================

    pub fn create_player(&self, input: CreatePlayerInput) -> Result<Player> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let duplicates: i32 = conn.query_row(
            "SELECT COUNT(*) FROM players WHERE name = ?",
            [&input.name],
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            anyhow::bail!("Player name already taken: {}", input.name);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO players (id, name, created_at) VALUES (?, ?, ?)",
            (id.to_string(), &input.name, now.to_rfc3339()),
        )?;

        Ok(Player {
            id,
            name: input.name,
            created_at: now,
        })
    }

    pub fn get_player(&self, id: Uuid) -> Result<Option<Player>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM players WHERE id = ?")?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Player {
                id: parse_uuid(row.get::<_, String>(0)?),
                name: row.get(1)?,
                created_at: parse_datetime(row.get::<_, String>(2)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn get_all_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt =
            conn.prepare("SELECT id, name, created_at FROM players ORDER BY name")?;

        let players = stmt
            .query_map([], |row| {
                Ok(Player {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    created_at: parse_datetime(row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(players)
    }

    // ============================================================
    // Inventory operations
    // ============================================================

    pub fn add_card_to_player(&self, player_id: Uuid, card_id: Uuid) -> Result<()> {
        self.get_player(player_id)?
            .ok_or_else(|| anyhow::anyhow!("Player not found"))?;
        self.get_card(card_id)?
            .ok_or_else(|| anyhow::anyhow!("Card not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO inventory (player_id, card_id, count) VALUES (?, ?, 1)
             ON CONFLICT (player_id, card_id) DO UPDATE SET count = count + 1",
            (player_id.to_string(), card_id.to_string()),
        )?;
        Ok(())
    }

    /// Remove one copy of a card from a player.
    ///
    /// Returns false when the player owns no copy.
    pub fn remove_card_from_player(&self, player_id: Uuid, card_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let count: Option<i64> = conn
            .query_row(
                "SELECT count FROM inventory WHERE player_id = ? AND card_id = ?",
                (player_id.to_string(), card_id.to_string()),
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match count {
            None | Some(0) => Ok(false),
            Some(1) => {
                conn.execute(
                    "DELETE FROM inventory WHERE player_id = ? AND card_id = ?",
                    (player_id.to_string(), card_id.to_string()),
                )?;
                Ok(true)
            }
            Some(_) => {
                conn.execute(
                    "UPDATE inventory SET count = count - 1 WHERE player_id = ? AND card_id = ?",
                    (player_id.to_string(), card_id.to_string()),
                )?;
                Ok(true)
            }
        }
    }

    pub fn get_player_cards(&self, player_id: Uuid) -> Result<Vec<OwnedCard>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.rarity, c.image_id, c.created_at, i.count
             FROM inventory i JOIN cards c ON c.id = i.card_id
             WHERE i.player_id = ? ORDER BY c.rarity, c.name",
        )?;

        let cards = stmt
            .query_map([player_id.to_string()], |row| {
                Ok(OwnedCard {
                    card: card_from_row(row)?,
                    count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    pub fn compute_ranking(&self) -> Result<Vec<RankingEntry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, SUM(i.count) AS total
             FROM inventory i JOIN players p ON p.id = i.player_id
             GROUP BY p.id, p.name ORDER BY total DESC, p.name",
        )?;

        let ranking = stmt
            .query_map([], |row| {
                Ok(RankingEntry {
                    player_id: parse_uuid(row.get::<_, String>(0)?),
                    player_name: row.get(1)?,
                    total: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ranking)
    }

    // ============================================================
    // Daily draw operations
    // ============================================================

    pub fn can_draw_on(&self, player_id: Uuid, date: NaiveDate) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let last: Option<String> = conn
            .query_row(
                "SELECT last_draw_date FROM daily_draws WHERE player_id = ?",
                [player_id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(last.as_deref() != Some(date.format("%Y-%m-%d").to_string().as_str()))
    }

    pub fn record_draw(&self, player_id: Uuid, date: NaiveDate) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO daily_draws (player_id, last_draw_date) VALUES (?, ?)
             ON CONFLICT (player_id) DO UPDATE SET last_draw_date = excluded.last_draw_date",
            (player_id.to_string(), date.format("%Y-%m-%d").to_string()),
        )?;
        Ok(())
    }

    // ============================================================
    // Exchange board operations
    // ============================================================

    /// Move one copy of a card from a player onto the board.
    pub fn deposit_offer(&self, owner_id: Uuid, card_id: Uuid) -> Result<ExchangeOffer> {
        self.get_player(owner_id)?
            .ok_or_else(|| anyhow::anyhow!("Player not found"))?;
        self.get_card(card_id)?
            .ok_or_else(|| anyhow::anyhow!("Card not found"))?;

        if !self.remove_card_from_player(owner_id, card_id)? {
            anyhow::bail!("Player does not own that card");
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO exchange_offers (id, owner_id, card_id, created_at)
             VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                owner_id.to_string(),
                card_id.to_string(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(ExchangeOffer {
            id,
            owner_id,
            card_id,
            created_at: now,
        })
    }

    pub fn get_offer(&self, id: Uuid) -> Result<Option<ExchangeOffer>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, card_id, created_at FROM exchange_offers WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(ExchangeOffer {
                id: parse_uuid(row.get::<_, String>(0)?),
                owner_id: parse_uuid(row.get::<_, String>(1)?),
                card_id: parse_uuid(row.get::<_, String>(2)?),
                created_at: parse_datetime(row.get::<_, String>(3)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn get_open_offers(&self) -> Result<Vec<ExchangeOfferView>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT o.id, o.owner_id, p.name, o.created_at,
                    c.id, c.name, c.rarity, c.image_id, c.created_at
             FROM exchange_offers o
             JOIN players p ON p.id = o.owner_id
             JOIN cards c ON c.id = o.card_id
             ORDER BY o.created_at DESC",
        )?;

        let offers = stmt
            .query_map([], |row| {
                Ok(ExchangeOfferView {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    owner_id: parse_uuid(row.get::<_, String>(1)?),
                    owner_name: row.get(2)?,
                    created_at: parse_datetime(row.get::<_, String>(3)?),
                    card: Card {
                        id: parse_uuid(row.get::<_, String>(4)?),
                        name: row.get(5)?,
                        rarity: Rarity::from_str(&row.get::<_, String>(6)?)
                            .unwrap_or(Rarity::Autre),
                        image_id: row.get(7)?,
                        created_at: parse_datetime(row.get::<_, String>(8)?),
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(offers)
    }

    pub fn delete_offer(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM exchange_offers WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Settle a trade: the taker hands `offered_card_id` to the offer's owner
    /// and receives the board card; the offer leaves the board.
    pub fn take_offer(
        &self,
        offer_id: Uuid,
        taker_id: Uuid,
        offered_card_id: Uuid,
    ) -> Result<TradeOutcome> {
        let offer = self
            .get_offer(offer_id)?
            .ok_or_else(|| anyhow::anyhow!("Offer not found"))?;

        self.get_player(taker_id)?
            .ok_or_else(|| anyhow::anyhow!("Player not found"))?;

        if offer.owner_id == taker_id {
            anyhow::bail!("Cannot take your own offer");
        }

        let received = self
            .get_card(offer.card_id)?
            .ok_or_else(|| anyhow::anyhow!("Card not found"))?;
        let given = self
            .get_card(offered_card_id)?
            .ok_or_else(|| anyhow::anyhow!("Card not found"))?;

        if !self.remove_card_from_player(taker_id, offered_card_id)? {
            anyhow::bail!("Player does not own that card");
        }

        self.add_card_to_player(taker_id, offer.card_id)?;
        self.add_card_to_player(offer.owner_id, offered_card_id)?;
        self.delete_offer(offer_id)?;

        Ok(TradeOutcome { received, given })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn card_from_row(row: &rusqlite::Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        rarity: Rarity::from_str(&row.get::<_, String>(2)?).unwrap_or(Rarity::Autre),
        image_id: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
