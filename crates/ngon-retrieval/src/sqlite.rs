use crate::store::FoodStore;
use async_trait::async_trait;
use ngon_core::{City, FoodItem, NgonError, NgonResult};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const COLUMNS: &str = "id, ten_quan, ten_mon, dia_chi, quan, thanh_pho, gia_min, gia_max, note";

/// SQLite-backed read-only store over one city's `food.db`.
///
/// The schema is produced by the offline data-pack builder: a single `food`
/// table with Vietnamese column names (ten_quan = restaurant, ten_mon = dish,
/// dia_chi = address, quan = district, thanh_pho = city). Queries run on the
/// blocking pool so request tasks never block on file I/O.
#[derive(Debug)]
pub struct SqliteFoodStore {
    conn: Arc<Mutex<Connection>>,
    city: City,
}

impl SqliteFoodStore {
    /// Open `path` read-only. A missing or unreadable file is a
    /// [`NgonError::ServiceUnavailable`] for this city.
    pub fn open(path: &Path, city: City) -> NgonResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            NgonError::ServiceUnavailable(format!(
                "cannot open store for {city}: {e} ({})",
                path.display()
            ))
        })?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            city,
        })
    }

    fn row_to_item(row: &Row<'_>, city: City) -> rusqlite::Result<FoodItem> {
        Ok(FoodItem {
            id: row.get(0)?,
            name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            dish: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            address: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            district: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            city: row
                .get::<_, Option<String>>(5)?
                .unwrap_or_else(|| city.as_str().to_string()),
            price_min: row.get::<_, Option<u32>>(6)?.unwrap_or(0),
            price_max: row.get::<_, Option<u32>>(7)?.unwrap_or(0),
            note: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        })
    }

    fn unavailable(&self, e: rusqlite::Error) -> NgonError {
        NgonError::ServiceUnavailable(format!("store query failed for {}: {e}", self.city))
    }
}

#[async_trait]
impl FoodStore for SqliteFoodStore {
    async fn lookup_by_ids(&self, ids: &[i64]) -> NgonResult<Vec<FoodItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = Arc::clone(&self.conn);
        let city = self.city;
        let ids_owned: Vec<i64> = ids.to_vec();

        let rows = tokio::task::spawn_blocking(move || -> rusqlite::Result<Vec<FoodItem>> {
            let conn = conn.lock();
            let placeholders = vec!["?"; ids_owned.len()].join(",");
            let sql = format!("SELECT {COLUMNS} FROM food WHERE id IN ({placeholders})");
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(rusqlite::params_from_iter(ids_owned.iter()), |row| {
                    Self::row_to_item(row, city)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
        .await
        .map_err(|e| NgonError::ServiceUnavailable(format!("store task panicked: {e}")))?
        .map_err(|e| self.unavailable(e))?;

        // SQLite returns IN-clause rows in table order; re-impose the
        // requested order so semantic ranks survive the round trip.
        let mut by_id: HashMap<i64, FoodItem> =
            rows.into_iter().map(|item| (item.id, item)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn search_by_name(&self, keyword: &str, limit: usize) -> NgonResult<Vec<FoodItem>> {
        let conn = Arc::clone(&self.conn);
        let city = self.city;
        let needle = format!("%{}%", keyword.to_lowercase());

        tokio::task::spawn_blocking(move || -> rusqlite::Result<Vec<FoodItem>> {
            let conn = conn.lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM food \
                 WHERE lower(ten_quan) LIKE ?1 OR lower(ten_mon) LIKE ?1 \
                 ORDER BY id LIMIT ?2"
            ))?;
            let items = stmt
                .query_map(rusqlite::params![needle, limit as i64], |row| {
                    Self::row_to_item(row, city)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
        .await
        .map_err(|e| NgonError::ServiceUnavailable(format!("store task panicked: {e}")))?
        .map_err(|e| self.unavailable(e))
    }

    async fn count(&self) -> NgonResult<usize> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> rusqlite::Result<usize> {
            let conn = conn.lock();
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM food", [], |row| row.get(0))?;
            Ok(n as usize)
        })
        .await
        .map_err(|e| NgonError::ServiceUnavailable(format!("store task panicked: {e}")))?
        .map_err(|e| self.unavailable(e))
    }
}
