//! Postgres-backed transactional store.
//!
//! Every [`PgTx`] wraps one database transaction. Row locks taken with
//! `SELECT ... FOR UPDATE` are held until commit or rollback, which is what
//! serialises concurrent relocations, adjustments and issuances of the same rows.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate SKU, location code, username or order id |
//! | Database (foreign key violation) | `23503` | `Backend` | Dangling reference (services check existence first) |
//! | Database (check constraint violation) | `23514` | `Backend` | Negative quantity reached the database |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;
use uuid::Uuid;

use stockroom_catalog::{Batch, Item, ItemFilter, Location, Role, User};
use stockroom_core::{ItemId, LocationId, MovementId, UserId, WorkOrderId};
use stockroom_ledger::{Movement, NewMovement};
use stockroom_workorders::{OrderFilter, WorkOrder, WorkOrderLine};

use super::{Store, StoreError, Transaction};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS locations (
        id UUID PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        row_code TEXT NOT NULL DEFAULT '',
        section TEXT NOT NULL DEFAULT '',
        shelf TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        sku TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        quantity BIGINT NOT NULL CHECK (quantity >= 0),
        unit TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT '',
        part_number TEXT NOT NULL DEFAULT '',
        batch_number TEXT NOT NULL DEFAULT '',
        batch_quantity BIGINT NOT NULL DEFAULT 0,
        batch_arrived_at TIMESTAMPTZ,
        invoice_photo TEXT,
        location_id UUID REFERENCES locations(id),
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS items_category_idx ON items (category)"#,
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL DEFAULT '',
        password_hash TEXT NOT NULL DEFAULT '',
        role TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    // No foreign key to items: history outlives item deletion.
    r#"CREATE TABLE IF NOT EXISTS item_movements (
        id BIGSERIAL PRIMARY KEY,
        item_id UUID NOT NULL,
        from_location_id UUID,
        to_location_id UUID NOT NULL,
        user_id UUID NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        moved_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS item_movements_item_idx
        ON item_movements (item_id, moved_at DESC, id DESC)"#,
    r#"CREATE TABLE IF NOT EXISTS work_orders (
        id TEXT PRIMARY KEY,
        mechanic_id UUID,
        equipment TEXT NOT NULL,
        equipment_number TEXT NOT NULL,
        work_type TEXT NOT NULL,
        priority TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        issued_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS work_order_items (
        work_order_id TEXT NOT NULL REFERENCES work_orders(id) ON DELETE CASCADE,
        line_no INTEGER NOT NULL,
        item_id UUID,
        name TEXT NOT NULL,
        part_number TEXT NOT NULL DEFAULT '',
        unit TEXT NOT NULL,
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        justification TEXT NOT NULL DEFAULT '',
        photo_url TEXT,
        status TEXT NOT NULL,
        PRIMARY KEY (work_order_id, line_no)
    )"#,
];

/// Postgres-backed store.
///
/// `PostgresStore` is `Send + Sync` and cheap to clone; all operations go
/// through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PgTx { tx })
    }
}

/// One open database transaction. Dropping it rolls back.
pub struct PgTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgTx {
    async fn fetch_item(&mut self, id: ItemId, lock: bool) -> Result<Option<Item>, StoreError> {
        let sql = if lock {
            "SELECT * FROM items WHERE id = $1 FOR UPDATE"
        } else {
            "SELECT * FROM items WHERE id = $1"
        };
        let row = sqlx::query_as::<_, ItemRow>(sql)
            .bind(Uuid::from(id))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("fetch_item", e))?;
        Ok(row.map(Item::from))
    }

    async fn fetch_order(
        &mut self,
        id: &WorkOrderId,
        lock: bool,
    ) -> Result<Option<WorkOrder>, StoreError> {
        let sql = if lock {
            "SELECT * FROM work_orders WHERE id = $1 FOR UPDATE"
        } else {
            "SELECT * FROM work_orders WHERE id = $1"
        };
        let row = sqlx::query_as::<_, OrderRow>(sql)
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("fetch_order", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let lines = self.fetch_lines(vec![row.id.clone()]).await?;
        let lines = lines.into_values().next().unwrap_or_default();
        Ok(Some(row.into_order(lines)))
    }

    /// Lines of the given orders, grouped by order id and sorted by line number.
    async fn fetch_lines(
        &mut self,
        order_ids: Vec<String>,
    ) -> Result<HashMap<String, Vec<WorkOrderLine>>, StoreError> {
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT * FROM work_order_items WHERE work_order_id = ANY($1) ORDER BY work_order_id, line_no",
        )
        .bind(order_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("fetch_lines", e))?;

        let mut grouped: HashMap<String, Vec<WorkOrderLine>> = HashMap::new();
        for row in rows {
            let (order_id, line) = row.into_parts();
            grouped.entry(order_id).or_default().push(line);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl Transaction for PgTx {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        self.fetch_item(id, false).await
    }

    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        self.fetch_item(id, true).await
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, sku = %item.sku), err)]
    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, sku, description, quantity, unit, category, part_number,
                batch_number, batch_quantity, batch_arrived_at, invoice_photo,
                location_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(Uuid::from(item.id))
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(&item.part_number)
        .bind(&item.batch.number)
        .bind(item.batch.quantity)
        .bind(item.batch.arrived_at)
        .bind(&item.invoice_photo)
        .bind(item.location_id.map(Uuid::from))
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = $2, sku = $3, description = $4, quantity = $5, unit = $6,
                category = $7, part_number = $8, batch_number = $9, batch_quantity = $10,
                batch_arrived_at = $11, invoice_photo = $12, location_id = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(item.id))
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(&item.part_number)
        .bind(&item.batch.number)
        .bind(item.batch.quantity)
        .bind(item.batch.arrived_at)
        .bind(&item.invoice_photo)
        .bind(item.location_id.map(Uuid::from))
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("item {}", item.id)));
        }
        Ok(())
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn items(&mut self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError> {
        let pattern = filter.needle().map(|needle| format!("%{}%", escape_like(&needle)));
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT * FROM items
            WHERE ($1::text IS NULL
                   OR name ILIKE $1 OR sku ILIKE $1 OR part_number ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(pattern)
        .bind(filter.category())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn categories(&mut self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT DISTINCT category FROM items WHERE category <> '' ORDER BY category",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("categories", e))?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("category"))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("categories", e))
    }

    async fn location(&mut self, id: LocationId) -> Result<Option<Location>, StoreError> {
        let row = sqlx::query_as::<_, LocationRow>("SELECT * FROM locations WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("fetch_location", e))?;
        Ok(row.map(Location::from))
    }

    #[instrument(skip(self, location), fields(code = %location.code), err)]
    async fn insert_location(&mut self, location: &Location) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, code, description, row_code, section, shelf, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::from(location.id))
        .bind(&location.code)
        .bind(&location.description)
        .bind(&location.row)
        .bind(&location.section)
        .bind(&location.shelf)
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_location", e))?;
        Ok(())
    }

    async fn locations(&mut self) -> Result<Vec<Location>, StoreError> {
        let rows = sqlx::query_as::<_, LocationRow>("SELECT * FROM locations ORDER BY code")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_locations", e))?;
        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("fetch_user", e))?;
        Ok(row.map(User::from))
    }

    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, movement), fields(item_id = %movement.item_id), err)]
    async fn append_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO item_movements (item_id, from_location_id, to_location_id, user_id, note, moved_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(Uuid::from(movement.item_id))
        .bind(movement.from_location_id.map(Uuid::from))
        .bind(Uuid::from(movement.to_location_id))
        .bind(Uuid::from(movement.user_id))
        .bind(&movement.note)
        .bind(movement.moved_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_movement", e))?;
        Ok(movement.into_committed(MovementId(id as u64)))
    }

    async fn movements_for_item(&mut self, id: ItemId) -> Result<Vec<Movement>, StoreError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            "SELECT * FROM item_movements WHERE item_id = $1 ORDER BY moved_at DESC, id DESC",
        )
        .bind(Uuid::from(id))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("movements_for_item", e))?;
        Ok(rows.into_iter().map(Movement::from).collect())
    }

    async fn order(&mut self, id: &WorkOrderId) -> Result<Option<WorkOrder>, StoreError> {
        self.fetch_order(id, false).await
    }

    async fn order_for_update(&mut self, id: &WorkOrderId) -> Result<Option<WorkOrder>, StoreError> {
        self.fetch_order(id, true).await
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, lines = order.lines.len()), err)]
    async fn insert_order(&mut self, order: &WorkOrder) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO work_orders (
                id, mechanic_id, equipment, equipment_number, work_type, priority,
                description, status, issued_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.mechanic_id.map(Uuid::from))
        .bind(&order.equipment)
        .bind(&order.equipment_number)
        .bind(&order.work_type)
        .bind(order.priority.as_str())
        .bind(&order.description)
        .bind(order.status.as_str())
        .bind(order.issued_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO work_order_items (
                    work_order_id, line_no, item_id, name, part_number, unit,
                    quantity, justification, photo_url, status
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(order.id.as_str())
            .bind(line.line_no as i32)
            .bind(line.item_id.map(Uuid::from))
            .bind(&line.name)
            .bind(&line.part_number)
            .bind(&line.unit)
            .bind(line.quantity)
            .bind(&line.justification)
            .bind(&line.photo_url)
            .bind(line.status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_line", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status), err)]
    async fn update_order(&mut self, order: &WorkOrder) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE work_orders SET status = $2, issued_at = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(order.id.as_str())
        .bind(order.status.as_str())
        .bind(order.issued_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("work order {}", order.id)));
        }

        for line in &order.lines {
            sqlx::query(
                "UPDATE work_order_items SET status = $3 WHERE work_order_id = $1 AND line_no = $2",
            )
            .bind(order.id.as_str())
            .bind(line.line_no as i32)
            .bind(line.status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_line", e))?;
        }
        Ok(())
    }

    async fn orders(&mut self, filter: &OrderFilter) -> Result<Vec<WorkOrder>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT * FROM work_orders
            WHERE ($1::uuid IS NULL OR mechanic_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.mechanic_id.map(Uuid::from))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let ids = rows.iter().map(|r| r.id.clone()).collect();
        let mut lines = self.fetch_lines(ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

/// Map SQLx errors to StoreError with appropriate error types.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        if let sqlx::Error::Database(db_err) = &err {
            return StoreError::Conflict(format!(
                "{} ({})",
                db_err.message(),
                db_err.constraint().unwrap_or("unique")
            ));
        }
    }
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn decode_err(err: stockroom_core::CoreError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

// SQLx row types

#[derive(Debug)]
struct ItemRow {
    id: Uuid,
    name: String,
    sku: String,
    description: String,
    quantity: i64,
    unit: String,
    category: String,
    part_number: String,
    batch_number: String,
    batch_quantity: i64,
    batch_arrived_at: Option<DateTime<Utc>>,
    invoice_photo: Option<String>,
    location_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            description: row.try_get("description")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            category: row.try_get("category")?,
            part_number: row.try_get("part_number")?,
            batch_number: row.try_get("batch_number")?,
            batch_quantity: row.try_get("batch_quantity")?,
            batch_arrived_at: row.try_get("batch_arrived_at")?,
            invoice_photo: row.try_get("invoice_photo")?,
            location_id: row.try_get("location_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: ItemId::from_uuid(row.id),
            name: row.name,
            sku: row.sku,
            description: row.description,
            quantity: row.quantity,
            unit: row.unit,
            category: row.category,
            part_number: row.part_number,
            batch: Batch {
                number: row.batch_number,
                quantity: row.batch_quantity,
                arrived_at: row.batch_arrived_at,
            },
            invoice_photo: row.invoice_photo,
            location_id: row.location_id.map(LocationId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct LocationRow {
    id: Uuid,
    code: String,
    description: String,
    row_code: String,
    section: String,
    shelf: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for LocationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LocationRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            row_code: row.try_get("row_code")?,
            section: row.try_get("section")?,
            shelf: row.try_get("shelf")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: LocationId::from_uuid(row.id),
            code: row.code,
            description: row.description,
            row: row.row_code,
            section: row.section,
            shelf: row.shelf,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: role.parse().map_err(decode_err)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct MovementRow {
    id: i64,
    item_id: Uuid,
    from_location_id: Option<Uuid>,
    to_location_id: Uuid,
    user_id: Uuid,
    note: String,
    moved_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for MovementRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            from_location_id: row.try_get("from_location_id")?,
            to_location_id: row.try_get("to_location_id")?,
            user_id: row.try_get("user_id")?,
            note: row.try_get("note")?,
            moved_at: row.try_get("moved_at")?,
        })
    }
}

impl From<MovementRow> for Movement {
    fn from(row: MovementRow) -> Self {
        Movement {
            id: MovementId(row.id as u64),
            item_id: ItemId::from_uuid(row.item_id),
            from_location_id: row.from_location_id.map(LocationId::from_uuid),
            to_location_id: LocationId::from_uuid(row.to_location_id),
            user_id: UserId::from_uuid(row.user_id),
            note: row.note,
            moved_at: row.moved_at,
        }
    }
}

#[derive(Debug)]
struct OrderRow {
    id: String,
    mechanic_id: Option<Uuid>,
    equipment: String,
    equipment_number: String,
    work_type: String,
    priority: stockroom_workorders::Priority,
    description: String,
    status: stockroom_workorders::WorkOrderStatus,
    issued_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let priority: String = row.try_get("priority")?;
        let status: String = row.try_get("status")?;
        Ok(OrderRow {
            id: row.try_get("id")?,
            mechanic_id: row.try_get("mechanic_id")?,
            equipment: row.try_get("equipment")?,
            equipment_number: row.try_get("equipment_number")?,
            work_type: row.try_get("work_type")?,
            priority: priority.parse().map_err(decode_err)?,
            description: row.try_get("description")?,
            status: status.parse().map_err(decode_err)?,
            issued_at: row.try_get("issued_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl OrderRow {
    fn into_order(self, lines: Vec<WorkOrderLine>) -> WorkOrder {
        WorkOrder {
            id: WorkOrderId::from_string(self.id),
            mechanic_id: self.mechanic_id.map(UserId::from_uuid),
            equipment: self.equipment,
            equipment_number: self.equipment_number,
            work_type: self.work_type,
            priority: self.priority,
            description: self.description,
            status: self.status,
            lines,
            issued_at: self.issued_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug)]
struct LineRow {
    work_order_id: String,
    line: WorkOrderLine,
}

impl<'r> sqlx::FromRow<'r, PgRow> for LineRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let line_no: i32 = row.try_get("line_no")?;
        let item_id: Option<Uuid> = row.try_get("item_id")?;
        let status: String = row.try_get("status")?;
        Ok(LineRow {
            work_order_id: row.try_get("work_order_id")?,
            line: WorkOrderLine {
                line_no: line_no as u32,
                item_id: item_id.map(ItemId::from_uuid),
                name: row.try_get("name")?,
                part_number: row.try_get("part_number")?,
                unit: row.try_get("unit")?,
                quantity: row.try_get("quantity")?,
                justification: row.try_get("justification")?,
                photo_url: row.try_get("photo_url")?,
                status: status.parse().map_err(decode_err)?,
            },
        })
    }
}

impl LineRow {
    fn into_parts(self) -> (String, WorkOrderLine) {
        (self.work_order_id, self.line)
    }
}
