//! PostgreSQL storage backend using sqlx.
//!
//! Provides [`PgMarketplace`], which implements every repository trait over
//! a relational marketplace schema via `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! store-search = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! `stores` is the searched table. Its one-hop relations live in
//! `store_details`, `paybacks` (both keyed by `store_id`) and `users`
//! (referenced by `stores.user_id`). Products, variants, orders and reviews
//! each have their own table. Enumerations are stored as their wire names
//! in `TEXT` columns.

use crate::core::error::StorageError;
use crate::core::query::{SearchPage, SortDirection, SortField};
use crate::core::range::RangeFilter;
use crate::core::service::{
    OrderFilter, OrderRepository, PhoneticQuery, ProductFilter, ProductRepository, RatingTotal,
    ReviewFilter, ReviewRepository, StatusCondition, StoreAggregate, StoreRepository,
};
use crate::core::store::{StorePredicate, StoreQuery};
use crate::entities::{Owner, Payback, Store, StoreDetail};
use crate::storage::MarketplaceSnapshot;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Encode, PgPool, Postgres, QueryBuilder, Row, Type};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        display_id TEXT NOT NULL,
        nickname TEXT NOT NULL,
        email TEXT NULL
    )",
    "CREATE TABLE IF NOT EXISTS stores (
        id UUID PRIMARY KEY,
        number BIGINT NOT NULL,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        business_form TEXT NOT NULL,
        plan TEXT NOT NULL,
        margin_rate DOUBLE PRECISION NOT NULL DEFAULT 0,
        follower_count BIGINT NOT NULL DEFAULT 0,
        guarantee BOOLEAN NOT NULL DEFAULT FALSE,
        url_slug TEXT NOT NULL,
        user_id UUID NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        deleted_at TIMESTAMPTZ NULL
    )",
    "CREATE TABLE IF NOT EXISTS store_details (
        store_id UUID PRIMARY KEY REFERENCES stores(id),
        company_name TEXT NOT NULL,
        company_name_kana TEXT NULL,
        representative_name TEXT NULL,
        registration_number TEXT NULL,
        payment_method TEXT NULL,
        furigana_first TEXT NULL,
        furigana_last TEXT NULL
    )",
    "CREATE TABLE IF NOT EXISTS paybacks (
        store_id UUID PRIMARY KEY REFERENCES stores(id),
        bank_name TEXT NOT NULL,
        branch_name TEXT NULL,
        account_number TEXT NOT NULL,
        account_holder TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        store_id UUID NOT NULL REFERENCES stores(id),
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        price BIGINT NOT NULL,
        sale_price BIGINT NULL,
        top_type_id UUID NOT NULL,
        category1_id UUID NULL,
        category2_id UUID NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        deleted_at TIMESTAMPTZ NULL
    )",
    "CREATE TABLE IF NOT EXISTS variants (
        id UUID PRIMARY KEY,
        product_id UUID NOT NULL REFERENCES products(id),
        inventory BIGINT NOT NULL DEFAULT 0,
        deleted_at TIMESTAMPTZ NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        parent_id UUID NULL,
        store_id UUID NULL REFERENCES stores(id),
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        deleted_at TIMESTAMPTZ NULL
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        id UUID PRIMARY KEY,
        product_id UUID NOT NULL REFERENCES products(id),
        parent_id UUID NULL,
        rating INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        deleted_at TIMESTAMPTZ NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_products_store ON products (store_id)",
    "CREATE INDEX IF NOT EXISTS idx_variants_product ON variants (product_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_store ON orders (store_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_product ON reviews (product_id)",
];

/// Apply the required tables and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| anyhow!("Failed to apply schema: {}", e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Query building
// ---------------------------------------------------------------------------

const STORE_SELECT: &str = "SELECT s.id, s.number, s.name, s.status, s.business_form, s.plan, \
     s.margin_rate, s.follower_count, s.guarantee, s.url_slug, s.user_id, \
     s.created_at, s.updated_at, s.deleted_at, \
     CASE WHEN d.store_id IS NULL THEN NULL ELSE to_jsonb(d) END AS detail, \
     CASE WHEN pb.store_id IS NULL THEN NULL ELSE to_jsonb(pb) END AS payback, \
     CASE WHEN u.id IS NULL THEN NULL ELSE to_jsonb(u) END AS owner";

const STORE_FROM: &str = " FROM stores s \
     LEFT JOIN store_details d ON d.store_id = s.id \
     LEFT JOIN paybacks pb ON pb.store_id = s.id \
     LEFT JOIN users u ON u.id = s.user_id";

fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_range<'a, T>(builder: &mut QueryBuilder<'a, Postgres>, column: &str, range: &RangeFilter<T>)
where
    T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send + PartialOrd + Copy,
{
    if let Some(lower) = range.lower() {
        builder.push(format!(" AND {} >= ", column)).push_bind(lower);
    }
    if let Some(upper) = range.upper() {
        builder.push(format!(" AND {} <= ", column)).push_bind(upper);
    }
}

fn push_ilike(builder: &mut QueryBuilder<'_, Postgres>, column: &str, text: &str) {
    builder
        .push(format!(" AND {} ILIKE ", column))
        .push_bind(like_pattern(text));
}

fn names<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Append `AND <condition>` for every predicate
fn push_store_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[StorePredicate]) {
    for predicate in predicates {
        match predicate {
            StorePredicate::OwnerAssigned => {
                builder.push(" AND s.user_id IS NOT NULL");
            }
            StorePredicate::NotDeleted => {
                builder.push(" AND s.deleted_at IS NULL");
            }
            StorePredicate::IdIn(ids) => {
                builder
                    .push(" AND s.id = ANY(")
                    .push_bind(ids.iter().copied().collect::<Vec<Uuid>>())
                    .push(")");
            }
            StorePredicate::NumberEquals(number) => {
                builder.push(" AND s.number = ").push_bind(*number);
            }
            StorePredicate::NameContains(text) => push_ilike(builder, "s.name", text),
            StorePredicate::StatusIn(statuses) => {
                builder
                    .push(" AND s.status = ANY(")
                    .push_bind(names(statuses))
                    .push(")");
            }
            StorePredicate::PlanIn(plans) => {
                builder
                    .push(" AND s.plan = ANY(")
                    .push_bind(names(plans))
                    .push(")");
            }
            StorePredicate::BusinessFormIn(forms) => {
                builder
                    .push(" AND s.business_form = ANY(")
                    .push_bind(names(forms))
                    .push(")");
            }
            StorePredicate::Guarantee(guarantee) => {
                builder.push(" AND s.guarantee = ").push_bind(*guarantee);
            }
            StorePredicate::MarginRate(range) => push_range(builder, "s.margin_rate", range),
            StorePredicate::FollowerCount(range) => push_range(builder, "s.follower_count", range),
            StorePredicate::CreatedAt(range) => push_range(builder, "s.created_at", range),
            StorePredicate::CompanyNameContains(text) => {
                let pattern = like_pattern(text);
                builder
                    .push(" AND (d.company_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR d.company_name_kana ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            StorePredicate::RepresentativeContains(text) => {
                push_ilike(builder, "d.representative_name", text)
            }
            StorePredicate::RegistrationNumberEquals(number) => {
                builder
                    .push(" AND d.registration_number = ")
                    .push_bind(number.clone());
            }
            StorePredicate::PaymentMethodIn(methods) => {
                builder
                    .push(" AND d.payment_method = ANY(")
                    .push_bind(names(methods))
                    .push(")");
            }
            StorePredicate::OwnerDisplayIdEquals(display_id) => {
                builder
                    .push(" AND u.display_id = ")
                    .push_bind(display_id.clone());
            }
            StorePredicate::OwnerNicknameContains(text) => push_ilike(builder, "u.nickname", text),
            StorePredicate::OwnerEmailContains(text) => push_ilike(builder, "u.email", text),
            StorePredicate::AccountNumberContains(text) => {
                push_ilike(builder, "pb.account_number", text)
            }
        }
    }
}

fn push_product_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    builder.push(" WHERE p.deleted_at IS NULL");
    match filter.status {
        Some(StatusCondition::Is(status)) => {
            builder.push(" AND p.status = ").push_bind(status.to_string());
        }
        Some(StatusCondition::IsNot(status)) => {
            builder.push(" AND p.status <> ").push_bind(status.to_string());
        }
        None => {}
    }
    if filter.on_sale_only {
        builder.push(" AND p.sale_price IS NOT NULL");
    }
    if filter.sale_price.is_active() {
        builder.push(" AND p.sale_price IS NOT NULL");
        push_range(builder, "p.sale_price", &filter.sale_price);
    }
    if let Some(id) = filter.category.top_type_id {
        builder.push(" AND p.top_type_id = ").push_bind(id);
    }
    if let Some(id) = filter.category.category1_id {
        builder.push(" AND p.category1_id = ").push_bind(id);
    }
    if let Some(id) = filter.category.category2_id {
        builder.push(" AND p.category2_id = ").push_bind(id);
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Number => "s.number",
        SortField::Name => "s.name",
        SortField::CreatedAt => "s.created_at",
        SortField::FollowerCount => "s.follower_count",
        SortField::MarginRate => "s.margin_rate",
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_column<T: std::str::FromStr>(row: &PgRow, column: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw: String = row
        .try_get(column)
        .map_err(|e| anyhow!("Failed to read column {}: {}", column, e))?;
    raw.parse::<T>()
        .map_err(|e| anyhow!("Invalid value in column {}: {}", column, e))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &PgRow, column: &str) -> Result<Option<T>> {
    let value: Option<serde_json::Value> = row
        .try_get(column)
        .map_err(|e| anyhow!("Failed to read column {}: {}", column, e))?;
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| anyhow!("Failed to decode {}: {}", column, e))
}

fn row_to_store(row: &PgRow) -> Result<Store> {
    let get_err = |e: sqlx::Error| anyhow!("Failed to read store row: {}", e);

    Ok(Store {
        id: row.try_get("id").map_err(get_err)?,
        number: row.try_get("number").map_err(get_err)?,
        name: row.try_get("name").map_err(get_err)?,
        status: parse_column(row, "status")?,
        business_form: parse_column(row, "business_form")?,
        plan: parse_column(row, "plan")?,
        margin_rate: row.try_get("margin_rate").map_err(get_err)?,
        follower_count: row.try_get("follower_count").map_err(get_err)?,
        guarantee: row.try_get("guarantee").map_err(get_err)?,
        url_slug: row.try_get("url_slug").map_err(get_err)?,
        user_id: row.try_get("user_id").map_err(get_err)?,
        created_at: row.try_get("created_at").map_err(get_err)?,
        updated_at: row.try_get("updated_at").map_err(get_err)?,
        deleted_at: row.try_get("deleted_at").map_err(get_err)?,
        detail: json_column::<StoreDetail>(row, "detail")?,
        payback: json_column::<Payback>(row, "payback")?,
        owner: json_column::<Owner>(row, "owner")?,
    })
}

// ---------------------------------------------------------------------------
// PgMarketplace
// ---------------------------------------------------------------------------

/// Marketplace repositories backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PgMarketplace {
    pool: PgPool,
}

impl PgMarketplace {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and apply the schema
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| StorageError::ConnectionError {
                backend: "postgres".to_string(),
                message: e.to_string(),
            })?;
        ensure_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Load a snapshot in one transaction
    ///
    /// Existing rows with the same id are kept as they are.
    pub async fn import(&self, snapshot: &MarketplaceSnapshot) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(import_err)?;

        for store in &snapshot.stores {
            if let Some(owner) = &store.owner {
                sqlx::query(
                    "INSERT INTO users (id, display_id, nickname, email) \
                     VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
                )
                .bind(owner.id)
                .bind(owner.display_id.as_str())
                .bind(owner.nickname.as_str())
                .bind(owner.email.as_deref())
                .execute(&mut *tx)
                .await
                .map_err(import_err)?;
            }

            sqlx::query(
                "INSERT INTO stores (id, number, name, status, business_form, plan, margin_rate, \
                 follower_count, guarantee, url_slug, user_id, created_at, updated_at, deleted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(store.id)
            .bind(store.number)
            .bind(store.name.as_str())
            .bind(store.status.as_str())
            .bind(store.business_form.as_str())
            .bind(store.plan.as_str())
            .bind(store.margin_rate)
            .bind(store.follower_count)
            .bind(store.guarantee)
            .bind(store.url_slug.as_str())
            .bind(store.user_id)
            .bind(store.created_at)
            .bind(store.updated_at)
            .bind(store.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(import_err)?;

            if let Some(detail) = &store.detail {
                sqlx::query(
                    "INSERT INTO store_details (store_id, company_name, company_name_kana, \
                     representative_name, registration_number, payment_method, furigana_first, \
                     furigana_last) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     ON CONFLICT (store_id) DO NOTHING",
                )
                .bind(store.id)
                .bind(detail.company_name.as_str())
                .bind(detail.company_name_kana.as_deref())
                .bind(detail.representative_name.as_deref())
                .bind(detail.registration_number.as_deref())
                .bind(detail.payment_method.map(|m| m.as_str()))
                .bind(detail.furigana_first.as_deref())
                .bind(detail.furigana_last.as_deref())
                .execute(&mut *tx)
                .await
                .map_err(import_err)?;
            }

            if let Some(payback) = &store.payback {
                sqlx::query(
                    "INSERT INTO paybacks (store_id, bank_name, branch_name, account_number, \
                     account_holder) VALUES ($1, $2, $3, $4, $5) ON CONFLICT (store_id) DO NOTHING",
                )
                .bind(store.id)
                .bind(payback.bank_name.as_str())
                .bind(payback.branch_name.as_deref())
                .bind(payback.account_number.as_str())
                .bind(payback.account_holder.as_str())
                .execute(&mut *tx)
                .await
                .map_err(import_err)?;
            }
        }

        for product in &snapshot.products {
            sqlx::query(
                "INSERT INTO products (id, store_id, name, status, price, sale_price, top_type_id, \
                 category1_id, category2_id, created_at, updated_at, deleted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(product.id)
            .bind(product.store_id)
            .bind(product.name.as_str())
            .bind(product.status.as_str())
            .bind(product.price)
            .bind(product.sale_price)
            .bind(product.top_type_id)
            .bind(product.category1_id)
            .bind(product.category2_id)
            .bind(product.created_at)
            .bind(product.updated_at)
            .bind(product.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(import_err)?;

            for variant in &product.variants {
                sqlx::query(
                    "INSERT INTO variants (id, product_id, inventory, deleted_at) \
                     VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
                )
                .bind(variant.id)
                .bind(product.id)
                .bind(variant.inventory)
                .bind(variant.deleted_at)
                .execute(&mut *tx)
                .await
                .map_err(import_err)?;
            }
        }

        for order in &snapshot.orders {
            sqlx::query(
                "INSERT INTO orders (id, parent_id, store_id, created_at, updated_at, deleted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (id) DO NOTHING",
            )
            .bind(order.id)
            .bind(order.parent_id)
            .bind(order.store_id)
            .bind(order.created_at)
            .bind(order.updated_at)
            .bind(order.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(import_err)?;
        }

        for review in &snapshot.reviews {
            sqlx::query(
                "INSERT INTO reviews (id, product_id, parent_id, rating, created_at, updated_at, \
                 deleted_at) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (id) DO NOTHING",
            )
            .bind(review.id)
            .bind(review.product_id)
            .bind(review.parent_id)
            .bind(review.rating)
            .bind(review.created_at)
            .bind(review.updated_at)
            .bind(review.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(import_err)?;
        }

        tx.commit().await.map_err(import_err)
    }
}

fn import_err(e: sqlx::Error) -> anyhow::Error {
    anyhow!("Failed to import snapshot: {}", e)
}

#[async_trait]
impl StoreRepository for PgMarketplace {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find(&self, query: &StoreQuery) -> Result<SearchPage<Store>> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_query.push(STORE_FROM).push(" WHERE TRUE");
        push_store_predicates(&mut count_query, &query.predicates);

        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to count stores: {}", e))?;

        let mut select = QueryBuilder::<Postgres>::new(STORE_SELECT);
        select.push(STORE_FROM).push(" WHERE TRUE");
        push_store_predicates(&mut select, &query.predicates);

        let direction = match query.sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        select
            .push(format!(
                " ORDER BY {} {}, s.id ASC",
                sort_column(query.sort.field),
                direction
            ))
            .push(" LIMIT ")
            .push_bind(query.pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(query.pagination.offset as i64);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to search stores: {}", e))?;

        let items = rows.iter().map(row_to_store).collect::<Result<Vec<_>>>()?;
        let count = usize::try_from(count)
            .map_err(|e| anyhow!("Invalid store count {}: {}", count, e))?;
        Ok(SearchPage::new(items, count))
    }

    async fn owned_ids(&self) -> Result<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM stores WHERE user_id IS NOT NULL AND deleted_at IS NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to list store ids: {}", e))
    }

    async fn phonetic_matches(&self, query: &PhoneticQuery) -> Result<Vec<Uuid>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT d.store_id FROM store_details d \
             WHERE d.furigana_first IS NOT NULL AND d.furigana_last IS NOT NULL AND (FALSE",
        );
        let pattern = like_pattern(&query.needle);
        for separator in query.separators {
            builder
                .push(" OR (d.furigana_first || ")
                .push_bind(separator.to_string())
                .push(" || d.furigana_last) ILIKE ")
                .push_bind(pattern.clone());
        }
        builder.push(")");

        builder
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to match phonetic names: {}", e))
    }

    async fn url_slugs(&self) -> Result<Vec<(Uuid, String)>> {
        sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, url_slug FROM stores WHERE user_id IS NOT NULL AND deleted_at IS NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to list store slugs: {}", e))
    }
}

#[async_trait]
impl ProductRepository for PgMarketplace {
    async fn store_ids(&self, filter: &ProductFilter) -> Result<Vec<Uuid>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT p.store_id FROM products p");
        push_product_filter(&mut builder, filter);

        builder
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to select product stores: {}", e))
    }

    async fn count_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT p.store_id, COUNT(*) FROM products p");
        push_product_filter(&mut builder, filter);
        builder.push(" GROUP BY p.store_id");

        let rows: Vec<(Uuid, i64)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to count products: {}", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| StoreAggregate::new(id, count))
            .collect())
    }

    async fn latest_update_per_store(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<StoreAggregate<DateTime<Utc>>>> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT p.store_id, MAX(p.updated_at) FROM products p");
        push_product_filter(&mut builder, filter);
        builder.push(" GROUP BY p.store_id");

        let rows: Vec<(Uuid, DateTime<Utc>)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to aggregate product updates: {}", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, at)| StoreAggregate::new(id, at))
            .collect())
    }

    async fn inventory_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT p.store_id, COALESCE(SUM(v.inventory), 0)::BIGINT FROM products p \
             LEFT JOIN variants v ON v.product_id = p.id AND v.deleted_at IS NULL",
        );
        push_product_filter(&mut builder, filter);
        builder.push(" GROUP BY p.store_id");

        let rows: Vec<(Uuid, i64)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to sum inventory: {}", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, total)| StoreAggregate::new(id, total))
            .collect())
    }
}

#[async_trait]
impl OrderRepository for PgMarketplace {
    async fn store_ids(&self, filter: &OrderFilter) -> Result<Vec<Uuid>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT o.store_id FROM orders o WHERE o.deleted_at IS NULL AND o.store_id IS NOT NULL",
        );
        if filter.sub_orders_only {
            builder.push(" AND o.parent_id IS NOT NULL");
        }
        push_range(&mut builder, "o.created_at", &filter.created_at);

        builder
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to select order stores: {}", e))
    }
}

#[async_trait]
impl ReviewRepository for PgMarketplace {
    async fn rating_totals(&self, filter: &ReviewFilter) -> Result<Vec<RatingTotal>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT p.store_id, SUM(r.rating)::DOUBLE PRECISION, COUNT(*) FROM reviews r \
             JOIN products p ON p.id = r.product_id AND p.deleted_at IS NULL \
             WHERE r.deleted_at IS NULL",
        );
        if filter.top_level_only {
            builder.push(" AND r.parent_id IS NULL");
        }
        builder.push(" GROUP BY p.store_id");

        let rows: Vec<(Uuid, f64, i64)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to aggregate ratings: {}", e))?;

        Ok(rows
            .into_iter()
            .map(|(store_id, sum, count)| RatingTotal {
                store_id,
                sum,
                count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::StoreStatus;
    use std::collections::HashSet;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_store_predicates_sql() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM stores s WHERE TRUE");
        push_store_predicates(
            &mut builder,
            &[
                StorePredicate::OwnerAssigned,
                StorePredicate::IdIn(HashSet::from([Uuid::nil()])),
                StorePredicate::StatusIn(vec![StoreStatus::Active]),
                StorePredicate::FollowerCount(RangeFilter::Both(10, 20)),
            ],
        );

        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM stores s WHERE TRUE AND s.user_id IS NOT NULL \
             AND s.id = ANY($1) AND s.status = ANY($2) \
             AND s.follower_count >= $3 AND s.follower_count <= $4"
        );
    }

    #[test]
    fn test_product_filter_sql() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT p.store_id FROM products p");
        push_product_filter(
            &mut builder,
            &ProductFilter {
                on_sale_only: true,
                ..ProductFilter::with_status(StatusCondition::IsNot(
                    crate::entities::ProductStatus::Draft,
                ))
            },
        );

        assert_eq!(
            builder.sql(),
            "SELECT p.store_id FROM products p WHERE p.deleted_at IS NULL \
             AND p.status <> $1 AND p.sale_price IS NOT NULL"
        );
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        let err = PgMarketplace::connect("postgres://search@127.0.0.1:1/market")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::ConnectionError { backend, .. }) if backend == "postgres"
        ));
    }
}
