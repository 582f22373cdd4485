//! In-memory marketplace backend for testing and development

use crate::core::entity::{Data, Entity};
use crate::core::query::{SearchPage, SortDirection, SortSpec};
use crate::core::service::{
    OrderFilter, OrderRepository, PhoneticQuery, ProductFilter, ProductRepository, RatingTotal,
    ReviewFilter, ReviewRepository, StoreAggregate, StoreRepository,
};
use crate::core::store::{StorePredicate, StoreQuery};
use crate::entities::{Order, Product, Review, Store};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Serialized content of a marketplace, used to seed the in-memory backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceSnapshot {
    pub stores: Vec<Store>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub reviews: Vec<Review>,
}

impl MarketplaceSnapshot {
    /// Read a JSON snapshot file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }
}

/// In-memory marketplace
///
/// Holds the four collections read by the search engine and implements
/// every repository trait over them. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryMarketplace {
    stores: Arc<RwLock<HashMap<Uuid, Store>>>,
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
    reviews: Arc<RwLock<HashMap<Uuid, Review>>>,
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self {
            stores: Arc::new(RwLock::new(HashMap::new())),
            products: Arc::new(RwLock::new(HashMap::new())),
            orders: Arc::new(RwLock::new(HashMap::new())),
            reviews: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_snapshot(snapshot: MarketplaceSnapshot) -> Result<Self> {
        let marketplace = Self::new();
        for store in snapshot.stores {
            marketplace.add_store(store)?;
        }
        for product in snapshot.products {
            marketplace.add_product(product)?;
        }
        for order in snapshot.orders {
            marketplace.add_order(order)?;
        }
        for review in snapshot.reviews {
            marketplace.add_review(review)?;
        }
        Ok(marketplace)
    }

    /// Load a JSON snapshot file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_snapshot(MarketplaceSnapshot::from_json_file(path)?)
    }

    pub fn add_store(&self, store: Store) -> Result<()> {
        insert(&self.stores, store)
    }

    pub fn add_product(&self, product: Product) -> Result<()> {
        insert(&self.products, product)
    }

    pub fn add_order(&self, order: Order) -> Result<()> {
        insert(&self.orders, order)
    }

    pub fn add_review(&self, review: Review) -> Result<()> {
        insert(&self.reviews, review)
    }

    fn matching_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let products = self
            .products
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    fn searchable_stores(&self) -> Result<Vec<Store>> {
        let stores = self
            .stores
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(stores
            .values()
            .filter(|s| s.user_id.is_some() && !s.is_deleted())
            .cloned()
            .collect())
    }
}

impl Default for InMemoryMarketplace {
    fn default() -> Self {
        Self::new()
    }
}

fn insert<T: Entity>(collection: &RwLock<HashMap<Uuid, T>>, value: T) -> Result<()> {
    let mut items = collection
        .write()
        .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
    items.insert(value.id(), value);
    Ok(())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn opt_contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| contains_ci(h, needle))
}

fn store_matches(store: &Store, predicate: &StorePredicate) -> bool {
    let detail = store.detail.as_ref();
    let owner = store.owner.as_ref();

    match predicate {
        StorePredicate::OwnerAssigned => store.user_id.is_some(),
        StorePredicate::NotDeleted => !store.is_deleted(),
        StorePredicate::IdIn(ids) => ids.contains(&store.id),
        StorePredicate::NumberEquals(number) => store.number == *number,
        StorePredicate::NameContains(text) => contains_ci(&store.name, text),
        StorePredicate::StatusIn(statuses) => statuses.contains(&store.status),
        StorePredicate::PlanIn(plans) => plans.contains(&store.plan),
        StorePredicate::BusinessFormIn(forms) => forms.contains(&store.business_form),
        StorePredicate::Guarantee(guarantee) => store.guarantee == *guarantee,
        StorePredicate::MarginRate(range) => range.contains(&store.margin_rate),
        StorePredicate::FollowerCount(range) => range.contains(&store.follower_count),
        StorePredicate::CreatedAt(range) => range.contains(&store.created_at()),
        StorePredicate::CompanyNameContains(text) => detail.is_some_and(|d| {
            contains_ci(&d.company_name, text)
                || opt_contains_ci(d.company_name_kana.as_deref(), text)
        }),
        StorePredicate::RepresentativeContains(text) => {
            detail.is_some_and(|d| opt_contains_ci(d.representative_name.as_deref(), text))
        }
        StorePredicate::RegistrationNumberEquals(number) => {
            detail.is_some_and(|d| d.registration_number.as_deref() == Some(number.as_str()))
        }
        StorePredicate::PaymentMethodIn(methods) => detail
            .and_then(|d| d.payment_method)
            .is_some_and(|m| methods.contains(&m)),
        StorePredicate::OwnerDisplayIdEquals(display_id) => {
            owner.is_some_and(|o| o.display_id == *display_id)
        }
        StorePredicate::OwnerNicknameContains(text) => {
            owner.is_some_and(|o| contains_ci(&o.nickname, text))
        }
        StorePredicate::OwnerEmailContains(text) => {
            owner.is_some_and(|o| opt_contains_ci(o.email.as_deref(), text))
        }
        StorePredicate::AccountNumberContains(text) => store
            .payback
            .as_ref()
            .is_some_and(|p| contains_ci(&p.account_number, text)),
    }
}

/// Order by the sort field, then by id ascending
fn compare_stores(a: &Store, b: &Store, sort: &SortSpec) -> Ordering {
    let field = sort.field.as_str();
    let primary = match (a.field_value(field), b.field_value(field)) {
        (Some(left), Some(right)) => left.compare(&right).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    };
    let primary = match sort.direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Fold `(key, value)` pairs into one aggregate per key
fn aggregate<K, V, F>(rows: impl IntoIterator<Item = (K, V)>, fold: F) -> HashMap<K, V>
where
    K: Eq + Hash,
    F: Fn(V, V) -> V,
    V: Copy,
{
    let mut out: HashMap<K, V> = HashMap::new();
    for (key, value) in rows {
        let merged = match out.get(&key) {
            Some(existing) => fold(*existing, value),
            None => value,
        };
        out.insert(key, merged);
    }
    out
}

#[async_trait]
impl StoreRepository for InMemoryMarketplace {
    fn backend_name(&self) -> &'static str {
        "in_memory"
    }

    async fn find(&self, query: &StoreQuery) -> Result<SearchPage<Store>> {
        let mut matched: Vec<Store> = {
            let stores = self
                .stores
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

            stores
                .values()
                .filter(|s| query.predicates.iter().all(|p| store_matches(s, p)))
                .cloned()
                .collect()
        };

        matched.sort_by(|a, b| compare_stores(a, b, &query.sort));
        let count = matched.len();

        Ok(SearchPage::new(query.pagination.slice(matched), count))
    }

    async fn owned_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.searchable_stores()?.into_iter().map(|s| s.id).collect())
    }

    async fn phonetic_matches(&self, query: &PhoneticQuery) -> Result<Vec<Uuid>> {
        let stores = self
            .stores
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(stores
            .values()
            .filter(|s| {
                s.detail
                    .as_ref()
                    .and_then(|d| d.furigana())
                    .is_some_and(|(given, family)| query.matches(given, family))
            })
            .map(|s| s.id)
            .collect())
    }

    async fn url_slugs(&self) -> Result<Vec<(Uuid, String)>> {
        Ok(self
            .searchable_stores()?
            .into_iter()
            .map(|s| (s.id, s.url_slug))
            .collect())
    }
}

#[async_trait]
impl ProductRepository for InMemoryMarketplace {
    async fn store_ids(&self, filter: &ProductFilter) -> Result<Vec<Uuid>> {
        Ok(self
            .matching_products(filter)?
            .into_iter()
            .map(|p| p.store_id)
            .collect())
    }

    async fn count_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>> {
        let rows = self
            .matching_products(filter)?
            .into_iter()
            .map(|p| (p.store_id, 1i64));

        Ok(aggregate(rows, |a, b| a + b)
            .into_iter()
            .map(|(id, count)| StoreAggregate::new(id, count))
            .collect())
    }

    async fn latest_update_per_store(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<StoreAggregate<DateTime<Utc>>>> {
        let rows = self
            .matching_products(filter)?
            .into_iter()
            .map(|p| (p.store_id, p.updated_at()));

        Ok(aggregate(rows, |a, b| a.max(b))
            .into_iter()
            .map(|(id, at)| StoreAggregate::new(id, at))
            .collect())
    }

    async fn inventory_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>> {
        let rows = self
            .matching_products(filter)?
            .into_iter()
            .map(|p| (p.store_id, p.inventory()));

        Ok(aggregate(rows, |a, b| a + b)
            .into_iter()
            .map(|(id, total)| StoreAggregate::new(id, total))
            .collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryMarketplace {
    async fn store_ids(&self, filter: &OrderFilter) -> Result<Vec<Uuid>> {
        let orders = self
            .orders
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(orders
            .values()
            .filter(|o| filter.matches(o))
            .filter_map(|o| o.store_id)
            .collect())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryMarketplace {
    async fn rating_totals(&self, filter: &ReviewFilter) -> Result<Vec<RatingTotal>> {
        let owners: HashMap<Uuid, Uuid> = {
            let products = self
                .products
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
            products
                .values()
                .filter(|p| !p.is_deleted())
                .map(|p| (p.id, p.store_id))
                .collect()
        };

        let reviews = self
            .reviews
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let rows = reviews
            .values()
            .filter(|r| filter.matches(r))
            .filter_map(|r| {
                owners
                    .get(&r.product_id)
                    .map(|store_id| (*store_id, (f64::from(r.rating), 1i64)))
            });

        Ok(aggregate(rows, |a, b| (a.0 + b.0, a.1 + b.1))
            .into_iter()
            .map(|(store_id, (sum, count))| RatingTotal {
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
    use crate::core::query::{Pagination, SortField};
    use crate::core::range::RangeFilter;
    use crate::core::service::StatusCondition;
    use crate::entities::{
        BusinessForm, Owner, PlanTier, ProductStatus, StoreDetail, StoreStatus, Variant,
    };

    fn store(number: i64, name: &str) -> Store {
        let now = Utc::now();
        Store {
            id: Uuid::new_v4(),
            number,
            name: name.to_string(),
            status: StoreStatus::Active,
            business_form: BusinessForm::Corporation,
            plan: PlanTier::Standard,
            margin_rate: 12.5,
            follower_count: number * 10,
            guarantee: true,
            url_slug: name.to_lowercase().replace(' ', "-"),
            user_id: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            detail: None,
            payback: None,
            owner: None,
        }
    }

    fn product(store_id: Uuid, status: ProductStatus, inventory: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            store_id,
            name: "Mug".to_string(),
            status,
            price: 1200,
            sale_price: None,
            top_type_id: Uuid::nil(),
            category1_id: None,
            category2_id: None,
            variants: vec![Variant {
                id: Uuid::new_v4(),
                inventory,
                deleted_at: None,
            }],
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_paginates() {
        let market = InMemoryMarketplace::new();
        for (number, name) in [(1, "Alpha Tea"), (2, "Beta Tea"), (3, "Gamma Coffee")] {
            market.add_store(store(number, name)).unwrap();
        }

        let mut query = StoreQuery::new();
        query
            .filter(StorePredicate::NameContains("tea".to_string()))
            .sorted(SortSpec::new(SortField::FollowerCount, SortDirection::Desc))
            .paginate(Pagination::new(1, 0));

        let page = market.find(&query).await.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Beta Tea");
    }

    #[tokio::test]
    async fn test_one_hop_predicates() {
        let market = InMemoryMarketplace::new();
        let mut with_relations = store(1, "Kiln");
        with_relations.detail = Some(StoreDetail {
            company_name: "Kiln Works".to_string(),
            company_name_kana: Some("キルンワークス".to_string()),
            representative_name: Some("Hanako Sato".to_string()),
            registration_number: Some("T1234".to_string()),
            payment_method: None,
            furigana_first: Some("はなこ".to_string()),
            furigana_last: Some("さとう".to_string()),
        });
        with_relations.owner = Some(Owner {
            id: Uuid::new_v4(),
            display_id: "kiln".to_string(),
            nickname: "Kiln Owner".to_string(),
            email: Some("owner@kiln.example".to_string()),
        });
        market.add_store(with_relations).unwrap();
        market.add_store(store(2, "Bare")).unwrap();

        for predicate in [
            StorePredicate::CompanyNameContains("キルン".to_string()),
            StorePredicate::RepresentativeContains("sato".to_string()),
            StorePredicate::RegistrationNumberEquals("T1234".to_string()),
            StorePredicate::OwnerDisplayIdEquals("kiln".to_string()),
            StorePredicate::OwnerEmailContains("KILN.EXAMPLE".to_string()),
        ] {
            let mut query = StoreQuery::new();
            query.filter(predicate.clone());
            let page = market.find(&query).await.unwrap();
            assert_eq!(page.count, 1, "predicate {:?}", predicate);
        }

        let mut query = StoreQuery::new();
        query.filter(StorePredicate::PaymentMethodIn(vec![
            crate::entities::PaymentMethod::Invoice,
        ]));
        assert_eq!(market.find(&query).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_owned_ids_excludes_placeholders_and_deleted() {
        let market = InMemoryMarketplace::new();
        let owned = store(1, "Owned");
        let mut placeholder = store(2, "Placeholder");
        placeholder.user_id = None;
        let mut deleted = store(3, "Deleted");
        deleted.deleted_at = Some(Utc::now());

        let owned_id = owned.id;
        for s in [owned, placeholder, deleted] {
            market.add_store(s).unwrap();
        }

        assert_eq!(market.owned_ids().await.unwrap(), vec![owned_id]);
    }

    #[tokio::test]
    async fn test_product_aggregates() {
        let market = InMemoryMarketplace::new();
        let shop = Uuid::new_v4();
        market
            .add_product(product(shop, ProductStatus::Published, 4))
            .unwrap();
        market
            .add_product(product(shop, ProductStatus::Published, 3))
            .unwrap();
        market
            .add_product(product(shop, ProductStatus::Draft, 100))
            .unwrap();

        let published = ProductFilter::with_status(StatusCondition::Is(ProductStatus::Published));
        assert_eq!(
            market.count_per_store(&published).await.unwrap(),
            vec![StoreAggregate::new(shop, 2)]
        );
        assert_eq!(
            market.inventory_per_store(&published).await.unwrap(),
            vec![StoreAggregate::new(shop, 7)]
        );
        assert_eq!(
            ProductRepository::store_ids(&market, &published)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_rating_totals_group_by_product_store() {
        let market = InMemoryMarketplace::new();
        let shop = Uuid::new_v4();
        let item = product(shop, ProductStatus::Published, 1);
        let product_id = item.id;
        market.add_product(item).unwrap();

        let now = Utc::now();
        for (rating, parent_id) in [(5, None), (3, None), (1, Some(Uuid::new_v4()))] {
            market
                .add_review(Review {
                    id: Uuid::new_v4(),
                    product_id,
                    parent_id,
                    rating,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                })
                .unwrap();
        }

        let totals = market
            .rating_totals(&ReviewFilter {
                top_level_only: true,
            })
            .await
            .unwrap();
        assert_eq!(
            totals,
            vec![RatingTotal {
                store_id: shop,
                sum: 8.0,
                count: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_rating_totals_skip_deleted_products() {
        let market = InMemoryMarketplace::new();
        let mut item = product(Uuid::new_v4(), ProductStatus::Published, 1);
        item.deleted_at = Some(Utc::now());
        let product_id = item.id;
        market.add_product(item).unwrap();

        let now = Utc::now();
        market
            .add_review(Review {
                id: Uuid::new_v4(),
                product_id,
                parent_id: None,
                rating: 5,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .unwrap();

        let totals = market
            .rating_totals(&ReviewFilter::default())
            .await
            .unwrap();
        assert!(totals.is_empty());
    }

    #[tokio::test]
    async fn test_order_store_ids_skip_parents() {
        let market = InMemoryMarketplace::new();
        let shop = Uuid::new_v4();
        let now = Utc::now();
        let parent = Order {
            id: Uuid::new_v4(),
            parent_id: None,
            store_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let sub = Order {
            id: Uuid::new_v4(),
            parent_id: Some(parent.id),
            store_id: Some(shop),
            ..parent.clone()
        };
        market.add_order(parent).unwrap();
        market.add_order(sub).unwrap();

        let filter = OrderFilter {
            sub_orders_only: true,
            created_at: RangeFilter::classify(Some(now - chrono::Duration::days(1)), None),
        };
        assert_eq!(
            OrderRepository::store_ids(&market, &filter).await.unwrap(),
            vec![shop]
        );
    }

    #[test]
    fn test_snapshot_from_json() {
        let snapshot: MarketplaceSnapshot = serde_json::from_str(r#"{ "stores": [] }"#).unwrap();
        let market = InMemoryMarketplace::from_snapshot(snapshot).unwrap();
        assert!(market.searchable_stores().unwrap().is_empty());
    }

    #[test]
    fn test_from_json_file_reports_path() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json").unwrap();

        let err = InMemoryMarketplace::from_json_file(file.path())
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to parse snapshot"));
        assert!(InMemoryMarketplace::from_json_file("/nonexistent/snapshot.json").is_err());
    }
}
