//! SQLite-backed document store.
//!
//! Documents live in a single `documents` table with the body stored as JSON.
//! Body fields are reached with `json_extract`, so this backend is SQLite only.
//! Search uses `lower(..) LIKE '%term%'`; SQLite's `lower` folds ASCII letters
//! only, so the term is folded the same way. Unique keys are backed by a
//! partial unique index on `json_extract(body, '$.nameKey')`.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, SqlErr, Statement, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};
use serde_json::{Map, Value};

use api_types::pagination::SortOrder;

use crate::{
    query::{Comparison, Predicate, QuerySpec},
    util::{format_timestamp, now, parse_timestamp},
};

use super::{
    ChangeKind, Document, DocumentStore, IncrementOutcome, StoreError, Subscription,
    feed::ChangeFeed,
};

pub(crate) mod documents {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "documents")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub collection: String,
        pub user_id: String,
        pub body: Json,
        pub created_at: String,
        pub updated_at: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl TryFrom<documents::Model> for Document {
    type Error = StoreError;

    fn try_from(model: documents::Model) -> Result<Self, Self::Error> {
        let corrupt = |reason: &str| StoreError::Corrupt {
            id: model.id.clone(),
            reason: reason.to_string(),
        };
        let created_at = parse_timestamp(&model.created_at).ok_or_else(|| corrupt("created_at"))?;
        let updated_at = parse_timestamp(&model.updated_at).ok_or_else(|| corrupt("updated_at"))?;
        let Value::Object(fields) = model.body else {
            return Err(corrupt("body is not an object"));
        };
        Ok(Document {
            id: model.id,
            user_id: model.user_id,
            created_at,
            updated_at,
            fields,
        })
    }
}

/// Store over a sea-orm connection. Cloning shares the connection and the
/// change feed.
#[derive(Clone, Debug)]
pub struct SqlStore {
    db: DatabaseConnection,
    feed: Arc<ChangeFeed>,
}

impl SqlStore {
    /// Wraps a connection whose schema is already migrated.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            feed: Arc::new(ChangeFeed::default()),
        }
    }

    fn select(collection: &str) -> Select<documents::Entity> {
        documents::Entity::find().filter(documents::Column::Collection.eq(collection))
    }

    fn filtered(
        collection: &str,
        predicates: &[Predicate],
    ) -> Result<Select<documents::Entity>, StoreError> {
        let mut select = Self::select(collection);
        for predicate in predicates {
            select = select.filter(predicate_expr(predicate)?);
        }
        Ok(select)
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Self::select(collection)
            .filter(documents::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .map(Document::try_from)
            .transpose()
    }
}

/// Unique index violations become [`StoreError::Conflict`].
fn write_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
        _ => StoreError::Database(err),
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

/// Column or JSON body expression a field name resolves to.
fn field_expr(field: &str) -> SimpleExpr {
    match field {
        "id" => Expr::col(documents::Column::Id).into(),
        "userId" => Expr::col(documents::Column::UserId).into(),
        "createdAt" => Expr::col(documents::Column::CreatedAt).into(),
        "updatedAt" => Expr::col(documents::Column::UpdatedAt).into(),
        other => Expr::cust_with_values("json_extract(body, ?)", [json_path(other)]),
    }
}

fn sql_value(value: &Value) -> Result<sea_orm::Value, StoreError> {
    match value {
        Value::Bool(b) => Ok(sea_orm::Value::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(sea_orm::Value::from)
            .or_else(|| n.as_f64().map(sea_orm::Value::from))
            .ok_or_else(|| StoreError::Unsupported(format!("number {n}"))),
        Value::String(s) => Ok(sea_orm::Value::from(s.clone())),
        other => Err(StoreError::Unsupported(format!("value {other}"))),
    }
}

/// Escapes `LIKE` wildcards so the term matches literally. Only ASCII is
/// lowercased, as SQLite's `lower` leaves other letters alone.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.to_ascii_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn predicate_expr(predicate: &Predicate) -> Result<SimpleExpr, StoreError> {
    match predicate {
        Predicate::Compare { field, op, value } if value.is_null() => {
            let expr = Expr::expr(field_expr(field));
            match op {
                Comparison::Eq => Ok(expr.is_null()),
                Comparison::Ne => Ok(expr.is_not_null()),
                _ => Err(StoreError::Unsupported(format!(
                    "ordering comparison against null on '{field}'"
                ))),
            }
        }
        Predicate::Compare { field, op, value } => {
            let expr = Expr::expr(field_expr(field));
            let value = sql_value(value)?;
            Ok(match op {
                Comparison::Eq => expr.eq(value),
                Comparison::Ne => expr.ne(value),
                Comparison::Lt => expr.lt(value),
                Comparison::Lte => expr.lte(value),
                Comparison::Gt => expr.gt(value),
                Comparison::Gte => expr.gte(value),
            })
        }
        Predicate::In { field, values } => {
            let values = values
                .iter()
                .map(sql_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::expr(field_expr(field)).is_in(values))
        }
        Predicate::Contains { field, term } => Ok(Expr::expr(Func::lower(field_expr(field)))
            .like(LikeExpr::new(like_pattern(term)).escape('\\'))),
    }
}

#[async_trait]
impl DocumentStore for SqlStore {
    async fn create(
        &self,
        collection: &str,
        user_id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let at = now();
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: at,
            updated_at: at,
            fields,
        };
        documents::ActiveModel {
            id: ActiveValue::Set(doc.id.clone()),
            collection: ActiveValue::Set(collection.to_string()),
            user_id: ActiveValue::Set(doc.user_id.clone()),
            body: ActiveValue::Set(Value::Object(doc.fields.clone())),
            created_at: ActiveValue::Set(format_timestamp(at)),
            updated_at: ActiveValue::Set(format_timestamp(at)),
        }
        .insert(&self.db)
        .await
        .map_err(write_error)?;

        tracing::debug!(collection, id = %doc.id, "document created");
        self.feed.publish(collection, ChangeKind::Created, doc.clone());
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.find(collection, id).await
    }

    async fn query(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        let mut select = Self::filtered(collection, &spec.predicates)?;
        if let Some(sort) = &spec.sort {
            let order = match sort.order {
                SortOrder::Asc => Order::Asc,
                SortOrder::Desc => Order::Desc,
            };
            select = select.order_by(field_expr(&sort.field), order);
        }
        // SQLite rejects OFFSET without LIMIT; paged queries always carry both.
        if let Some(limit) = spec.limit {
            select = select.limit(limit);
            if spec.offset > 0 {
                select = select.offset(spec.offset);
            }
        }

        select
            .all(&self.db)
            .await?
            .into_iter()
            .map(Document::try_from)
            .collect()
    }

    async fn count(&self, collection: &str, predicates: &[Predicate]) -> Result<u64, StoreError> {
        Ok(Self::filtered(collection, predicates)?
            .count(&self.db)
            .await?)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let db_tx = self.db.begin().await?;
        let Some(model) = Self::select(collection)
            .filter(documents::Column::Id.eq(id))
            .one(&db_tx)
            .await?
        else {
            return Ok(None);
        };

        let mut doc = Document::try_from(model.clone())?;
        doc.fields.extend(changes);
        doc.updated_at = now();

        let mut active: documents::ActiveModel = model.into();
        active.body = ActiveValue::Set(Value::Object(doc.fields.clone()));
        active.updated_at = ActiveValue::Set(format_timestamp(doc.updated_at));
        active.update(&db_tx).await.map_err(write_error)?;
        db_tx.commit().await?;

        tracing::debug!(collection, id, "document updated");
        self.feed.publish(collection, ChangeKind::Updated, doc.clone());
        Ok(Some(doc))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let Some(doc) = self.find(collection, id).await? else {
            return Ok(false);
        };
        let result = documents::Entity::delete_many()
            .filter(documents::Column::Collection.eq(collection))
            .filter(documents::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(false);
        }

        tracing::debug!(collection, id, "document deleted");
        self.feed.publish(collection, ChangeKind::Deleted, doc);
        Ok(true)
    }

    /// Single conditional `UPDATE`, so concurrent callers cannot both pass the
    /// floor check against the same stale value.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<IncrementOutcome, StoreError> {
        let path = json_path(field);
        let mut sql = String::from(
            "UPDATE documents \
             SET body = json_set(body, ?, COALESCE(json_extract(body, ?), 0) + ?), updated_at = ? \
             WHERE collection = ? AND id = ?",
        );
        let mut values: Vec<sea_orm::Value> = vec![
            path.clone().into(),
            path.clone().into(),
            delta.into(),
            format_timestamp(now()).into(),
            collection.into(),
            id.into(),
        ];
        if let Some(floor) = floor {
            sql.push_str(" AND COALESCE(json_extract(body, ?), 0) + ? >= ?");
            values.extend([path.into(), delta.into(), floor.into()]);
        }

        let backend = self.db.get_database_backend();
        let result = self
            .db
            .execute(Statement::from_sql_and_values(backend, sql, values))
            .await?;

        let Some(doc) = self.find(collection, id).await? else {
            return Ok(IncrementOutcome::Missing);
        };
        if result.rows_affected() == 0 {
            return Ok(IncrementOutcome::Rejected(doc));
        }

        tracing::debug!(collection, id, field, delta, "document incremented");
        self.feed
            .publish(collection, ChangeKind::Updated, doc.clone());
        Ok(IncrementOutcome::Applied(doc))
    }

    fn listen(&self, collection: &str, predicates: Vec<Predicate>) -> Subscription {
        self.feed.subscribe(collection, predicates)
    }
}
