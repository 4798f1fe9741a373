//! In-memory stand-in for the hosted service.
//!
//! Tables hold JSON rows, deletes cascade along registered foreign keys, and
//! magic links are completed by calling [`FakeBackend::issue_code`]. Failures can
//! be injected per operation and table. Row-level security is not emulated.

use super::{
    pkce, AuthApi, AuthEvent, Backend, Database, Embed, Filter, Join, MagicLink, Select,
    SessionEvents,
};
use crate::error::RemoteError;
use crate::types::{Session, User};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOp {
    Select,
    Insert,
    Update,
    Delete,
}

impl FakeOp {
    fn as_str(&self) -> &'static str {
        match self {
            FakeOp::Select => "select",
            FakeOp::Insert => "insert",
            FakeOp::Update => "update",
            FakeOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone)]
struct FakeError {
    status: u16,
    code: Option<String>,
    message: String,
}

impl FakeError {
    fn to_remote(&self) -> RemoteError {
        RemoteError::Api {
            status: self.status,
            code: self.code.clone(),
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Cascade {
    child: String,
    foreign_key: String,
    parent: String,
}

#[derive(Debug, Default)]
struct FakeState {
    tables: HashMap<String, Vec<Row>>,
    cascades: Vec<Cascade>,
    failures: Vec<(FakeOp, String, FakeError)>,
    auth_failure: Option<FakeError>,
    users_by_email: HashMap<String, User>,
    users_by_token: HashMap<String, User>,
    pending_links: HashMap<String, String>,
    codes: HashMap<String, (User, String)>,
    calls: Vec<String>,
}

impl FakeState {
    fn begin(&mut self, op: FakeOp, table: &str) -> Result<(), RemoteError> {
        self.calls.push(format!("{} {}", op.as_str(), table));
        match self
            .failures
            .iter()
            .find(|(failing_op, failing_table, _)| *failing_op == op && failing_table == table)
        {
            Some((_, _, error)) => Err(error.to_remote()),
            None => Ok(()),
        }
    }

    fn begin_auth(&mut self, op: &str) -> Result<(), RemoteError> {
        self.calls.push(format!("auth {}", op));
        match &self.auth_failure {
            Some(error) => Err(error.to_remote()),
            None => Ok(()),
        }
    }

    fn table(&self, table: &str) -> Result<&Vec<Row>, RemoteError> {
        self.tables.get(table).ok_or_else(|| undefined_table(table))
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut Vec<Row>, RemoteError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| undefined_table(table))
    }

    fn project(&self, row: &Row, query: &Select) -> Value {
        let mut out = pick_columns(row, &query.columns);
        for embed in &query.embeds {
            out.insert(embed.relation.clone(), self.embedded(row, embed));
        }
        Value::Object(out)
    }

    fn embedded(&self, row: &Row, embed: &Embed) -> Value {
        let related = self
            .tables
            .get(&embed.relation)
            .map(Vec::as_slice)
            .unwrap_or_default();

        match &embed.join {
            Join::ToOne { local_key } => {
                let Some(key) = row.get(local_key).filter(|v| !v.is_null()) else {
                    return Value::Null;
                };
                related
                    .iter()
                    .find(|r| r.get("id").map(value_text) == Some(value_text(key)))
                    .map(|r| Value::Object(pick_columns(r, &embed.columns)))
                    .unwrap_or(Value::Null)
            }
            Join::ToMany { foreign_key } => {
                let Some(id) = row.get("id") else {
                    return Value::Array(Vec::new());
                };
                Value::Array(
                    related
                        .iter()
                        .filter(|r| r.get(foreign_key).map(value_text) == Some(value_text(id)))
                        .map(|r| Value::Object(pick_columns(r, &embed.columns)))
                        .collect(),
                )
            }
        }
    }

    /// Reject rows whose registered foreign key points at a missing parent.
    fn check_foreign_keys(&self, table: &str, rows: &[Row]) -> Result<(), RemoteError> {
        for cascade in self.cascades.iter().filter(|c| c.child == table) {
            let parents = self
                .tables
                .get(&cascade.parent)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for row in rows {
                let Some(key) = row.get(&cascade.foreign_key).filter(|v| !v.is_null()) else {
                    continue;
                };
                let key = value_text(key);
                if !parents
                    .iter()
                    .any(|p| p.get("id").map(value_text).as_deref() == Some(key.as_str()))
                {
                    return Err(RemoteError::Api {
                        status: 409,
                        code: Some("23503".to_string()),
                        message: format!(
                            "insert or update on table \"{}\" violates foreign key \
                             constraint \"{}_{}_fkey\"",
                            table, table, cascade.foreign_key
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    fn cascade_delete(&mut self, parent: &str, ids: &[String]) {
        let children: Vec<Cascade> = self
            .cascades
            .iter()
            .filter(|c| c.parent == parent)
            .cloned()
            .collect();

        for cascade in children {
            let Some(rows) = self.tables.get_mut(&cascade.child) else {
                continue;
            };
            let (removed, kept): (Vec<Row>, Vec<Row>) = rows.drain(..).partition(|row| {
                row.get(&cascade.foreign_key)
                    .map(|v| ids.contains(&value_text(v)))
                    .unwrap_or(false)
            });
            *rows = kept;

            let removed_ids: Vec<String> = removed
                .iter()
                .filter_map(|r| r.get("id").map(value_text))
                .collect();
            if !removed_ids.is_empty() {
                self.cascade_delete(&cascade.child, &removed_ids);
            }
        }
    }
}

/// In-memory [`Backend`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    events: SessionEvents,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables used by the recipe flows, with child rows cascading on recipe delete.
    pub fn with_recipe_schema() -> Self {
        let backend = Self::new();
        for table in ["categories", "recipes", "ingredients", "instructions"] {
            backend.create_table(table);
        }
        backend.add_cascade("ingredients", "recipe_id", "recipes");
        backend.add_cascade("instructions", "recipe_id", "recipes");
        backend
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_table(&self, table: &str) {
        self.lock().tables.entry(table.to_string()).or_default();
    }

    pub fn add_cascade(&self, child: &str, foreign_key: &str, parent: &str) {
        self.lock().cascades.push(Cascade {
            child: child.to_string(),
            foreign_key: foreign_key.to_string(),
            parent: parent.to_string(),
        });
    }

    /// Insert rows directly, bypassing failure injection and the call log.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut state = self.lock();
        let target = state.tables.entry(table.to_string()).or_default();
        target.extend(rows.into_iter().filter_map(|row| match row {
            Value::Object(map) => Some(with_defaults(map)),
            _ => None,
        }));
    }

    /// Current rows of `table` in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock()
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Make every `op` against `table` fail with `message`.
    pub fn fail_on(&self, op: FakeOp, table: &str, message: &str) {
        self.fail_on_with_code(op, table, None, message);
    }

    pub fn fail_on_with_code(&self, op: FakeOp, table: &str, code: Option<&str>, message: &str) {
        self.lock().failures.push((
            op,
            table.to_string(),
            FakeError {
                status: 400,
                code: code.map(str::to_string),
                message: message.to_string(),
            },
        ));
    }

    /// Make every auth call fail with `message`.
    pub fn fail_auth(&self, message: &str) {
        self.lock().auth_failure = Some(FakeError {
            status: 503,
            code: None,
            message: message.to_string(),
        });
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failures.clear();
        state.auth_failure = None;
    }

    /// Operations performed so far, e.g. `"delete ingredients"` or `"auth otp"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Simulate following the emailed link: returns the code that the callback
    /// receives, or `None` if no link was requested for `email`.
    pub fn issue_code(&self, email: &str) -> Option<String> {
        let mut state = self.lock();
        let verifier = state.pending_links.remove(email)?;
        let user = state
            .users_by_email
            .entry(email.to_string())
            .or_insert_with(|| new_user(email))
            .clone();
        let code = Uuid::new_v4().simple().to_string();
        state.codes.insert(code.clone(), (user, verifier));
        Some(code)
    }

    /// Create (or reuse) a user and return it with a valid access token.
    pub fn sign_in_user(&self, email: &str) -> (User, String) {
        let mut state = self.lock();
        let user = state
            .users_by_email
            .entry(email.to_string())
            .or_insert_with(|| new_user(email))
            .clone();
        let token = Uuid::new_v4().simple().to_string();
        state.users_by_token.insert(token.clone(), user.clone());
        (user, token)
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn sign_in_with_magic_link(
        &self,
        email: &str,
        _redirect_url: &str,
    ) -> Result<MagicLink, RemoteError> {
        let mut state = self.lock();
        state.begin_auth("otp")?;
        let code_verifier = pkce::generate_verifier();
        state
            .pending_links
            .insert(email.to_string(), code_verifier.clone());
        Ok(MagicLink { code_verifier })
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, RemoteError> {
        let mut state = self.lock();
        state.begin_auth("get_user")?;
        Ok(state.users_by_token.get(access_token).cloned())
    }

    async fn get_session(
        &self,
        access_token: Option<&str>,
    ) -> Result<Option<Session>, RemoteError> {
        let mut state = self.lock();
        state.begin_auth("get_session")?;
        Ok(access_token.and_then(|token| {
            state.users_by_token.get(token).map(|user| Session {
                access_token: token.to_string(),
                refresh_token: None,
                expires_in: None,
                user: user.clone(),
            })
        }))
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Session, RemoteError> {
        let session = {
            let mut state = self.lock();
            state.begin_auth("exchange_code")?;

            let (user, expected_verifier) = state.codes.remove(code).ok_or_else(|| {
                RemoteError::Api {
                    status: 404,
                    code: Some("flow_state_not_found".to_string()),
                    message: "invalid flow state, no valid flow state found".to_string(),
                }
            })?;
            if expected_verifier != code_verifier {
                return Err(RemoteError::Api {
                    status: 400,
                    code: Some("bad_code_verifier".to_string()),
                    message: "code challenge does not match previously saved code verifier"
                        .to_string(),
                });
            }

            let access_token = Uuid::new_v4().simple().to_string();
            state
                .users_by_token
                .insert(access_token.clone(), user.clone());
            Session {
                access_token,
                refresh_token: Some(Uuid::new_v4().simple().to_string()),
                expires_in: Some(3600),
                user,
            }
        };

        self.events.publish(AuthEvent::SignedIn {
            user_id: session.user.id,
        });
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), RemoteError> {
        {
            let mut state = self.lock();
            state.begin_auth("logout")?;
            state.users_by_token.remove(access_token);
        }
        self.events.publish(AuthEvent::SignedOut);
        Ok(())
    }
}

impl Backend for FakeBackend {
    fn auth(&self) -> &dyn AuthApi {
        self
    }

    fn database(&self, _access_token: Option<&str>) -> Box<dyn Database> {
        Box::new(self.clone())
    }

    fn events(&self) -> &SessionEvents {
        &self.events
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[async_trait]
impl Database for FakeBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, RemoteError> {
        let mut state = self.lock();
        state.begin(FakeOp::Select, &query.table)?;

        let mut rows: Vec<&Row> = state
            .table(&query.table)?
            .iter()
            .filter(|row| matches_all(row, &query.filters))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows.into_iter().map(|row| state.project(row, query)).collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
        let mut state = self.lock();
        state.begin(FakeOp::Insert, table)?;

        let new_rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(with_defaults(map)),
                other => Err(RemoteError::Decode(format!(
                    "insert expects objects, got {}",
                    other
                ))),
            })
            .collect::<Result<Vec<Row>, _>>()?;

        state.check_foreign_keys(table, &new_rows)?;
        state.table_mut(table)?.extend(new_rows.iter().cloned());
        Ok(new_rows.into_iter().map(Value::Object).collect())
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, RemoteError> {
        let mut state = self.lock();
        state.begin(FakeOp::Update, table)?;

        let Value::Object(patch) = patch else {
            return Err(RemoteError::Decode("update patch must be an object".to_string()));
        };

        let mut updated = Vec::new();
        for row in state
            .table_mut(table)?
            .iter_mut()
            .filter(|row| matches_all(row, filters))
        {
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, RemoteError> {
        let mut state = self.lock();
        state.begin(FakeOp::Delete, table)?;

        let rows = state.table_mut(table)?;
        let (removed, kept): (Vec<Row>, Vec<Row>) =
            rows.drain(..).partition(|row| matches_all(row, filters));
        *rows = kept;

        let ids: Vec<String> = removed
            .iter()
            .filter_map(|r| r.get("id").map(value_text))
            .collect();
        state.cascade_delete(table, &ids);

        Ok(removed.into_iter().map(Value::Object).collect())
    }
}

fn undefined_table(table: &str) -> RemoteError {
    RemoteError::Api {
        status: 404,
        code: Some("42P01".to_string()),
        message: format!("relation \"{}\" does not exist", table),
    }
}

fn new_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        created_at: Some(Utc::now()),
    }
}

/// Fill the columns the database would generate.
fn with_defaults(mut row: Row) -> Row {
    row.entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    row.entry("created_at")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    row
}

fn pick_columns(row: &Row, columns: &[String]) -> Row {
    if columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Text form used for equality filters, matching how PostgREST compares `eq.` values.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        row.get(&filter.column)
            .map(|value| value_text(value) == filter.value)
            .unwrap_or(false)
    })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        // Nulls sort last in ascending order, as in PostgreSQL.
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_table_reports_missing_relation() {
        let backend = FakeBackend::new();
        let err = backend
            .select(&Select::from("_health_check_dummy"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("42P01"));
        assert!(err
            .to_string()
            .contains(r#"relation "_health_check_dummy" does not exist"#));
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_limits() {
        let backend = FakeBackend::new();
        backend.seed(
            "categories",
            vec![
                json!({"name": "soup", "color": "blue"}),
                json!({"name": "bread", "color": "brown"}),
                json!({"name": "cake", "color": "pink"}),
            ],
        );

        let rows = backend
            .select(&Select::from("categories").order("name", true).limit(2))
            .await
            .unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["bread", "cake"]);

        let rows = backend
            .select(&Select::from("categories").eq("color", "pink"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "cake");
    }

    #[tokio::test]
    async fn test_embeds_follow_join_direction() {
        let backend = FakeBackend::with_recipe_schema();
        backend.seed(
            "categories",
            vec![json!({"id": "c1", "name": "dessert", "color": "pink"})],
        );
        backend.seed(
            "recipes",
            vec![json!({"id": "r1", "title": "pie", "category_id": "c1"})],
        );
        backend.seed(
            "ingredients",
            vec![
                json!({"recipe_id": "r1", "name": "apple", "order_index": 0}),
                json!({"recipe_id": "r2", "name": "pear", "order_index": 0}),
            ],
        );

        let query = Select::from("recipes")
            .columns(&["id", "title"])
            .embed(Embed::one("categories", "category_id", &["name"]))
            .embed(Embed::many("ingredients", "recipe_id", &["name"]));
        let rows = backend.select(&query).await.unwrap();

        assert_eq!(
            rows[0],
            json!({
                "id": "r1",
                "title": "pie",
                "categories": {"name": "dessert"},
                "ingredients": [{"name": "apple"}],
            })
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_to_children() {
        let backend = FakeBackend::with_recipe_schema();
        backend.seed("recipes", vec![json!({"id": "r1"}), json!({"id": "r2"})]);
        backend.seed(
            "ingredients",
            vec![
                json!({"recipe_id": "r1", "name": "a"}),
                json!({"recipe_id": "r2", "name": "b"}),
            ],
        );

        let removed = backend
            .delete("recipes", &[Filter::eq("id", "r1")])
            .await
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(backend.rows("recipes").len(), 1);
        let remaining = backend.rows("ingredients");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["name"], "b");
    }

    #[tokio::test]
    async fn test_insert_with_missing_parent_violates_foreign_key() {
        let backend = FakeBackend::with_recipe_schema();

        let err = backend
            .insert(
                "ingredients",
                vec![json!({"recipe_id": Uuid::new_v4().to_string(), "name": "salt"})],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("23503"));
        assert!(backend.rows("ingredients").is_empty());

        let recipe = backend
            .insert("recipes", vec![json!({"title": "Soup"})])
            .await
            .unwrap();
        backend
            .insert(
                "ingredients",
                vec![json!({"recipe_id": recipe[0]["id"].clone(), "name": "salt"})],
            )
            .await
            .unwrap();
        assert_eq!(backend.rows("ingredients").len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_logged_and_returned() {
        let backend = FakeBackend::with_recipe_schema();
        backend.fail_on(FakeOp::Insert, "ingredients", "permission denied");

        let err = backend
            .insert("ingredients", vec![json!({"name": "salt"})])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
        assert_eq!(backend.calls(), vec!["insert ingredients"]);
        assert!(backend.rows("ingredients").is_empty());
    }

    #[tokio::test]
    async fn test_magic_link_round_trip() {
        let backend = FakeBackend::new();
        let mut events = backend.events().subscribe();

        let link = backend
            .sign_in_with_magic_link("cook@example.com", "http://localhost/auth/callback")
            .await
            .unwrap();
        let code = backend.issue_code("cook@example.com").unwrap();

        let wrong = backend.exchange_code_for_session(&code, "wrong").await;
        assert!(wrong.is_err());

        // A rejected exchange consumes the code.
        assert!(backend
            .exchange_code_for_session(&code, &link.code_verifier)
            .await
            .is_err());

        backend
            .sign_in_with_magic_link("cook@example.com", "http://localhost/auth/callback")
            .await
            .unwrap();
        let code = backend.issue_code("cook@example.com").unwrap();
        let pending = backend.lock().codes.get(&code).unwrap().1.clone();
        let session = backend
            .exchange_code_for_session(&code, &pending)
            .await
            .unwrap();

        assert_eq!(session.user.email.as_deref(), Some("cook@example.com"));
        let user = backend.get_user(&session.access_token).await.unwrap();
        assert_eq!(user, Some(session.user.clone()));
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedIn {
                user_id: session.user.id
            }
        );

        backend.sign_out(&session.access_token).await.unwrap();
        assert_eq!(backend.get_user(&session.access_token).await.unwrap(), None);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
    }
}
