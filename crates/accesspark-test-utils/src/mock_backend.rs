// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory backend facade for deterministic tests.
//!
//! `MockBackend` implements the full facade over in-memory tables, users and
//! objects. Every operation that would be a round trip in a real variant is
//! counted, so tests can assert that an operation failed fast.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, broadcast};

use accesspark_client::Session;
use accesspark_core::{
    AccessParkError, AuthEvent, AuthSession, BackendAdapter, BackendMode, Credentials,
    Direction, HealthStatus, IdentityBackend, ObjectStorage, Query, StoredObject, TableBackend,
    User, UserId,
};

/// Table holding one row per registered user, used by identity joins.
pub const PROFILES_TABLE: &str = "profiles";
/// Table holding one row per moderator.
pub const ADMINS_TABLE: &str = "admins";

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: User,
}

/// An embedded resource in a select list: `alias:table!hint(columns)`.
#[derive(Debug, Clone, PartialEq)]
struct Embed {
    alias: String,
    table: String,
    hint: String,
    columns: Vec<String>,
}

/// A mock backend storing everything in memory.
pub struct MockBackend {
    session: Session,
    accounts: Mutex<HashMap<String, Account>>,
    tables: Mutex<HashMap<String, Vec<Value>>>,
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    /// Foreign key hint -> column on the referencing row.
    relations: HashMap<String, String>,
    failures: Mutex<VecDeque<AccessParkError>>,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Creates an empty backend with the listing relations preconfigured.
    pub fn new() -> Self {
        let relations = HashMap::from([
            ("fk_approver".to_string(), "approved_by".to_string()),
            ("fk_submitter".to_string(), "submitted_by".to_string()),
        ]);
        Self {
            session: Session::new(),
            accounts: Mutex::new(HashMap::new()),
            tables: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            relations,
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Registers an account and its profile row. Does not sign in.
    pub async fn register_user(&self, email: &str, password: &str) -> User {
        let user = User {
            id: UserId(uuid::Uuid::new_v4().to_string()),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
        };
        self.accounts.lock().await.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        self.seed_row(
            PROFILES_TABLE,
            serde_json::json!({"id": user.id.0, "email": email}),
        )
        .await;
        user
    }

    /// Registers an account that is also listed in the admins table.
    pub async fn register_moderator(&self, email: &str, password: &str) -> User {
        let user = self.register_user(email, password).await;
        self.seed_row(
            ADMINS_TABLE,
            serde_json::json!({"id": user.id.0, "email": email}),
        )
        .await;
        user
    }

    /// Inserts a row directly, without counting a call.
    pub async fn seed_row(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// All rows of a table in insertion order.
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// The stored object at `bucket/path`, if any.
    pub async fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Makes the next counted call fail with `error`.
    pub async fn fail_next(&self, error: AccessParkError) {
        self.failures.lock().await.push_back(error);
    }

    /// Number of round trips performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Counts a round trip and applies any injected failure.
    async fn round_trip(&self) -> Result<(), AccessParkError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        match self.failures.lock().await.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn issue_session(user: &User) -> AuthSession {
        AuthSession {
            access_token: format!("mock-token-{}", uuid::Uuid::new_v4()),
            refresh_token: None,
            token_type: Some("bearer".to_string()),
            expires_in: Some(3600),
            user: Some(user.clone()),
        }
    }

    fn resolve_embed(
        &self,
        tables: &HashMap<String, Vec<Value>>,
        row: &Value,
        embed: &Embed,
    ) -> Value {
        let Some(column) = self.relations.get(&embed.hint) else {
            return Value::Null;
        };
        let Some(key) = row.get(column).filter(|v| !v.is_null()) else {
            return Value::Null;
        };
        tables
            .get(&embed.table)
            .and_then(|rows| rows.iter().find(|r| r.get("id") == Some(key)))
            .map(|target| project(target, &embed.columns))
            .unwrap_or(Value::Null)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter values are compared in their textual form, as the REST layer does.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query
        .filters()
        .iter()
        .all(|f| row.get(&f.column).map(text).as_deref() == Some(f.value.as_str()))
}

/// Nulls sort last.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    let mut out = Map::new();
    for column in columns {
        out.insert(column.clone(), row.get(column).cloned().unwrap_or(Value::Null));
    }
    Value::Object(out)
}

/// Splits a select list on commas outside parentheses.
fn split_top_level(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_select(list: &str) -> (Vec<String>, Vec<Embed>) {
    let mut columns = Vec::new();
    let mut embeds = Vec::new();
    for part in split_top_level(list) {
        let parsed = part.split_once(':').and_then(|(alias, rest)| {
            let (target, inner) = rest.split_once('(')?;
            let (table, hint) = target.split_once('!').unwrap_or((target, ""));
            Some(Embed {
                alias: alias.trim().to_string(),
                table: table.trim().to_string(),
                hint: hint.trim().to_string(),
                columns: split_top_level(inner.trim_end_matches(')')),
            })
        });
        match parsed {
            Some(embed) => embeds.push(embed),
            None => columns.push(part),
        }
    }
    (columns, embeds)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl BackendAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Direct
    }

    async fn health_check(&self) -> Result<HealthStatus, AccessParkError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl IdentityBackend for MockBackend {
    async fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthSession>, AccessParkError> {
        credentials.validate()?;
        self.round_trip().await?;
        let email = credentials.email.trim();
        if self.accounts.lock().await.contains_key(email) {
            return Err(AccessParkError::Remote {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let user = self.register_user(email, &credentials.password).await;
        let session = Self::issue_session(&user);
        self.session.establish(session.clone());
        Ok(Some(session))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AccessParkError> {
        credentials.validate()?;
        self.round_trip().await?;
        let account = self
            .accounts
            .lock()
            .await
            .get(credentials.email.trim())
            .filter(|a| a.password == credentials.password)
            .cloned()
            .ok_or_else(|| AccessParkError::Remote {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;
        let session = Self::issue_session(&account.user);
        self.session.establish(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AccessParkError> {
        if self.session.token().is_some() {
            // Best effort: an injected failure is swallowed like a real variant does.
            let _ = self.round_trip().await;
        }
        self.session.clear();
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AccessParkError> {
        if self.session.token().is_none() {
            return Ok(None);
        }
        self.round_trip().await?;
        Ok(self.session.user())
    }

    async fn session(&self) -> Result<Option<AuthSession>, AccessParkError> {
        match self.current_user().await? {
            Some(_) => Ok(self.session.snapshot()),
            None => Ok(None),
        }
    }

    fn signed_in_user(&self) -> Option<User> {
        self.session.user()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.session.subscribe()
    }
}

#[async_trait]
impl TableBackend for MockBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, AccessParkError> {
        self.round_trip().await?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<&Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, query)).collect())
            .unwrap_or_default();

        if let Some(order) = query.order() {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }

        let (columns, embeds) = parse_select(query.columns());
        Ok(rows
            .into_iter()
            .map(|row| {
                let mut out = project(row, &columns);
                if let Value::Object(map) = &mut out {
                    for embed in &embeds {
                        map.insert(embed.alias.clone(), self.resolve_embed(&tables, row, embed));
                    }
                }
                out
            })
            .collect())
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value, AccessParkError> {
        self.round_trip().await?;
        let Value::Object(mut row) = record else {
            return Err(AccessParkError::Remote {
                status: 400,
                message: "record must be an object".to_string(),
            });
        };
        let stamp = now();
        row.entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(stamp.clone()));
        row.entry("updated_at").or_insert_with(|| Value::String(stamp));
        let row = Value::Object(row);
        self.seed_row(table, row.clone()).await;
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, AccessParkError> {
        query.require_filter("update")?;
        self.round_trip().await?;
        let Value::Object(patch) = patch else {
            return Err(AccessParkError::Remote {
                status: 400,
                message: "patch must be an object".to_string(),
            });
        };
        let stamp = now();
        let mut tables = self.tables.lock().await;
        let mut updated = Vec::new();
        for row in tables.get_mut(table).into_iter().flatten() {
            if !matches(row, query) {
                continue;
            }
            if let Value::Object(map) = row {
                for (key, value) in &patch {
                    map.insert(key.clone(), value.clone());
                }
                map.insert("updated_at".to_string(), Value::String(stamp.clone()));
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<(), AccessParkError> {
        query.require_filter("delete")?;
        self.round_trip().await?;
        if let Some(rows) = self.tables.lock().await.get_mut(table) {
            rows.retain(|row| !matches(row, query));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MockBackend {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        object: StoredObject,
    ) -> Result<String, AccessParkError> {
        self.round_trip().await?;
        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.objects.lock().await;
        if objects.contains_key(&key) {
            return Err(AccessParkError::Conflict {
                what: format!("{bucket}/{path}"),
            });
        }
        objects.insert(key, object);
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("mock://{bucket}/{path}")
    }
}
