// TestDependencies - mock implementations for testing
//
// In-memory stand-ins for the hosted services, injected through AppDeps.
// Each mock records its calls so tests can assert on what was written.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use openai_client::OpenAIError;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use supabase_client::{
    Bucket, BucketOptions, FileObject, FileOptions, Query, Session, SupabaseError, User,
};
use uuid::Uuid;

use super::{AppDeps, BaseBlobStore, BaseIdentityProvider, BaseImageGenerator, BaseRecordStore};

/// Public URL prefix the mock blob store hands out.
pub const MOCK_STORAGE_URL: &str = "https://mock.supabase.co/storage/v1/object/public";

/// A 1x1 transparent PNG.
pub const SAMPLE_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn api_error(status: u16, code: Option<&str>, message: &str) -> anyhow::Error {
    anyhow!(SupabaseError::Api {
        status,
        code: code.map(str::to_string),
        message: message.to_string(),
        details: None,
    })
}

// =============================================================================
// Mock Record Store
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOp {
    Select,
    Insert,
    Update,
    Delete,
}

/// A recorded record store call
#[derive(Debug, Clone)]
pub struct RecordCall {
    pub op: RecordOp,
    pub table: String,
    pub filters: Vec<(String, String)>,
}

/// Foreign keys used to resolve embeds: (from table, to table, column)
const RELATIONS: &[(&str, &str, &str)] = &[
    ("posts", "profiles", "user_id"),
    ("comments", "profiles", "user_id"),
    ("likes", "profiles", "user_id"),
    ("comments", "posts", "post_id"),
    ("likes", "posts", "post_id"),
];

/// Row-level behaviour the backend applies on insert and delete:
/// (child table, counter column on posts)
const COUNTERS: &[(&str, &str)] = &[("likes", "likes_count"), ("comments", "comments_count")];

pub struct MockRecordStore {
    tables: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    calls: Arc<Mutex<Vec<RecordCall>>>,
    failures: Arc<Mutex<Vec<(RecordOp, String, String)>>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seed a row as-is (no defaults are filled in)
    pub fn with_row(self, table: &str, row: Value) -> Self {
        self.seed(table, row);
        self
    }

    /// Seed a row into a store that is already in use
    pub fn seed(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Make every `op` on `table` fail with `message`
    pub fn failing(self, op: RecordOp, table: &str, message: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push((op, table.to_string(), message.to_string()));
        self
    }

    /// Current rows of a table
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Get all calls in order
    pub fn calls(&self) -> Vec<RecordCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that insert, update or delete rows
    pub fn writes(&self) -> Vec<RecordCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.op != RecordOp::Select)
            .collect()
    }

    fn record(&self, op: RecordOp, table: &str, filters: &[(String, String)]) -> Result<()> {
        self.calls.lock().unwrap().push(RecordCall {
            op,
            table: table.to_string(),
            filters: filters.to_vec(),
        });

        let failures = self.failures.lock().unwrap();
        match failures.iter().find(|(o, t, _)| *o == op && t == table) {
            Some((_, _, message)) => Err(api_error(500, None, message)),
            None => Ok(()),
        }
    }

    fn matching(tables: &HashMap<String, Vec<Value>>, query: &Query) -> Vec<Value> {
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(&a[&order.column], &b[&order.column]);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        rows
    }

    fn shape(tables: &HashMap<String, Vec<Value>>, table: &str, row: Value, columns: &str) -> Value {
        let mut out = match project(&row, columns) {
            Value::Object(map) => map,
            other => return other,
        };

        for embed in supabase_client::postgrest::parse_embeds(columns) {
            let related = RELATIONS
                .iter()
                .find(|(from, to, _)| *from == table && *to == embed.table)
                .and_then(|(_, to, fk)| {
                    tables
                        .get(*to)?
                        .iter()
                        .find(|r| text(&r["id"]) == text(&row[*fk]))
                        .cloned()
                })
                .map(|r| project(&r, &embed.columns))
                .unwrap_or(Value::Null);
            out.insert(embed.alias, related);
        }

        Value::Object(out)
    }

    fn adjust_counter(tables: &mut HashMap<String, Vec<Value>>, child: &str, row: &Value, delta: i64) {
        let Some((_, column)) = COUNTERS.iter().find(|(t, _)| *t == child) else {
            return;
        };
        let post_id = text(&row["post_id"]);
        if let Some(post) = tables
            .get_mut("posts")
            .and_then(|posts| posts.iter_mut().find(|p| text(&p["id"]) == post_id))
        {
            let current = post[*column].as_i64().unwrap_or(0);
            post[*column] = json!((current + delta).max(0));
        }
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, value)| text(&row[column]) == *value)
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => text(a).cmp(&text(b)),
    }
}

/// Plain (non-embed) columns of a select list
fn plain_columns(columns: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in columns.chars().filter(|c| !c.is_whitespace()) {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
        .into_iter()
        .filter(|item| !item.is_empty() && !item.contains('('))
        .collect()
}

fn project(row: &Value, columns: &str) -> Value {
    let plain = plain_columns(columns);
    if plain.iter().any(|c| c == "*") {
        return row.clone();
    }
    let mut out = Map::new();
    for column in plain {
        out.insert(column.clone(), row[&column].clone());
    }
    Value::Object(out)
}

fn defaults(table: &str) -> Value {
    match table {
        "posts" => json!({
            "caption": null,
            "likes_count": 0,
            "comments_count": 0,
            "updated_at": now(),
        }),
        "profiles" => json!({"avatar_url": null, "bio": null, "updated_at": now()}),
        "comments" => json!({"updated_at": now()}),
        _ => json!({}),
    }
}

#[async_trait]
impl BaseRecordStore for MockRecordStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        self.record(RecordOp::Select, &query.table, &query.filters)?;

        let tables = self.tables.lock().unwrap();
        Ok(Self::matching(&tables, query)
            .into_iter()
            .map(|row| Self::shape(&tables, &query.table, row, &query.columns))
            .collect())
    }

    async fn select_one(&self, query: &Query) -> Result<Option<Value>> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(anyhow!(SupabaseError::Api {
                status: 406,
                code: Some("PGRST116".into()),
                message: "JSON object requested, multiple (or no) rows returned".into(),
                details: Some(format!("The result contains {} rows", n)),
            })),
        }
    }

    async fn insert(&self, table: &str, row: Value, columns: &str) -> Result<Value> {
        self.record(RecordOp::Insert, table, &[])?;

        let Value::Object(fields) = row else {
            return Err(api_error(400, Some("PGRST102"), "Body must be an object"));
        };
        let mut stored = match defaults(table) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        stored.insert("id".into(), json!(Uuid::new_v4().to_string()));
        stored.insert("created_at".into(), json!(now()));
        stored.extend(fields);
        let stored = Value::Object(stored);

        let mut tables = self.tables.lock().unwrap();
        let existing = tables.get(table).cloned().unwrap_or_default();
        let duplicate_id = existing.iter().any(|r| text(&r["id"]) == text(&stored["id"]));
        let duplicate_like = table == "likes"
            && existing.iter().any(|r| {
                text(&r["user_id"]) == text(&stored["user_id"])
                    && text(&r["post_id"]) == text(&stored["post_id"])
            });
        if duplicate_id || duplicate_like {
            return Err(api_error(
                409,
                Some("23505"),
                &format!("duplicate key value violates unique constraint on \"{}\"", table),
            ));
        }

        tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Self::adjust_counter(&mut tables, table, &stored, 1);

        Ok(Self::shape(&tables, table, stored, columns))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>> {
        self.record(RecordOp::Update, &query.table, &query.filters)?;

        let mut tables = self.tables.lock().unwrap();
        let mut changed = Vec::new();
        if let Some(rows) = tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|r| matches(r, &query.filters)) {
                if let (Value::Object(target), Value::Object(fields)) = (&mut *row, &patch) {
                    for (k, v) in fields {
                        target.insert(k.clone(), v.clone());
                    }
                    if target.contains_key("updated_at") && !fields.contains_key("updated_at") {
                        target.insert("updated_at".into(), json!(now()));
                    }
                }
                changed.push(row.clone());
            }
        }

        Ok(changed
            .into_iter()
            .map(|row| Self::shape(&tables, &query.table, row, &query.columns))
            .collect())
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Value>> {
        self.record(RecordOp::Delete, &query.table, &query.filters)?;

        let mut tables = self.tables.lock().unwrap();
        let removed: Vec<Value> = match tables.get_mut(&query.table) {
            Some(rows) => {
                let (gone, kept): (Vec<Value>, Vec<Value>) = rows
                    .drain(..)
                    .partition(|r| matches(r, &query.filters));
                *rows = kept;
                gone
            }
            None => Vec::new(),
        };
        for row in &removed {
            Self::adjust_counter(&mut tables, &query.table, row, -1);
        }
        Ok(removed)
    }
}

// =============================================================================
// Mock Blob Store
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobOp {
    ListBuckets,
    CreateBucket,
    List,
    Upload,
    Remove,
}

/// Arguments captured from an upload call
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub bucket: String,
    pub path: String,
    pub size: usize,
    pub options: FileOptions,
}

pub struct MockBlobStore {
    buckets: Arc<Mutex<Vec<Bucket>>>,
    objects: Arc<Mutex<HashMap<(String, String), Bytes>>>,
    uploads: Arc<Mutex<Vec<UploadCall>>>,
    removals: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    created: Arc<Mutex<Vec<(String, BucketOptions)>>>,
    failures: Arc<Mutex<Vec<BlobOp>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(Mutex::new(Vec::new())),
            objects: Arc::new(Mutex::new(HashMap::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            removals: Arc::new(Mutex::new(Vec::new())),
            created: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an existing public bucket
    pub fn with_bucket(self, id: &str) -> Self {
        self.buckets.lock().unwrap().push(bucket(id, &BucketOptions {
            public: true,
            ..Default::default()
        }));
        self
    }

    /// Make every call of `op` fail
    pub fn failing(self, op: BlobOp) -> Self {
        self.failures.lock().unwrap().push(op);
        self
    }

    pub fn bucket_ids(&self) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.id.clone())
            .collect()
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<(String, Vec<String>)> {
        self.removals.lock().unwrap().clone()
    }

    /// Buckets created through `create_bucket`, with their options
    pub fn created_buckets(&self) -> Vec<(String, BucketOptions)> {
        self.created.lock().unwrap().clone()
    }

    /// Check whether an object is currently stored
    pub fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    fn check(&self, op: BlobOp) -> Result<()> {
        if self.failures.lock().unwrap().contains(&op) {
            return Err(api_error(500, None, "mock storage failure"));
        }
        Ok(())
    }

    fn require_bucket(&self, id: &str) -> Result<()> {
        if self.buckets.lock().unwrap().iter().any(|b| b.id == id) {
            Ok(())
        } else {
            Err(api_error(404, Some("404"), "Bucket not found"))
        }
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn bucket(id: &str, options: &BucketOptions) -> Bucket {
    Bucket {
        id: id.to_string(),
        name: id.to_string(),
        owner: None,
        public: options.public,
        file_size_limit: options.file_size_limit,
        allowed_mime_types: options.allowed_mime_types.clone(),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

#[async_trait]
impl BaseBlobStore for MockBlobStore {
    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        self.check(BlobOp::ListBuckets)?;
        Ok(self.buckets.lock().unwrap().clone())
    }

    async fn create_bucket(&self, id: &str, options: &BucketOptions) -> Result<()> {
        self.check(BlobOp::CreateBucket)?;
        let mut buckets = self.buckets.lock().unwrap();
        if buckets.iter().any(|b| b.id == id) {
            return Err(api_error(409, Some("Duplicate"), "The resource already exists"));
        }
        buckets.push(bucket(id, options));
        self.created
            .lock()
            .unwrap()
            .push((id.to_string(), options.clone()));
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<FileObject>> {
        self.check(BlobOp::List)?;
        self.require_bucket(bucket)?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, path)| b == bucket && path.starts_with(prefix))
            .map(|(_, path)| FileObject {
                name: path.clone(),
                id: None,
                created_at: None,
                updated_at: None,
                metadata: None,
            })
            .collect())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &FileOptions,
    ) -> Result<String> {
        self.check(BlobOp::Upload)?;
        self.require_bucket(bucket)?;

        self.uploads.lock().unwrap().push(UploadCall {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size: data.len(),
            options: options.clone(),
        });

        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) && !options.upsert {
            return Err(api_error(409, Some("Duplicate"), "The resource already exists"));
        }
        objects.insert(key, data);
        Ok(format!("{}/{}", bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        self.check(BlobOp::Remove)?;
        self.removals
            .lock()
            .unwrap()
            .push((bucket.to_string(), paths.to_vec()));
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", MOCK_STORAGE_URL, bucket, path)
    }
}

// =============================================================================
// Mock Image Generator
// =============================================================================

/// Arguments captured from a generate call
#[derive(Debug, Clone)]
pub struct ImageCall {
    pub prompt: String,
    pub size: String,
}

enum ImageReply {
    Image(String),
    ApiError { status: u16, message: String },
}

pub struct MockImageGenerator {
    replies: Arc<Mutex<Vec<ImageReply>>>,
    calls: Arc<Mutex<Vec<ImageCall>>>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a base64 payload to return
    pub fn with_image(self, b64: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(ImageReply::Image(b64.to_string()));
        self
    }

    /// Queue an upstream API failure
    pub fn with_api_error(self, status: u16, message: &str) -> Self {
        self.replies.lock().unwrap().push(ImageReply::ApiError {
            status,
            message: message.to_string(),
        });
        self
    }

    pub fn calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str, size: &str) -> Result<String> {
        self.calls.lock().unwrap().push(ImageCall {
            prompt: prompt.to_string(),
            size: size.to_string(),
        });

        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.is_empty() {
            ImageReply::Image(SAMPLE_PNG_BASE64.to_string())
        } else {
            replies.remove(0)
        };

        match reply {
            ImageReply::Image(b64) => Ok(b64),
            ImageReply::ApiError { status, message } => {
                Err(anyhow!(OpenAIError::Api { status, message }))
            }
        }
    }
}

// =============================================================================
// Mock Identity Provider
// =============================================================================

struct Account {
    password: String,
    user: User,
}

pub struct MockIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    tokens: Arc<Mutex<HashMap<String, User>>>,
    refresh_tokens: Arc<Mutex<HashMap<String, User>>>,
    active: Arc<Mutex<Option<String>>>,
    offline: Arc<Mutex<bool>>,
    confirm_email: bool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            tokens: Arc::new(Mutex::new(HashMap::new())),
            refresh_tokens: Arc::new(Mutex::new(HashMap::new())),
            active: Arc::new(Mutex::new(None)),
            offline: Arc::new(Mutex::new(false)),
            confirm_email: false,
        }
    }

    /// Register an account up front
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.register(email, password);
        self
    }

    /// Sign ups return no session until the email is confirmed
    pub fn requiring_confirmation(mut self) -> Self {
        self.confirm_email = true;
        self
    }

    /// The user registered under `email`
    pub fn user(&self, email: &str) -> Option<User> {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|a| a.user.clone())
    }

    /// Token the backend clients currently act as
    pub fn active_token(&self) -> Option<String> {
        self.active.lock().unwrap().clone()
    }

    /// Let an access token lapse; its refresh token stays valid
    pub fn expire(&self, access_token: &str) {
        self.tokens.lock().unwrap().remove(access_token);
    }

    /// Fail token lookups and refreshes the way an unreachable host does
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    fn check_reachable(&self, endpoint: &str) -> Result<()> {
        if *self.offline.lock().unwrap() {
            return Err(anyhow!(
                "Network error: error sending request for url (https://mock.supabase.co/auth/v1/{})",
                endpoint
            ));
        }
        Ok(())
    }

    fn register(&self, email: &str, password: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
            created_at: Some(Utc::now()),
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    fn issue(&self, user: User) -> Session {
        let token = format!("mock-token-{}", Uuid::new_v4());
        let refresh = format!("mock-refresh-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().insert(token.clone(), user.clone());
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh.clone(), user.clone());
        Session {
            access_token: token,
            refresh_token: refresh,
            token_type: Some("bearer".to_string()),
            expires_in: Some(3600),
            user,
        }
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(api_error(422, Some("user_already_exists"), "User already registered"));
        }
        let user = self.register(email, password);
        if self.confirm_email {
            Ok(None)
        } else {
            Ok(Some(self.issue(user)))
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let user = self
            .accounts
            .lock()
            .unwrap()
            .get(email)
            .filter(|a| a.password == password)
            .map(|a| a.user.clone());
        match user {
            Some(user) => Ok(self.issue(user)),
            None => Err(api_error(
                400,
                Some("invalid_credentials"),
                "Invalid login credentials",
            )),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<User> {
        self.check_reachable("user")?;
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or_else(|| api_error(401, Some("bad_jwt"), "invalid JWT"))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        self.check_reachable("token")?;
        // Refresh tokens are single use.
        let user = self.refresh_tokens.lock().unwrap().remove(refresh_token);
        match user {
            Some(user) => Ok(self.issue(user)),
            None => Err(api_error(
                400,
                Some("refresh_token_not_found"),
                "Invalid Refresh Token: Refresh Token Not Found",
            )),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let user = self.tokens.lock().unwrap().remove(access_token);
        if let Some(user) = user {
            self.refresh_tokens
                .lock()
                .unwrap()
                .retain(|_, u| u.id != user.id);
        }
        Ok(())
    }

    fn use_session(&self, session: Option<&Session>) {
        *self.active.lock().unwrap() = session.map(|s| s.access_token.clone());
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

/// Mocks wired into an `AppDeps`; the default blob store already has an
/// `images` bucket.
pub struct TestDependencies {
    pub records: Arc<MockRecordStore>,
    pub blobs: Arc<MockBlobStore>,
    pub images: Option<Arc<MockImageGenerator>>,
    pub identity: Arc<MockIdentityProvider>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            records: Arc::new(MockRecordStore::new()),
            blobs: Arc::new(MockBlobStore::new().with_bucket("images")),
            images: Some(Arc::new(MockImageGenerator::new())),
            identity: Arc::new(MockIdentityProvider::new()),
        }
    }

    /// Set a mock record store
    pub fn mock_records(mut self, records: MockRecordStore) -> Self {
        self.records = Arc::new(records);
        self
    }

    /// Set a mock blob store
    pub fn mock_blobs(mut self, blobs: MockBlobStore) -> Self {
        self.blobs = Arc::new(blobs);
        self
    }

    /// Set a mock image generator
    pub fn mock_images(mut self, images: MockImageGenerator) -> Self {
        self.images = Some(Arc::new(images));
        self
    }

    /// Run without an image generator, as when no API key is configured
    pub fn without_images(mut self) -> Self {
        self.images = None;
        self
    }

    /// Set a mock identity provider
    pub fn mock_identity(mut self, identity: MockIdentityProvider) -> Self {
        self.identity = Arc::new(identity);
        self
    }

    /// Convert into AppDeps; the mocks stay reachable through `self`
    pub fn deps(&self) -> AppDeps {
        AppDeps::new(
            self.records.clone(),
            self.blobs.clone(),
            self.images
                .clone()
                .map(|images| images as Arc<dyn BaseImageGenerator>),
            self.identity.clone(),
            "images",
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
