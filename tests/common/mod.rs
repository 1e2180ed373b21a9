#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::routing::get;
use axum::{Router, middleware};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shortspan::api::handlers::{health_handler, redirect_handler};
use shortspan::api::middleware::auth;
use shortspan::application::services::{AuthService, LinkService, RedirectService};
use shortspan::domain::entities::{Link, NewLink};
use shortspan::domain::repositories::{LinkRepository, StatsUpdate, TokenRepository};
use shortspan::error::AppError;
use shortspan::infrastructure::cache::MemoryCache;
use shortspan::state::AppState;

pub const TEST_SECRET: &str = "test-signing-secret";
pub const TEST_TOKEN: &str = "test-token";

/// Computes the stored hash for a raw token, mirroring the auth service.
pub fn hash_token(secret: &str, token: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// In-memory link store mirroring the Postgres repository, including its
/// unique short-code constraint.
pub struct MemoryLinkRepository {
    links: Mutex<Vec<Link>>,
    next_id: AtomicI64,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Inserts a row directly, bypassing the service layer.
    pub fn seed(&self, link: Link) {
        self.links.lock().unwrap().push(link);
    }

    /// Reads a row back for assertions.
    pub fn get(&self, code: &str) -> Option<Link> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.short_code == code)
            .cloned()
    }

    pub fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();

        if links.iter().any(|l| l.short_code == new_link.short_code) {
            return Err(AppError::conflict(
                "Duplicate value",
                json!({ "constraint": "links_short_code_key" }),
            ));
        }

        let link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            short_code: new_link.short_code,
            original_url: new_link.original_url,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            redirect_count: 0,
            last_used: None,
            owner_id: Some(new_link.owner_id),
        };
        links.push(link.clone());

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.short_code == code)
            .cloned())
    }

    async fn find_by_original_url(
        &self,
        urls: &[String],
        owner_id: Uuid,
    ) -> Result<Vec<Link>, AppError> {
        let mut matches: Vec<Link> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.owner_id == Some(owner_id) && urls.contains(&l.original_url))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matches)
    }

    async fn list_all(&self) -> Result<Vec<Link>, AppError> {
        let mut links: Vec<Link> = self.links.lock().unwrap().clone();
        links.sort_by_key(|l| l.id);

        Ok(links)
    }

    async fn update_url(&self, code: &str, original_url: &str) -> Result<Option<Link>, AppError> {
        let mut links = self.links.lock().unwrap();

        match links.iter_mut().find(|l| l.short_code == code) {
            Some(link) => {
                link.original_url = original_url.to_string();
                Ok(Some(link.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, code: &str) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.short_code != code);

        Ok(links.len() < before)
    }

    async fn apply_stats_updates(&self, updates: &[StatsUpdate]) -> Result<(), AppError> {
        let mut links = self.links.lock().unwrap();

        for update in updates {
            if let Some(link) = links.iter_mut().find(|l| l.id == update.link_id) {
                link.redirect_count = update.redirect_count;
                link.last_used = update.last_used;
            }
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// In-memory token store for exercising the real auth middleware.
pub struct MemoryTokenRepository {
    tokens: Mutex<HashMap<String, Uuid>>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, token_hash: String, user_id: Uuid) {
        self.tokens.lock().unwrap().insert(token_hash, user_id);
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<Uuid>, AppError> {
        Ok(self.tokens.lock().unwrap().get(token_hash).copied())
    }

    async fn touch(&self, _token_hash: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Everything a handler test needs: the wired state plus direct handles to
/// the doubles for seeding and assertions.
pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<MemoryLinkRepository>,
    pub cache: Arc<MemoryCache>,
    pub user_id: Uuid,
}

/// Builds application state on in-memory doubles, with one API token
/// registered for [`TEST_TOKEN`].
pub fn create_test_state() -> TestContext {
    let repo = Arc::new(MemoryLinkRepository::new());
    let cache = Arc::new(MemoryCache::new(3600, 86_400));
    let tokens = Arc::new(MemoryTokenRepository::new());

    let user_id = Uuid::new_v4();
    tokens.insert(hash_token(TEST_SECRET, TEST_TOKEN), user_id);

    let link_service = Arc::new(LinkService::new(repo.clone(), cache.clone()));
    let redirect_service = Arc::new(RedirectService::new(repo.clone(), cache.clone()));
    let auth_service = Arc::new(AuthService::new(tokens, TEST_SECRET.to_string()));

    let state = AppState::new(link_service, redirect_service, auth_service, cache.clone());

    TestContext {
        state,
        repo,
        cache,
        user_id,
    }
}

/// Builds the full route tree without rate limiting (the governor layers
/// key on socket connect info that an in-process test server never has).
pub fn test_router(state: AppState) -> Router {
    let api_router = shortspan::api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api", api_router)
        .with_state(state)
}

pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(test_router(state)).unwrap()
}

/// Bearer header value for the registered test token.
pub fn bearer() -> String {
    format!("Bearer {TEST_TOKEN}")
}

/// A plain link row owned by `owner`.
pub fn sample_link(id: i64, code: &str, url: &str, owner: Uuid) -> Link {
    Link {
        id,
        short_code: code.to_string(),
        original_url: url.to_string(),
        created_at: Utc::now(),
        expires_at: None,
        redirect_count: 0,
        last_used: None,
        owner_id: Some(owner),
    }
}

/// Seeds a link owned by the test user.
pub fn create_test_link(ctx: &TestContext, code: &str, url: &str) -> Link {
    let link = sample_link(ctx.repo.next_id(), code, url, ctx.user_id);
    ctx.repo.seed(link.clone());
    link
}

/// Seeds a link that expired an hour ago.
pub fn create_expired_link(ctx: &TestContext, code: &str, url: &str) -> Link {
    let mut link = sample_link(ctx.repo.next_id(), code, url, ctx.user_id);
    link.expires_at = Some(Utc::now() - Duration::hours(1));
    ctx.repo.seed(link.clone());
    link
}

/// Seeds a link owned by somebody other than the test user.
pub fn create_foreign_link(ctx: &TestContext, code: &str, url: &str) -> Link {
    let link = sample_link(ctx.repo.next_id(), code, url, Uuid::new_v4());
    ctx.repo.seed(link.clone());
    link
}

/// Polls the cache until the stats record for `code` reaches `count`.
///
/// Hit recording is fire-and-forget, so tests wait for the spawned task
/// instead of asserting immediately.
pub async fn wait_for_hit_count(ctx: &TestContext, code: &str, count: i64) {
    use shortspan::infrastructure::cache::LinkCache;

    for _ in 0..100 {
        if let Ok(Some(stats)) = ctx.cache.get_stats(code).await {
            if stats.redirect_count >= count {
                assert_eq!(stats.redirect_count, count);
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    panic!("stats for {code} never reached {count} hits");
}
