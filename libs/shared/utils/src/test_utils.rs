use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{connect, connect_in_memory};
use shared_models::auth::{Role, TokenKind, User};

use crate::jwt;
use crate::password::hash_password;
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "password123";

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

pub struct TestConfig {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub rate_limit_max_requests: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            access_token_ttl_minutes: 60,
            rate_limit_max_requests: 10_000,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: self.jwt_secret.clone(),
            access_token_ttl_minutes: self.access_token_ttl_minutes,
            refresh_token_ttl_days: 7,
            port: 0,
            cors_allowed_origins: vec![],
            rate_limit_max_requests: self.rate_limit_max_requests,
            rate_limit_window_secs: 900,
        }
    }

    pub async fn to_state(&self) -> AppState {
        let db = connect_in_memory()
            .await
            .expect("in-memory database should open");
        AppState::new(self.to_app_config(), db)
    }

    /// State over the production file pool at `path`, for tests with concurrent writers.
    pub async fn to_file_state(&self, path: &Path) -> AppState {
        let mut config = self.to_app_config();
        config.database_url = format!("sqlite://{}", path.display());
        let db = connect(&config).await.expect("file database should open");
        AppState::new(config, db)
    }
}

/// Fresh in-memory database with the schema applied.
pub async fn test_state() -> AppState {
    TestConfig::default().to_state().await
}

/// Unique eleven-digit TC number for seeded users.
pub fn unique_tc_no() -> String {
    format!("{}", 10_000_000_000u64 + next_sequence() * 7_919 % 89_999_999_999)
}

pub async fn seed_clinic(state: &AppState, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO clinics (id, name, created_at) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(Utc::now())
        .execute(&state.db)
        .await
        .expect("clinic insert");
    id
}

/// Insert a user plus its role row directly, bypassing the user service.
/// Doctors get a freshly seeded clinic. The password is [`TEST_PASSWORD`].
pub async fn seed_user(state: &AppState, role: Role) -> User {
    let clinic_id = match role {
        Role::Doctor => Some(seed_clinic(state, "Seed Clinic").await),
        _ => None,
    };
    seed_user_in_clinic(state, role, clinic_id).await
}

pub async fn seed_user_in_clinic(state: &AppState, role: Role, clinic_id: Option<Uuid>) -> User {
    let n = next_sequence();
    let user = User {
        id: Uuid::new_v4(),
        name: format!("Test {} {}", role, n),
        tc_no: unique_tc_no(),
        email: format!("{}{}@example.com", role, n),
        role,
        birth_date: NaiveDate::from_ymd_opt(1990, 1, 1),
        joined_at: Utc::now(),
    };
    let password_hash = hash_password(TEST_PASSWORD).expect("hash");

    sqlx::query(
        "INSERT INTO users (id, name, tc_no, email, password_hash, role, birth_date, joined_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.tc_no)
    .bind(&user.email)
    .bind(&password_hash)
    .bind(user.role)
    .bind(user.birth_date)
    .bind(user.joined_at)
    .execute(&state.db)
    .await
    .expect("user insert");

    match role {
        Role::Doctor => {
            sqlx::query("INSERT INTO doctors (user_id, specialty, clinic_id) VALUES (?, ?, ?)")
                .bind(user.id)
                .bind("General Practice")
                .bind(clinic_id.expect("doctor needs a clinic"))
                .execute(&state.db)
                .await
                .expect("doctor insert");
        }
        Role::Secretary => {
            sqlx::query("INSERT INTO secretaries (user_id) VALUES (?)")
                .bind(user.id)
                .execute(&state.db)
                .await
                .expect("secretary insert");
        }
        Role::Patient => {
            sqlx::query("INSERT INTO patients (user_id, name, email) VALUES (?, ?, ?)")
                .bind(user.id)
                .bind(&user.name)
                .bind(&user.email)
                .execute(&state.db)
                .await
                .expect("patient insert");
        }
    }

    user
}

/// Insert a pending appointment one day out, bypassing the booking service.
pub async fn seed_appointment(state: &AppState, patient_id: Uuid, doctor_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO appointments (id, patient_id, doctor_id, date, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(id)
    .bind(patient_id)
    .bind(doctor_id)
    .bind(now + Duration::days(1))
    .bind(now)
    .bind(now)
    .execute(&state.db)
    .await
    .expect("appointment insert");
    id
}

pub async fn count_rows(state: &AppState, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&state.db)
        .await
        .expect("count query");
    count
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user_id: Uuid, secret: &str, exp_minutes: Option<i64>) -> String {
        let claims = jwt::new_claims(
            user_id,
            TokenKind::Access,
            Duration::minutes(exp_minutes.unwrap_or(60)),
        );
        jwt::sign_token(&claims, secret).expect("signing test token")
    }

    pub fn create_expired_token(user_id: Uuid, secret: &str) -> String {
        Self::create_test_token(user_id, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user_id: Uuid) -> String {
        Self::create_test_token(user_id, "wrong-secret", Some(60))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}
