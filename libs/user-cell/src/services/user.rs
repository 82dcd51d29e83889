use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{begin_write, constraint_violation, ConstraintViolation, DbPool};
use shared_models::auth::{Role, User};
use shared_utils::password::hash_password_blocking;
use shared_utils::session::USER_PROFILE_COLUMNS;
use shared_utils::AppState;

use crate::models::{
    CreateUserRequest, DoctorRecord, DoctorSummary, NewUser, PatientRecord, PatientSummary,
    RoleProfile, RoleRecord, SecretaryRecord, UpdateUserRequest, UserAccount, UserError,
};

/// Outcome of the creation policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateGrant {
    Granted,
    /// Allowed only while the users table is empty.
    FirstUserOnly,
}

pub struct UserService {
    db: DbPool,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    /// Anonymous callers may register patients, or any role as the very first user.
    /// Secretaries may create any role.
    pub fn ensure_can_create(&self, caller: Option<&User>, role: Role) -> Result<CreateGrant, UserError> {
        match caller {
            Some(caller) if caller.has_role(Role::Secretary) => Ok(CreateGrant::Granted),
            Some(caller) => {
                warn!("User {} ({}) attempted to create a {}", caller.id, caller.role, role);
                Err(UserError::Forbidden("Only secretaries can create users".to_string()))
            }
            None if role == Role::Patient => Ok(CreateGrant::Granted),
            None => Ok(CreateGrant::FirstUserOnly),
        }
    }

    /// Apply the creation policy for `caller` and create the account.
    pub async fn register(
        &self,
        caller: Option<&User>,
        request: CreateUserRequest,
    ) -> Result<UserAccount, UserError> {
        let grant = self.ensure_can_create(caller, request.role)?;
        self.insert_account(request, grant).await
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserAccount, UserError> {
        self.insert_account(request, CreateGrant::Granted).await
    }

    /// Users may change or remove their own account; secretaries may change anyone's.
    pub fn ensure_can_modify(&self, caller: &User, tc_no: &str) -> Result<(), UserError> {
        if caller.has_role(Role::Secretary) || caller.tc_no == tc_no {
            Ok(())
        } else {
            Err(UserError::Forbidden(
                "You can only modify your own account".to_string(),
            ))
        }
    }

    async fn insert_account(
        &self,
        request: CreateUserRequest,
        grant: CreateGrant,
    ) -> Result<UserAccount, UserError> {
        let new_user = NewUser::try_from(request)?;
        debug!("Creating {} account", new_user.profile.role());

        self.ensure_unique(&new_user.tc_no, &new_user.email).await?;
        let password_hash = hash_password_blocking(new_user.password.clone()).await?;

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            tc_no: new_user.tc_no,
            email: new_user.email,
            role: new_user.profile.role(),
            birth_date: new_user.birth_date,
            joined_at: Utc::now(),
        };

        let mut tx = begin_write(&self.db).await?;

        // counted under the write lock
        if grant == CreateGrant::FirstUserOnly {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(&mut *tx)
                .await?;
            if count > 0 {
                return Err(UserError::Forbidden(
                    "Only patients can register without signing in".to_string(),
                ));
            }
            info!("Bootstrapping first {} account", user.role);
        }

        if let RoleProfile::Doctor { clinic_id, .. } = &new_user.profile {
            if !clinic_exists(&mut tx, *clinic_id).await? {
                return Err(UserError::ReferenceNotFound("clinic".to_string()));
            }
        }

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
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        match &new_user.profile {
            RoleProfile::Doctor { specialty, clinic_id } => {
                sqlx::query("INSERT INTO doctors (user_id, specialty, clinic_id) VALUES (?, ?, ?)")
                    .bind(user.id)
                    .bind(specialty)
                    .bind(clinic_id)
                    .execute(&mut *tx)
                    .await?;
            }
            RoleProfile::Secretary => {
                sqlx::query("INSERT INTO secretaries (user_id) VALUES (?)")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await?;
            }
            RoleProfile::Patient => {
                sqlx::query("INSERT INTO patients (user_id, name, email) VALUES (?, ?, ?)")
                    .bind(user.id)
                    .bind(&user.name)
                    .bind(&user.email)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let account = load_account(&mut tx, user).await?;
        tx.commit().await?;

        info!("User created with ID: {}", account.user.id);
        Ok(account)
    }

    pub async fn get_user_by_tc(&self, tc_no: &str) -> Result<UserAccount, UserError> {
        let mut conn = self.db.acquire().await?;
        let user = find_by_tc(&mut conn, tc_no).await?.ok_or(UserError::NotFound)?;
        Ok(load_account(&mut conn, user).await?)
    }

    pub async fn update_user_by_tc(
        &self,
        tc_no: &str,
        request: UpdateUserRequest,
    ) -> Result<UserAccount, UserError> {
        debug!("Updating user: {}", tc_no);

        // hash before the transaction so the connection is not held across argon2
        let password_hash = match request.password {
            Some(password) => Some(hash_password_blocking(password).await?),
            None => None,
        };
        let name = request.name.as_deref().map(str::trim);
        let email = request.email.as_deref().map(|email| email.trim().to_lowercase());

        let mut tx = begin_write(&self.db).await?;
        let user = find_by_tc(&mut tx, tc_no).await?.ok_or(UserError::NotFound)?;

        if user.role != Role::Doctor && (request.specialty.is_some() || request.clinic_id.is_some()) {
            return Err(UserError::MissingRoleFields(
                "specialty and clinic_id only apply to doctors".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE users SET name = COALESCE(?, name), email = COALESCE(?, email), \
             password_hash = COALESCE(?, password_hash), birth_date = COALESCE(?, birth_date) \
             WHERE id = ?",
        )
        .bind(name)
        .bind(&email)
        .bind(&password_hash)
        .bind(request.birth_date)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        match user.role {
            Role::Doctor => {
                if let Some(clinic_id) = request.clinic_id {
                    if !clinic_exists(&mut tx, clinic_id).await? {
                        return Err(UserError::ReferenceNotFound("clinic".to_string()));
                    }
                }
                sqlx::query(
                    "UPDATE doctors SET specialty = COALESCE(?, specialty), \
                     clinic_id = COALESCE(?, clinic_id) WHERE user_id = ?",
                )
                .bind(request.specialty.as_deref().map(str::trim))
                .bind(request.clinic_id)
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
            }
            Role::Patient => {
                sqlx::query(
                    "UPDATE patients SET name = COALESCE(?, name), email = COALESCE(?, email) \
                     WHERE user_id = ?",
                )
                .bind(name)
                .bind(&email)
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
            }
            Role::Secretary => {}
        }

        let user = find_by_tc(&mut tx, tc_no).await?.ok_or(UserError::NotFound)?;
        let account = load_account(&mut tx, user).await?;
        tx.commit().await?;

        info!("User updated: {}", account.user.id);
        Ok(account)
    }

    /// Refuses while the user's doctor or patient row is referenced by appointments.
    pub async fn delete_user_by_tc(&self, tc_no: &str) -> Result<(), UserError> {
        debug!("Deleting user: {}", tc_no);

        let result = sqlx::query("DELETE FROM users WHERE tc_no = ?")
            .bind(tc_no)
            .execute(&self.db)
            .await
            .map_err(|e| match constraint_violation(&e) {
                Some(ConstraintViolation::ForeignKey) => {
                    warn!("Refusing to delete user {} with appointments", tc_no);
                    UserError::InUse
                }
                _ => UserError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }

        info!("User deleted: {}", tc_no);
        Ok(())
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, UserError> {
        let doctors = sqlx::query_as::<_, DoctorSummary>(
            "SELECT u.id, u.name, u.tc_no, u.email, u.birth_date, u.joined_at, \
                    d.specialty, d.clinic_id, c.name AS clinic_name \
             FROM doctors d \
             JOIN users u ON u.id = d.user_id \
             JOIN clinics c ON c.id = d.clinic_id \
             ORDER BY u.name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(doctors)
    }

    pub async fn list_patients(&self) -> Result<Vec<PatientSummary>, UserError> {
        let patients = sqlx::query_as::<_, PatientSummary>(
            "SELECT u.id, p.name, u.tc_no, p.email, u.birth_date, u.joined_at \
             FROM patients p \
             JOIN users u ON u.id = p.user_id \
             ORDER BY p.name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(patients)
    }

    async fn ensure_unique(&self, tc_no: &str, email: &str) -> Result<(), UserError> {
        let existing: Option<(String, String)> =
            sqlx::query_as("SELECT tc_no, email FROM users WHERE tc_no = ? OR email = ? LIMIT 1")
                .bind(tc_no)
                .bind(email)
                .fetch_optional(&self.db)
                .await?;

        match existing {
            Some((existing_tc, _)) if existing_tc == tc_no => {
                Err(UserError::DuplicateUser("tc_no".to_string()))
            }
            Some(_) => Err(UserError::DuplicateUser("email".to_string())),
            None => Ok(()),
        }
    }
}

async fn find_by_tc(conn: &mut SqliteConnection, tc_no: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {} FROM users WHERE tc_no = ?", USER_PROFILE_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(tc_no)
        .fetch_optional(conn)
        .await
}

async fn clinic_exists(conn: &mut SqliteConnection, clinic_id: Uuid) -> Result<bool, sqlx::Error> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM clinics WHERE id = ?")
        .bind(clinic_id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

async fn load_account(conn: &mut SqliteConnection, user: User) -> Result<UserAccount, sqlx::Error> {
    let record = match user.role {
        Role::Doctor => RoleRecord::Doctor(
            sqlx::query_as::<_, DoctorRecord>(
                "SELECT d.specialty, d.clinic_id, c.name AS clinic_name \
                 FROM doctors d JOIN clinics c ON c.id = d.clinic_id \
                 WHERE d.user_id = ?",
            )
            .bind(user.id)
            .fetch_one(&mut *conn)
            .await?,
        ),
        Role::Secretary => RoleRecord::Secretary(SecretaryRecord {}),
        Role::Patient => RoleRecord::Patient(
            sqlx::query_as::<_, PatientRecord>("SELECT name, email FROM patients WHERE user_id = ?")
                .bind(user.id)
                .fetch_one(&mut *conn)
                .await?,
        ),
    };

    Ok(UserAccount { user, record })
}

fn map_write_error(err: sqlx::Error) -> UserError {
    match constraint_violation(&err) {
        Some(ConstraintViolation::Unique) => {
            let message = err
                .as_database_error()
                .map(|db| db.message().to_string())
                .unwrap_or_default();
            let field = if message.contains("email") { "email" } else { "tc_no" };
            UserError::DuplicateUser(field.to_string())
        }
        _ => UserError::Database(err),
    }
}
