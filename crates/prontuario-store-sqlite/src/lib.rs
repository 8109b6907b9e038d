use std::str::FromStr;

use chrono::{DateTime, Utc};
use prontuario_reports::{ReportLog, ReportLogEntry, ReportLogError};
use prontuario_storage::{
    CreateEntryParams, CreatePrincipalParams, CreateStudentParams, Credential,
    CredentialFingerprint, Deletion, EntryFilter, EntryId, EntryOrder, HealthProfile, LoginRecord,
    MedicalEntry, NewCredential, Principal, PrincipalId, Role, SoftDelete, Specialty, Store,
    StoreError, Student, StudentId,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    QueryBuilder, Sqlite, SqlitePool,
};
use uuid::Uuid;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const ENTRY_SELECT: &str = "SELECT e.id, e.student_id, e.author_id, hp.specialty, e.created_at,
            e.description, e.notes, e.deleted, e.deleted_by, e.deleted_at, e.delete_reason
     FROM medical_entries e
     LEFT JOIN health_profiles hp ON hp.principal_id = e.author_id";

type EntryRow = (
    i64,
    String,
    String,
    Option<String>,
    i64,
    String,
    Option<String>,
    bool,
    Option<String>,
    Option<i64>,
    Option<String>,
);

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// `~/.prontuario/store.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".prontuario");
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let path = dir.join("store.db");
        let url = format!("sqlite://{}", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        // One connection: an in-memory database lives and dies with it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    let s = e.to_string();
    if s.contains("UNIQUE") {
        StoreError::AlreadyExists
    } else if s.contains("FOREIGN KEY") {
        StoreError::NotFound
    } else {
        StoreError::Backend(s)
    }
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {ms}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(|e| StoreError::Backend(e.to_string()))
}

fn parse_specialty(s: &str) -> Result<Specialty, StoreError> {
    Specialty::from_str(s).map_err(|e| StoreError::Backend(e.to_string()))
}

fn entry_from_row(row: EntryRow) -> Result<MedicalEntry, StoreError> {
    let (
        id,
        student_id,
        author_id,
        specialty,
        created_at,
        description,
        notes,
        deleted,
        deleted_by,
        deleted_at,
        delete_reason,
    ) = row;

    let deletion = match (deleted, deleted_by, deleted_at, delete_reason) {
        (false, _, _, _) => None,
        (true, Some(by), Some(at), Some(reason)) => Some(Deletion {
            deleted_by: PrincipalId(parse_uuid(&by)?),
            deleted_at: from_millis(at)?,
            reason,
        }),
        (true, _, _, _) => {
            return Err(StoreError::Backend(format!(
                "entry {id} is deleted but its deletion fields are incomplete"
            )))
        }
    };

    Ok(MedicalEntry {
        id: EntryId(id),
        student_id: StudentId(parse_uuid(&student_id)?),
        author_id: PrincipalId(parse_uuid(&author_id)?),
        author_specialty: specialty.as_deref().map(parse_specialty).transpose()?,
        created_at: from_millis(created_at)?,
        description,
        notes,
        deletion,
    })
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Principals ─────────────────────────────

    async fn create_principal(
        &self,
        params: &CreatePrincipalParams,
    ) -> Result<PrincipalId, StoreError> {
        let principal_id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO principals(id,email,first_name,last_name,role,active,password_hash,password_salt,created_at)
             VALUES(?,?,?,?,?,1,?,?,?)",
        )
        .bind(principal_id.to_string())
        .bind(&params.email)
        .bind(&params.first_name)
        .bind(&params.last_name)
        .bind(params.role.as_str())
        .bind(&params.password_hash)
        .bind(&params.password_salt)
        .bind(millis(Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(map_insert_err)?;

        if let Some(profile) = &params.health_profile {
            sqlx::query(
                "INSERT INTO health_profiles(principal_id,specialty,council_number) VALUES(?,?,?)",
            )
            .bind(principal_id.to_string())
            .bind(profile.specialty.as_str())
            .bind(&profile.council_number)
            .execute(&mut *tx)
            .await
            .map_err(map_insert_err)?;
        }

        tx.commit().await.map_err(backend)?;
        Ok(PrincipalId(principal_id))
    }

    async fn get_principal(&self, principal_id: &PrincipalId) -> Result<Principal, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, String, bool, i64)>(
            "SELECT email,first_name,last_name,role,active,created_at FROM principals WHERE id=?",
        )
        .bind(principal_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let (email, first_name, last_name, role, active, created_at) =
            row.ok_or(StoreError::NotFound)?;
        Ok(Principal {
            id: principal_id.clone(),
            email,
            first_name,
            last_name,
            role: Role::from_str(&role).map_err(|e| StoreError::Backend(e.to_string()))?,
            active,
            health_profile: None,
            created_at: from_millis(created_at)?,
        })
    }

    async fn get_health_profile(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<HealthProfile, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT specialty,council_number FROM health_profiles WHERE principal_id=?",
        )
        .bind(principal_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((specialty, council_number)) => Ok(HealthProfile {
                specialty: parse_specialty(&specialty)?,
                council_number,
            }),
        }
    }

    async fn get_login(&self, email: &str) -> Result<LoginRecord, StoreError> {
        let row = sqlx::query_as::<_, (String, String, Vec<u8>, bool)>(
            "SELECT id,password_hash,password_salt,active FROM principals WHERE email=?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let (id, password_hash, password_salt, active) = row.ok_or(StoreError::NotFound)?;
        Ok(LoginRecord {
            principal_id: PrincipalId(parse_uuid(&id)?),
            password_hash,
            password_salt,
            active,
        })
    }

    async fn set_principal_active(
        &self,
        principal_id: &PrincipalId,
        active: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE principals SET active=? WHERE id=?")
            .bind(active)
            .bind(principal_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Students ───────────────────────────────

    async fn create_student(&self, params: &CreateStudentParams) -> Result<StudentId, StoreError> {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO students(id,name,created_at) VALUES(?,?,?)")
            .bind(id.to_string())
            .bind(&params.name)
            .bind(millis(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(map_insert_err)?;
        Ok(StudentId(id))
    }

    async fn get_student(&self, student_id: &StudentId) -> Result<Student, StoreError> {
        let row =
            sqlx::query_as::<_, (String, i64)>("SELECT name,created_at FROM students WHERE id=?")
                .bind(student_id.0.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((name, created_at)) => Ok(Student {
                id: student_id.clone(),
                name,
                created_at: from_millis(created_at)?,
            }),
        }
    }

    // ──────────────────────────── Credentials ─────────────────────────────

    async fn create_credential(&self, credential: &NewCredential) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO credentials(key_hash,principal_id,issued_at) VALUES(?,?,?)")
            .bind(&credential.fingerprint.0)
            .bind(credential.principal_id.0.to_string())
            .bind(millis(credential.issued_at))
            .execute(&self.pool)
            .await
            .map_err(map_insert_err)?;
        Ok(())
    }

    async fn get_credential(
        &self,
        fingerprint: &CredentialFingerprint,
    ) -> Result<Credential, StoreError> {
        let row = sqlx::query_as::<_, (String, i64)>(
            "SELECT principal_id,issued_at FROM credentials WHERE key_hash=?",
        )
        .bind(&fingerprint.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((principal_id, issued_at)) => Ok(Credential {
                fingerprint: fingerprint.clone(),
                principal_id: PrincipalId(parse_uuid(&principal_id)?),
                issued_at: from_millis(issued_at)?,
            }),
        }
    }

    async fn delete_credential(
        &self,
        fingerprint: &CredentialFingerprint,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE key_hash=?")
            .bind(&fingerprint.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_credential_if_issued_before(
        &self,
        fingerprint: &CredentialFingerprint,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE key_hash=? AND issued_at<=?")
            .bind(&fingerprint.0)
            .bind(millis(cutoff))
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_credentials_issued_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE issued_at<=?")
            .bind(millis(cutoff))
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }

    // ─────────────────────────── Medical entries ──────────────────────────

    async fn create_entry(&self, params: &CreateEntryParams) -> Result<MedicalEntry, StoreError> {
        let result = sqlx::query(
            "INSERT INTO medical_entries(student_id,author_id,created_at,description,notes)
             VALUES(?,?,?,?,?)",
        )
        .bind(params.student_id.0.to_string())
        .bind(params.author_id.0.to_string())
        .bind(millis(params.created_at))
        .bind(&params.description)
        .bind(&params.notes)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;

        self.get_entry(EntryId(result.last_insert_rowid())).await
    }

    async fn get_entry(&self, entry_id: EntryId) -> Result<MedicalEntry, StoreError> {
        let sql = format!("{ENTRY_SELECT} WHERE e.id=?");
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(entry_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        entry_from_row(row.ok_or(StoreError::NotFound)?)
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<MedicalEntry>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(ENTRY_SELECT);
        qb.push(" WHERE e.deleted = 0");
        if let Some(student_id) = &filter.student_id {
            qb.push(" AND e.student_id = ")
                .push_bind(student_id.0.to_string());
        }
        if let Some(specialty) = filter.author_specialty {
            qb.push(" AND hp.specialty = ").push_bind(specialty.as_str());
        }
        if let Some(from) = filter.created_from {
            qb.push(" AND e.created_at >= ").push_bind(millis(from));
        }
        if let Some(to) = filter.created_to {
            qb.push(" AND e.created_at <= ").push_bind(millis(to));
        }
        qb.push(match filter.order {
            EntryOrder::NewestFirst => " ORDER BY e.created_at DESC, e.id DESC",
            EntryOrder::OldestFirst => " ORDER BY e.created_at ASC, e.id ASC",
        });

        let rows = qb
            .build_query_as::<EntryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.into_iter().map(entry_from_row).collect()
    }

    async fn soft_delete_entry(
        &self,
        entry_id: EntryId,
        params: &SoftDelete,
    ) -> Result<MedicalEntry, StoreError> {
        // Check-and-set in one statement; of two racing deletes only one updates a row.
        let result = sqlx::query(
            "UPDATE medical_entries
             SET deleted=1, deleted_by=?, deleted_at=?, delete_reason=?
             WHERE id=? AND deleted=0",
        )
        .bind(params.deleted_by.0.to_string())
        .bind(millis(params.deleted_at))
        .bind(&params.reason)
        .bind(entry_id.0)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_as::<_, (i64,)>("SELECT id FROM medical_entries WHERE id=?")
                .bind(entry_id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
            return Err(if exists.is_some() {
                StoreError::Conflict
            } else {
                StoreError::NotFound
            });
        }

        self.get_entry(entry_id).await
    }
}

#[async_trait::async_trait]
impl ReportLog for SqliteStore {
    async fn record(&self, entry: ReportLogEntry) -> Result<(), ReportLogError> {
        sqlx::query("INSERT INTO report_logs(id,user_id,date,report_type) VALUES(?,?,?,?)")
            .bind(entry.id.0.to_string())
            .bind(entry.user_id.to_string())
            .bind(millis(entry.date))
            .bind(entry.report_type.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let s = e.to_string();
                if s.contains("UNIQUE") {
                    ReportLogError::Duplicate(entry.id)
                } else {
                    ReportLogError::Database(s)
                }
            })?;
        Ok(())
    }
}
