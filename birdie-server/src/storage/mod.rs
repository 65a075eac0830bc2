pub mod models;
pub mod schema;

use birdie_shared::auth::Role;
use birdie_shared::domain::Presence;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{
    Carnet, Kid, KidNote, NewCarnet, NewKid, NewKidNote, NewTeacher, NewTeacherNote, NewUser,
    Teacher, TeacherNote, User, encode_presence,
};
use tracing::{debug, trace};

/// Kid note joined with the (possibly missing) kid it belongs to.
pub type KidNoteWithKid = (KidNote, Option<String>, Option<String>, Option<i64>);
/// Teacher note joined with the (possibly missing) teacher who wrote it.
pub type TeacherNoteWithTeacher = (TeacherNote, Option<String>, Option<String>, Option<i64>);

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// A stored value could not be interpreted.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    /// Checks out a pooled connection on the blocking pool and runs `f` with it.
    async fn run<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            f(&mut *conn)
        })
        .await?
    }

    /// Upsert configured admin accounts, promoting existing users.
    pub async fn seed_admins(&self, emails: &[String]) -> Result<(), StorageError> {
        use schema::users;
        let emails = emails.to_owned();
        self.run(move |conn| {
            for email in &emails {
                let row = NewUser {
                    full_name: email,
                    email,
                    role: Role::Admin.as_str(),
                };
                diesel::insert_into(users::table)
                    .values(&row)
                    .on_conflict(users::email)
                    .do_update()
                    .set(users::role.eq(Role::Admin.as_str()))
                    .execute(conn)?;
                debug!(email = %email, "seeded admin user");
            }
            Ok(())
        })
        .await
    }

    // Users

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        use schema::users;
        let email = email.to_string();
        self.run(move |conn| {
            Ok(users::table
                .filter(users::email.eq(&email))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Returns the user with `email`, creating it as a teacher when missing.
    pub async fn get_or_create_user(
        &self,
        email: &str,
        full_name: &str,
    ) -> Result<User, StorageError> {
        use schema::users;
        let email = email.to_string();
        let full_name = full_name.to_string();
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<User, StorageError> {
                let existing = users::table
                    .filter(users::email.eq(&email))
                    .select(User::as_select())
                    .first(conn)
                    .optional()?;
                if let Some(user) = existing {
                    return Ok(user);
                }
                trace!(email = %email, "creating user with default role");
                Ok(diesel::insert_into(users::table)
                    .values(&NewUser {
                        full_name: &full_name,
                        email: &email,
                        role: Role::Teacher.as_str(),
                    })
                    .returning(User::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }

    // Teachers

    pub async fn create_teacher(&self, name: &str, surname: &str) -> Result<Teacher, StorageError> {
        use schema::teachers;
        let name = name.to_string();
        let surname = surname.to_string();
        self.run(move |conn| {
            Ok(diesel::insert_into(teachers::table)
                .values(&NewTeacher {
                    name: &name,
                    surname: &surname,
                })
                .returning(Teacher::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn list_teachers(&self) -> Result<Vec<Teacher>, StorageError> {
        use schema::teachers;
        self.run(|conn| {
            Ok(teachers::table
                .order((teachers::name.asc(), teachers::id.asc()))
                .select(Teacher::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_teacher(&self, teacher_id: i64) -> Result<Option<Teacher>, StorageError> {
        use schema::teachers;
        self.run(move |conn| {
            Ok(teachers::table
                .find(teacher_id)
                .select(Teacher::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    // Kids

    pub async fn create_kid(&self, name: &str, surname: &str) -> Result<Kid, StorageError> {
        use schema::kids;
        let name = name.to_string();
        let surname = surname.to_string();
        self.run(move |conn| {
            Ok(diesel::insert_into(kids::table)
                .values(&NewKid {
                    name: &name,
                    surname: &surname,
                })
                .returning(Kid::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn list_kids(&self) -> Result<Vec<Kid>, StorageError> {
        use schema::kids;
        self.run(|conn| {
            Ok(kids::table
                .order(kids::id.asc())
                .select(Kid::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_kid(&self, kid_id: i64) -> Result<Option<Kid>, StorageError> {
        use schema::kids;
        self.run(move |conn| {
            Ok(kids::table
                .find(kid_id)
                .select(Kid::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    // Kid notes

    /// Inserts the kid's note for `date`. Returns `None` when that day already
    /// has a note.
    pub async fn create_kid_note(
        &self,
        kid_id: i64,
        note: &str,
        presence: &[Presence],
        has_meal: bool,
        date: NaiveDate,
    ) -> Result<Option<KidNote>, StorageError> {
        use schema::kid_notes;
        let note = note.to_string();
        let presence = encode_presence(presence);
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Option<KidNote>, StorageError> {
                let taken: i64 = kid_notes::table
                    .filter(kid_notes::kid_id.eq(kid_id))
                    .filter(kid_notes::date.eq(date))
                    .count()
                    .get_result(conn)?;
                if taken > 0 {
                    return Ok(None);
                }
                let inserted = diesel::insert_into(kid_notes::table)
                    .values(&NewKidNote {
                        note: &note,
                        kid_id,
                        presence: &presence,
                        has_meal,
                        date,
                    })
                    .returning(KidNote::as_returning())
                    .get_result(conn);
                match inserted {
                    Ok(row) => Ok(Some(row)),
                    Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                        Ok(None)
                    }
                    Err(e) => Err(e.into()),
                }
            })
        })
        .await
    }

    pub async fn list_kid_notes(&self) -> Result<Vec<KidNote>, StorageError> {
        use schema::kid_notes;
        self.run(|conn| {
            Ok(kid_notes::table
                .order(kid_notes::id.asc())
                .select(KidNote::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_kid_note(&self, note_id: i64) -> Result<Option<KidNote>, StorageError> {
        use schema::kid_notes;
        self.run(move |conn| {
            Ok(kid_notes::table
                .find(note_id)
                .select(KidNote::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Updates text, presence and meal flag; date and kid stay fixed.
    pub async fn update_kid_note(
        &self,
        note_id: i64,
        note: &str,
        presence: &[Presence],
        has_meal: bool,
    ) -> Result<Option<KidNote>, StorageError> {
        use schema::kid_notes;
        let note = note.to_string();
        let presence = encode_presence(presence);
        self.run(move |conn| {
            Ok(diesel::update(kid_notes::table.find(note_id))
                .set((
                    kid_notes::note.eq(&note),
                    kid_notes::presence.eq(&presence),
                    kid_notes::has_meal.eq(has_meal),
                ))
                .returning(KidNote::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    /// Notes with `from <= date <= to`, joined with their kid.
    pub async fn list_kid_notes_by_period(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KidNoteWithKid>, StorageError> {
        use schema::{kid_notes, kids};
        self.run(move |conn| {
            Ok(kid_notes::table
                .left_join(kids::table.on(kids::id.eq(kid_notes::kid_id)))
                .filter(kid_notes::date.ge(from))
                .filter(kid_notes::date.le(to))
                .order((kid_notes::date.asc(), kid_notes::id.asc()))
                .select((
                    KidNote::as_select(),
                    kids::name.nullable(),
                    kids::surname.nullable(),
                    kids::id.nullable(),
                ))
                .load::<KidNoteWithKid>(conn)?)
        })
        .await
    }

    // Teacher notes

    pub async fn create_teacher_note(
        &self,
        teacher_id: i64,
        note: &str,
        date: NaiveDate,
    ) -> Result<TeacherNote, StorageError> {
        use schema::teacher_notes;
        let note = note.to_string();
        self.run(move |conn| {
            Ok(diesel::insert_into(teacher_notes::table)
                .values(&NewTeacherNote {
                    note: &note,
                    teacher_id: Some(teacher_id),
                    date,
                })
                .returning(TeacherNote::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn list_teacher_notes(&self) -> Result<Vec<TeacherNote>, StorageError> {
        use schema::teacher_notes;
        self.run(|conn| {
            Ok(teacher_notes::table
                .order(teacher_notes::id.asc())
                .select(TeacherNote::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_teacher_note(&self, note_id: i64) -> Result<Option<TeacherNote>, StorageError> {
        use schema::teacher_notes;
        self.run(move |conn| {
            Ok(teacher_notes::table
                .find(note_id)
                .select(TeacherNote::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Only the note text is editable.
    pub async fn update_teacher_note(
        &self,
        note_id: i64,
        note: &str,
    ) -> Result<Option<TeacherNote>, StorageError> {
        use schema::teacher_notes;
        let note = note.to_string();
        self.run(move |conn| {
            Ok(diesel::update(teacher_notes::table.find(note_id))
                .set(teacher_notes::note.eq(&note))
                .returning(TeacherNote::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    pub async fn list_teacher_notes_by_date(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<TeacherNote>, StorageError> {
        use schema::teacher_notes;
        self.run(move |conn| {
            Ok(teacher_notes::table
                .filter(teacher_notes::date.eq(day))
                .order(teacher_notes::id.asc())
                .select(TeacherNote::as_select())
                .load(conn)?)
        })
        .await
    }

    /// Notes with `from <= date <= to`, joined with their teacher.
    pub async fn list_teacher_notes_by_period(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TeacherNoteWithTeacher>, StorageError> {
        use schema::{teacher_notes, teachers};
        self.run(move |conn| {
            Ok(teacher_notes::table
                .left_join(teachers::table.on(teacher_notes::teacher_id.eq(teachers::id.nullable())))
                .filter(teacher_notes::date.ge(from))
                .filter(teacher_notes::date.le(to))
                .order((teacher_notes::date.asc(), teacher_notes::id.asc()))
                .select((
                    TeacherNote::as_select(),
                    teachers::name.nullable(),
                    teachers::surname.nullable(),
                    teachers::id.nullable(),
                ))
                .load::<TeacherNoteWithTeacher>(conn)?)
        })
        .await
    }

    // Carnets

    pub async fn create_carnet(
        &self,
        kid_id: i64,
        date: NaiveDate,
        quantity: i32,
    ) -> Result<Carnet, StorageError> {
        use schema::carnets;
        self.run(move |conn| {
            Ok(diesel::insert_into(carnets::table)
                .values(&NewCarnet {
                    date,
                    quantity,
                    kid_id,
                })
                .returning(Carnet::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn list_carnets(&self) -> Result<Vec<Carnet>, StorageError> {
        use schema::carnets;
        self.run(|conn| {
            Ok(carnets::table
                .order(carnets::id.asc())
                .select(Carnet::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_carnet(&self, carnet_id: i64) -> Result<Option<Carnet>, StorageError> {
        use schema::carnets;
        self.run(move |conn| {
            Ok(carnets::table
                .find(carnet_id)
                .select(Carnet::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Changes date and quantity; the owning kid is never reassigned.
    pub async fn update_carnet(
        &self,
        carnet_id: i64,
        date: NaiveDate,
        quantity: i32,
    ) -> Result<Option<Carnet>, StorageError> {
        use schema::carnets;
        self.run(move |conn| {
            Ok(diesel::update(carnets::table.find(carnet_id))
                .set((carnets::date.eq(date), carnets::quantity.eq(quantity)))
                .returning(Carnet::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    // Ignore the result rows; Diesel's execute is fine for PRAGMAs
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys=ON;").execute(conn)?;
    Ok(())
}

impl User {
    pub fn role(&self) -> Result<Role, StorageError> {
        self.role.parse().map_err(StorageError::InvalidData)
    }
}
