use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Lab, NewLabRequest, User, user::ROLE_LAB_PROGRAMMER};

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub role: String,
    pub lab_managed: Option<String>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, salt, role, lab_managed, \
                            secret_code, session_token, created_at";

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn insert_user(db: &SqlitePool, new: NewUser) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users \
            (id, username, email, password_hash, salt, role, lab_managed, \
             secret_code, session_token, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?)",
    )
    .bind(&id)
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.salt)
    .bind(&new.role)
    .bind(&new.lab_managed)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(User {
        id,
        username: new.username,
        email: new.email,
        password_hash: new.password_hash,
        salt: new.salt,
        role: new.role,
        lab_managed: new.lab_managed,
        secret_code: None,
        session_token: None,
        created_at: now,
    })
}

pub async fn set_session_token(
    db: &SqlitePool,
    user_id: &str,
    token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET session_token = ? WHERE id = ?")
        .bind(token)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_secret_code(
    db: &SqlitePool,
    user_id: &str,
    code: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET secret_code = ? WHERE id = ?")
        .bind(code)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn find_user_by_email_and_code(
    db: &SqlitePool,
    email: &str,
    code: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND secret_code = ?"
    ))
    .bind(email)
    .bind(code)
    .fetch_optional(db)
    .await
}

/// Stores the new password digest and clears the reset code in one update.
pub async fn update_password(
    db: &SqlitePool,
    user_id: &str,
    password_hash: &str,
    salt: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET password_hash = ?, salt = ?, secret_code = NULL WHERE id = ?",
    )
    .bind(password_hash)
    .bind(salt)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_programmer_for_lab(
    db: &SqlitePool,
    lab_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lab_managed = ? AND role = ?"
    ))
    .bind(lab_id)
    .bind(ROLE_LAB_PROGRAMMER)
    .fetch_optional(db)
    .await
}

const LAB_COLUMNS: &str = "id, name, location, capacity, system_configuration, num_projectors, \
                           num_acs, num_wall_mounted_fans, lab_incharge, created_at";

pub async fn find_lab_by_name(db: &SqlitePool, name: &str) -> Result<Option<Lab>, sqlx::Error> {
    sqlx::query_as::<_, Lab>(&format!("SELECT {LAB_COLUMNS} FROM labs WHERE name = ?"))
        .bind(name)
        .fetch_optional(db)
        .await
}

pub async fn insert_lab(db: &SqlitePool, req: NewLabRequest) -> Result<Lab, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let system_configuration_json = req
        .system_configuration
        .as_ref()
        .map(|c| serde_json::to_string(c))
        .transpose()
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let lab = Lab {
        id,
        name: req.name,
        location: req.location,
        capacity: req.capacity.unwrap_or(0),
        system_configuration: req.system_configuration,
        num_projectors: req.num_projectors.unwrap_or(0),
        num_acs: req.num_acs.unwrap_or(0),
        num_wall_mounted_fans: req.num_wall_mounted_fans.unwrap_or(0),
        lab_incharge: req.lab_incharge,
        created_at: now,
    };

    sqlx::query(
        "INSERT INTO labs \
            (id, name, location, capacity, system_configuration, num_projectors, \
             num_acs, num_wall_mounted_fans, lab_incharge, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&lab.id)
    .bind(&lab.name)
    .bind(&lab.location)
    .bind(lab.capacity)
    .bind(&system_configuration_json)
    .bind(lab.num_projectors)
    .bind(lab.num_acs)
    .bind(lab.num_wall_mounted_fans)
    .bind(&lab.lab_incharge)
    .bind(&lab.created_at)
    .execute(db)
    .await?;

    Ok(lab)
}

pub async fn fetch_labs_by_incharge(
    db: &SqlitePool,
    incharge_id: &str,
) -> Result<Vec<Lab>, sqlx::Error> {
    sqlx::query_as::<_, Lab>(&format!(
        "SELECT {LAB_COLUMNS} FROM labs WHERE lab_incharge = ? ORDER BY created_at DESC"
    ))
    .bind(incharge_id)
    .fetch_all(db)
    .await
}

pub async fn labs_managed_ids(
    db: &SqlitePool,
    incharge_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM labs WHERE lab_incharge = ? ORDER BY created_at DESC",
    )
    .bind(incharge_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SystemConfiguration;
    use crate::models::user::ROLE_LAB_INCHARGE;

    async fn setup_test_db() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn new_user(email: &str, role: &str) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: email.to_string(),
            password_hash: "digest".to_string(),
            salt: "salt".to_string(),
            role: role.to_string(),
            lab_managed: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let pool = setup_test_db().await;

        let user = insert_user(&pool, new_user("alice@example.com", ROLE_LAB_INCHARGE))
            .await
            .expect("Failed to insert user");
        assert_eq!(user.role, ROLE_LAB_INCHARGE);
        assert!(user.secret_code.is_none());

        let found = find_user_by_email(&pool, "alice@example.com")
            .await
            .expect("Failed to fetch user")
            .expect("User not found");
        assert_eq!(found.id, user.id);

        assert!(find_user_by_email(&pool, "bob@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_secret_code_roundtrip() {
        let pool = setup_test_db().await;
        let user = insert_user(&pool, new_user("alice@example.com", ROLE_LAB_INCHARGE))
            .await
            .unwrap();

        set_secret_code(&pool, &user.id, "123456").await.unwrap();
        let found = find_user_by_email_and_code(&pool, "alice@example.com", "123456")
            .await
            .unwrap();
        assert!(found.is_some());

        let wrong = find_user_by_email_and_code(&pool, "alice@example.com", "654321")
            .await
            .unwrap();
        assert!(wrong.is_none());

        update_password(&pool, &user.id, "new-digest", "new-salt")
            .await
            .unwrap();
        let cleared = find_user_by_email(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.password_hash, "new-digest");
        assert!(cleared.secret_code.is_none());
    }

    #[tokio::test]
    async fn test_insert_and_fetch_lab() {
        let pool = setup_test_db().await;
        let incharge = insert_user(&pool, new_user("alice@example.com", ROLE_LAB_INCHARGE))
            .await
            .unwrap();

        let lab = insert_lab(
            &pool,
            NewLabRequest {
                name: "CS-Lab-1".to_string(),
                location: "Block A".to_string(),
                capacity: Some(60),
                system_configuration: Some(SystemConfiguration {
                    ram: Some("16GB".to_string()),
                    cpu: Some("i7".to_string()),
                    storage: None,
                    os: Some("Ubuntu 22.04".to_string()),
                    num_systems: Some(30),
                }),
                num_projectors: Some(1),
                num_acs: None,
                num_wall_mounted_fans: None,
                lab_incharge: incharge.id.clone(),
            },
        )
        .await
        .expect("Failed to insert lab");
        assert_eq!(lab.capacity, 60);
        assert_eq!(lab.num_acs, 0);

        let found = find_lab_by_name(&pool, "CS-Lab-1")
            .await
            .unwrap()
            .expect("Lab not found");
        assert_eq!(found.id, lab.id);
        let config = found.system_configuration.expect("config missing");
        assert_eq!(config.ram.as_deref(), Some("16GB"));

        let labs = fetch_labs_by_incharge(&pool, &incharge.id).await.unwrap();
        assert_eq!(labs.len(), 1);
        let ids = labs_managed_ids(&pool, &incharge.id).await.unwrap();
        assert_eq!(ids, vec![lab.id]);
    }

    #[tokio::test]
    async fn test_programmer_lookup_by_lab() {
        let pool = setup_test_db().await;
        let incharge = insert_user(&pool, new_user("alice@example.com", ROLE_LAB_INCHARGE))
            .await
            .unwrap();
        let lab = insert_lab(
            &pool,
            NewLabRequest {
                name: "CS-Lab-1".to_string(),
                location: "Block A".to_string(),
                capacity: None,
                system_configuration: None,
                num_projectors: None,
                num_acs: None,
                num_wall_mounted_fans: None,
                lab_incharge: incharge.id.clone(),
            },
        )
        .await
        .unwrap();

        assert!(find_programmer_for_lab(&pool, &lab.id)
            .await
            .unwrap()
            .is_none());

        let mut programmer = new_user("bob@example.com", ROLE_LAB_PROGRAMMER);
        programmer.lab_managed = Some(lab.id.clone());
        insert_user(&pool, programmer).await.unwrap();

        let found = find_programmer_for_lab(&pool, &lab.id)
            .await
            .unwrap()
            .expect("Programmer not found");
        assert_eq!(found.email, "bob@example.com");
    }
}
