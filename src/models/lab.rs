use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, sqlite::SqliteRow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfiguration {
    #[serde(default)]
    pub ram: Option<String>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub num_systems: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lab {
    pub id: String,
    pub name: String,
    pub location: String,
    pub capacity: i64,
    pub system_configuration: Option<SystemConfiguration>,
    pub num_projectors: i64,
    pub num_acs: i64,
    pub num_wall_mounted_fans: i64,
    pub lab_incharge: String,
    pub created_at: String,
}

// Manual FromRow: system_configuration lives in a JSON TEXT column.
impl FromRow<'_, SqliteRow> for Lab {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let system_configuration = row
            .try_get::<Option<String>, _>("system_configuration")?
            .map(|raw| serde_json::from_str::<SystemConfiguration>(&raw))
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "system_configuration".into(),
                source: Box::new(e),
            })?;

        Ok(Lab {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            location: row.try_get("location")?,
            capacity: row.try_get("capacity")?,
            system_configuration,
            num_projectors: row.try_get("num_projectors")?,
            num_acs: row.try_get("num_acs")?,
            num_wall_mounted_fans: row.try_get("num_wall_mounted_fans")?,
            lab_incharge: row.try_get("lab_incharge")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLabRequest {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub system_configuration: Option<SystemConfiguration>,
    #[serde(default)]
    pub num_projectors: Option<i64>,
    #[serde(default)]
    pub num_acs: Option<i64>,
    #[serde(default)]
    pub num_wall_mounted_fans: Option<i64>,
    pub lab_incharge: String,
}
