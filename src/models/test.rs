use super::*;
use crate::schema;

fn unreachable_config() -> Config {
    // nothing listens on port 1
    Config {
        host: "127.0.0.1".to_owned(),
        port: 1,
        database: "project".to_owned(),
        user: "plant_app".to_owned(),
        password: "1234".to_owned(),
        admin_user: "postgres".to_owned(),
    }
}

#[test]
fn identifier_allowlist() {
    assert!(valid_identifier("project"));
    assert!(valid_identifier("plant_app"));
    assert!(valid_identifier("_internal2"));

    assert!(!valid_identifier(""));
    assert!(!valid_identifier("2fast"));
    assert!(!valid_identifier("Project"));
    assert!(!valid_identifier("pro-ject"));
    assert!(!valid_identifier("project; DROP DATABASE project"));
    assert!(!valid_identifier("pro\"ject"));
}

#[test]
fn tables_created_in_declared_order() {
    for (table, stmnt) in schema::TABLES.iter().zip(schema::CREATE_TABLES.iter()) {
        assert!(
            stmnt.contains(&format!("public.{} (", table)),
            "statement for '{}' out of order",
            table
        );
        assert!(stmnt.contains("IF NOT EXISTS"));
    }
}

#[test]
fn foreign_keys_reference_earlier_tables() {
    let order = |name: &str| {
        schema::TABLES
            .iter()
            .position(|t| *t == name)
            .unwrap_or_else(|| panic!("unknown table '{}'", name))
    };

    for fk in schema::FOREIGN_KEYS.iter() {
        assert!(order(fk.references) < order(fk.table));
        assert!(fk.ddl.contains(fk.name));
        assert!(fk.ddl.contains(&format!("public.{}", fk.table)));
        assert!(fk.ddl.contains(&format!("public.{} (", fk.references)));
    }
}

#[test]
fn foreign_key_names_are_unique() {
    for (i, fk) in schema::FOREIGN_KEYS.iter().enumerate() {
        for other in schema::FOREIGN_KEYS.iter().skip(i + 1) {
            assert_ne!(fk.name, other.name);
        }
    }
}

#[test]
fn sequences_wired_to_provisioned_tables() {
    for seq in ["experiment_id_seq", "plant_id_seq"].iter() {
        let create = schema::CREATE_SEQUENCES
            .iter()
            .position(|s| s.contains("CREATE SEQUENCE") && s.contains(seq))
            .unwrap();
        let owned = schema::CREATE_SEQUENCES
            .iter()
            .position(|s| s.contains("OWNED BY") && s.contains(seq))
            .unwrap();
        let default = schema::CREATE_SEQUENCES
            .iter()
            .position(|s| s.contains("SET DEFAULT") && s.contains(seq))
            .unwrap();
        assert!(create < owned && owned < default);

        let table = seq.trim_end_matches("_id_seq");
        assert!(schema::TABLES.contains(&table));
        assert!(schema::CREATE_SEQUENCES[owned].contains(&format!("public.{}.id", table)));
    }
}

#[tokio::test]
async fn create_database_survives_unreachable_server() {
    // reports the connectivity error and returns
    create_database(&unreachable_config()).await;
}

#[tokio::test]
async fn create_tables_survives_unreachable_server() {
    create_tables(&unreachable_config()).await;
}

#[tokio::test]
async fn connect_returns_none_for_unreachable_server() {
    assert!(establish_db_connection(&unreachable_config())
        .await
        .is_none());
}

#[tokio::test]
#[ignore] // needs a reachable postgres, configured via .env
async fn provisioning_is_idempotent() {
    dotenv::dotenv().ok();
    let config = Config::from_env().unwrap();

    create_database(&config).await;
    create_tables(&config).await;
    // second run must skip every object without erroring
    create_database(&config).await;
    create_tables(&config).await;

    let pool = establish_db_connection(&config).await.unwrap();
    for fk in schema::FOREIGN_KEYS.iter() {
        let count: (i64,) = sqlx::query_as("SELECT count(*) FROM pg_constraint WHERE conname = $1")
            .bind(fk.name)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(1, count.0, "constraint '{}' duplicated or missing", fk.name);
    }
    check_schema(&pool).await.unwrap();
}
