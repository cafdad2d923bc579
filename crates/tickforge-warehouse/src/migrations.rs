use duckdb::Connection;

use crate::TableName;

struct Migration {
    version: &'static str,
}

impl Migration {
    fn sql(&self) -> String {
        match self.version {
            "0001_quote_tables" => format!(
                "{}\n{}",
                TableName::Stocks.create_sql(true),
                TableName::SilverStock.create_sql(true)
            ),
            other => unreachable!("unknown migration version {other}"),
        }
    }
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "0001_quote_tables",
}];

pub fn apply_migrations(connection: &Connection) -> Result<(), duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let query = format!(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = '{}'",
            escape_sql_string(migration.version)
        );
        let applied_count: i64 = connection.query_row(query.as_str(), [], |row| row.get(0))?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql().as_str())?;
            let insert = format!(
                "INSERT INTO schema_migrations (version) VALUES ('{}')",
                escape_sql_string(migration.version)
            );
            connection.execute_batch(insert.as_str())?;
        }
    }

    Ok(())
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
