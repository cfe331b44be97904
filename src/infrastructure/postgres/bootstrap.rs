//! Idempotent schema setup: the inventory table and the trigger that
//! publishes row changes on the notification channel.

use sqlx::PgPool;

/// Build the schema script for the given notification channel.
///
/// Every statement is `IF NOT EXISTS` / `CREATE OR REPLACE`, so the script can
/// run on every startup.
pub fn schema_sql(channel: &str) -> String {
    let channel = channel.replace('\'', "''");
    format!(
        r#"
CREATE TABLE IF NOT EXISTS inventory (
    id SERIAL PRIMARY KEY,
    name VARCHAR NOT NULL,
    quantity INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS ix_inventory_updated_at ON inventory (updated_at DESC);

CREATE OR REPLACE FUNCTION touch_inventory_updated_at() RETURNS trigger AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE OR REPLACE FUNCTION notify_inventory_change() RETURNS trigger AS $$
DECLARE
    row_data json;
BEGIN
    IF TG_OP = 'DELETE' THEN
        row_data = row_to_json(OLD);
    ELSE
        row_data = row_to_json(NEW);
    END IF;
    PERFORM pg_notify('{channel}', json_build_object('event', TG_OP, 'data', row_data)::text);
    RETURN NULL;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS inventory_touch_updated_at ON inventory;
CREATE TRIGGER inventory_touch_updated_at
    BEFORE UPDATE ON inventory
    FOR EACH ROW EXECUTE FUNCTION touch_inventory_updated_at();

DROP TRIGGER IF EXISTS inventory_notify_change ON inventory;
CREATE TRIGGER inventory_notify_change
    AFTER INSERT OR UPDATE OR DELETE ON inventory
    FOR EACH ROW EXECUTE FUNCTION notify_inventory_change();
"#
    )
}

/// Run the schema script inside one transaction.
pub async fn bootstrap_schema(pool: &PgPool, channel: &str) -> Result<(), sqlx::Error> {
    let sql = schema_sql(channel);

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(&sql).execute(&mut *tx).await?;
    tx.commit().await?;

    tracing::info!(channel = %channel, "Database schema ready (table, triggers, functions)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_notifies_on_configured_channel() {
        let sql = schema_sql("stock_updates");
        assert!(sql.contains("pg_notify('stock_updates'"));
        assert!(sql.contains("AFTER INSERT OR UPDATE OR DELETE ON inventory"));
    }

    #[test]
    fn test_channel_quotes_are_escaped() {
        let sql = schema_sql("bad'name");
        assert!(sql.contains("pg_notify('bad''name'"));
    }
}
