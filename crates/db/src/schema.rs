use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Channel on which every document change is announced as `<app_id>/<collection>`.
pub const CHANGE_CHANNEL: &str = "caseta_documents";

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create documents table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            app_id VARCHAR(255) NOT NULL,
            collection VARCHAR(64) NOT NULL,
            key VARCHAR(255) NOT NULL,
            data JSONB NOT NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            PRIMARY KEY (app_id, collection, key)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create change notification function
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION notify_document_change() RETURNS trigger AS $$
        BEGIN
            IF TG_OP = 'DELETE' THEN
                PERFORM pg_notify('caseta_documents', OLD.app_id || '/' || OLD.collection);
            ELSE
                PERFORM pg_notify('caseta_documents', NEW.app_id || '/' || NEW.collection);
            END IF;
            RETURN NULL;
        END;
        $$ LANGUAGE plpgsql;
        "#,
    )
    .execute(pool)
    .await?;

    // Recreate the trigger so schema upgrades pick up the current function
    sqlx::query("DROP TRIGGER IF EXISTS documents_notify ON documents;")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER documents_notify
        AFTER INSERT OR UPDATE OR DELETE ON documents
        FOR EACH ROW EXECUTE FUNCTION notify_document_change();
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
