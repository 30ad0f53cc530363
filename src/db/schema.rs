use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Listed organisations. Coordinates are nullable: an entry whose
        -- address has not been geocoded simply has no map marker.
        CREATE TABLE IF NOT EXISTS organisations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            address TEXT,
            postcode TEXT,
            email TEXT,
            website TEXT,
            telephone TEXT,
            donation_info TEXT,
            publish_address INTEGER NOT NULL DEFAULT 0,
            publish_phone INTEGER NOT NULL DEFAULT 0,
            publish_email INTEGER NOT NULL DEFAULT 0,
            latitude REAL,
            longitude REAL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_organisations_updated ON organisations(updated_at DESC);

        -- Drop-down categories for search/filter
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS category_organisations (
            id TEXT PRIMARY KEY,
            organisation_id TEXT NOT NULL REFERENCES organisations(id) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            UNIQUE(organisation_id, category_id)
        );
        CREATE INDEX IF NOT EXISTS idx_category_organisations_org
            ON category_organisations(organisation_id);
        CREATE INDEX IF NOT EXISTS idx_category_organisations_category
            ON category_organisations(category_id);

        -- Users. organisation_id = the organisation they administer;
        -- pending_organisation_id = an outstanding admin request.
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            api_key TEXT NOT NULL UNIQUE,
            admin INTEGER NOT NULL DEFAULT 0,
            organisation_id TEXT REFERENCES organisations(id) ON DELETE SET NULL,
            pending_organisation_id TEXT REFERENCES organisations(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_api_key ON users(api_key);
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
    )
}
