use rusqlite::Connection;

/// Initialize the main database schema (everything except audit logs)
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Customers (license owners; disabled customers cannot activate)
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            contact_email TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        );

        -- Licenses. Rows are never deleted (audit trail requirement);
        -- revocation and extension mutate in place.
        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
            license_key TEXT NOT NULL UNIQUE,
            tier TEXT NOT NULL CHECK (tier IN ('basic', 'pro', 'enterprise')),
            max_activations INTEGER NOT NULL CHECK (max_activations >= 1),
            features TEXT NOT NULL DEFAULT '[]',
            issued_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            revoked INTEGER NOT NULL DEFAULT 0,
            revoked_at INTEGER,
            revoked_reason TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_customer ON licenses(customer_id);

        -- Activations (hardware bindings). History is preserved: a
        -- deactivated-then-reactivated pair produces multiple rows, only
        -- one of which may be active at a time.
        CREATE TABLE IF NOT EXISTS activations (
            id TEXT PRIMARY KEY,
            license_id TEXT NOT NULL REFERENCES licenses(id) ON DELETE CASCADE,
            hardware_id TEXT NOT NULL,
            machine_name TEXT,
            os_info TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            activated_at INTEGER NOT NULL,
            deactivated_at INTEGER,
            last_phone_home INTEGER NOT NULL,
            last_ip_address TEXT
        );
        -- Core invariant: at most one ACTIVE row per (license, hardware) pair.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_activations_active_pair
            ON activations(license_id, hardware_id) WHERE is_active = 1;
        CREATE INDEX IF NOT EXISTS idx_activations_license ON activations(license_id, is_active);

        -- Release artifacts surfaced via phone-home and the gated download.
        CREATE TABLE IF NOT EXISTS releases (
            id TEXT PRIMARY KEY,
            version TEXT NOT NULL UNIQUE,
            file_name TEXT NOT NULL,
            sha256 TEXT NOT NULL,
            is_required INTEGER NOT NULL DEFAULT 0,
            released_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_releases_time ON releases(released_at DESC);
        "#,
    )?;
    Ok(())
}

/// Initialize the audit log database schema (separate DB file)
/// Optimized for append-only workload with WAL mode
pub fn init_audit_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 1000;
        PRAGMA journal_size_limit = 67108864;

        CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            timestamp INTEGER NOT NULL,
            license_id TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT,
            hardware_id TEXT,
            ip_address TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs(timestamp);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_license ON audit_logs(license_id, timestamp DESC);
        "#,
    )?;
    Ok(())
}
