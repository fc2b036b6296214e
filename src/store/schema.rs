pub const SCHEMA: &str = r#"
-- Sheets carry their column schema as a JSON document, independent of the
-- rows that reference them. Sheets are deactivated, never deleted.
CREATE TABLE IF NOT EXISTS sheets (
    name TEXT PRIMARY KEY,
    columns TEXT NOT NULL DEFAULT '[]',      -- JSON array of {name, kind}
    delegatable TEXT NOT NULL DEFAULT '[]',  -- JSON array of column names
    display_order INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1
);

-- Semi-structured rows: the data map's key set may drift from the sheet's
-- current column set. row_order is assigned max+1 per sheet and never reused.
CREATE TABLE IF NOT EXISTS rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet TEXT NOT NULL REFERENCES sheets(name),
    data TEXT NOT NULL DEFAULT '{}',         -- JSON string map
    row_order INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

-- Allowed values for select columns, matched to schema columns by
-- normalized field name at read time. A set may reference a field that no
-- longer exists in the schema.
CREATE TABLE IF NOT EXISTS option_sets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet TEXT NOT NULL,
    field TEXT NOT NULL,
    options TEXT NOT NULL DEFAULT '[]',      -- JSON array of strings
    active INTEGER NOT NULL DEFAULT 1,
    display_order INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(sheet, field)
);

-- Delegation tokens are retained for audit after expiry or row deletion, so
-- row_id carries no foreign key. used_at records the latest submission.
CREATE TABLE IF NOT EXISTS delegation_tokens (
    token TEXT PRIMARY KEY,
    sheet TEXT NOT NULL,
    row_id INTEGER NOT NULL,
    expires_at TEXT NOT NULL,
    issued_by TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    used_at TEXT
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_rows_sheet_order ON rows(sheet, row_order);
CREATE INDEX IF NOT EXISTS idx_option_sets_sheet ON option_sets(sheet);
CREATE INDEX IF NOT EXISTS idx_delegation_tokens_row ON delegation_tokens(row_id);
"#;
