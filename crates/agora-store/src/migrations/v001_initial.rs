//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `categories`, `posts`, and
//! `comments`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL DEFAULT 'member',   -- 'member' | 'admin'
    avatar_url  TEXT,
    is_banned   INTEGER NOT NULL DEFAULT 0,       -- boolean 0/1
    ban_reason  TEXT,
    ban_until   TEXT,                             -- ISO-8601 / RFC-3339
    create_time TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Categories
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    icon        TEXT,
    post_count  INTEGER NOT NULL DEFAULT 0,       -- derived cache, see posts
    sort_order  INTEGER NOT NULL DEFAULT 0,       -- higher sorts first
    is_active   INTEGER NOT NULL DEFAULT 1,       -- boolean 0/1
    create_time TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id     INTEGER NOT NULL,               -- FK -> users(id)
    title         TEXT NOT NULL,
    content       TEXT NOT NULL,
    summary       TEXT NOT NULL,
    category_id   INTEGER NOT NULL,               -- FK -> categories(id)
    category_name TEXT NOT NULL,                  -- denormalized snapshot
    cover_image   TEXT,
    view_count    INTEGER NOT NULL DEFAULT 0,
    like_count    INTEGER NOT NULL DEFAULT 0,
    collect_count INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    is_pinned     INTEGER NOT NULL DEFAULT 0,     -- boolean 0/1
    is_essence    INTEGER NOT NULL DEFAULT 0,     -- boolean 0/1
    status        INTEGER NOT NULL,               -- lifecycle code 0..4
    create_time   TEXT NOT NULL,
    update_time   TEXT NOT NULL,

    FOREIGN KEY (author_id)   REFERENCES users(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE INDEX IF NOT EXISTS idx_posts_author   ON posts(author_id);
CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category_id);
CREATE INDEX IF NOT EXISTS idx_posts_feed     ON posts(status, update_time DESC);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id     INTEGER NOT NULL,                 -- FK -> posts(id)
    author_id   INTEGER NOT NULL,                 -- FK -> users(id)
    content     TEXT NOT NULL,
    create_time TEXT NOT NULL,

    FOREIGN KEY (post_id)   REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
