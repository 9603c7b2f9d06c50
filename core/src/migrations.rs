pub const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS threads (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      thread_slug TEXT NOT NULL UNIQUE,
      thread_path TEXT NOT NULL,
      category TEXT NOT NULL,
      title TEXT NOT NULL,
      is_group_chat INTEGER NOT NULL DEFAULT 0,
      participant_names TEXT NOT NULL,
      message_count INTEGER NOT NULL DEFAULT 0,
      first_message_at INTEGER,
      last_message_at INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_threads_category ON threads(category);
    CREATE INDEX IF NOT EXISTS idx_threads_last_message ON threads(last_message_at DESC);

    CREATE TABLE IF NOT EXISTS messages (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      thread_id INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
      sender_name TEXT NOT NULL,
      timestamp_ms INTEGER NOT NULL,
      content TEXT,
      has_photos INTEGER NOT NULL DEFAULT 0,
      has_videos INTEGER NOT NULL DEFAULT 0,
      has_audio INTEGER NOT NULL DEFAULT 0,
      has_gifs INTEGER NOT NULL DEFAULT 0,
      has_files INTEGER NOT NULL DEFAULT 0,
      has_share INTEGER NOT NULL DEFAULT 0,
      share_url TEXT,
      reaction_count INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_messages_thread_id ON messages(thread_id);
    CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp_ms);
    CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_name);

    CREATE TABLE IF NOT EXISTS reactions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
      reaction_emoji TEXT NOT NULL,
      actor_name TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_reactions_message_id ON reactions(message_id);

    CREATE TABLE IF NOT EXISTS posts (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      source TEXT NOT NULL,
      timestamp INTEGER NOT NULL,
      title TEXT,
      content TEXT,
      external_url TEXT,
      group_name TEXT,
      has_media INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_posts_timestamp ON posts(timestamp DESC);

    CREATE TABLE IF NOT EXISTS likes (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      timestamp INTEGER NOT NULL,
      title TEXT NOT NULL,
      reaction_type TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_likes_timestamp ON likes(timestamp DESC);

    CREATE TABLE IF NOT EXISTS comments (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      timestamp INTEGER NOT NULL,
      title TEXT,
      comment_text TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_comments_timestamp ON comments(timestamp DESC);

    CREATE TABLE IF NOT EXISTS import_state (
      id INTEGER PRIMARY KEY CHECK (id = 1),
      import_date INTEGER NOT NULL,
      export_root TEXT NOT NULL,
      thread_count INTEGER NOT NULL DEFAULT 0,
      message_count INTEGER NOT NULL DEFAULT 0,
      post_count INTEGER NOT NULL DEFAULT 0,
      like_count INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profile (
      id INTEGER PRIMARY KEY CHECK (id = 1),
      name TEXT NOT NULL DEFAULT '',
      username TEXT NOT NULL DEFAULT '',
      about_me TEXT NOT NULL DEFAULT '',
      birthday TEXT NOT NULL DEFAULT '',
      city TEXT NOT NULL DEFAULT '',
      hometown TEXT NOT NULL DEFAULT '',
      gender TEXT NOT NULL DEFAULT '',
      friends_count INTEGER NOT NULL DEFAULT 0,
      followers_count INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS profile_work (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      employer TEXT NOT NULL,
      title TEXT,
      location TEXT,
      period TEXT
    );

    CREATE TABLE IF NOT EXISTS profile_education (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      school TEXT NOT NULL,
      degree TEXT,
      field TEXT,
      school_type TEXT
    );

    CREATE TABLE IF NOT EXISTS profile_websites (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      address TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS profile_screen_names (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      service TEXT NOT NULL,
      username TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS profile_family (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      relation TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS profile_photos (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      timestamp INTEGER NOT NULL,
      filename TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_tags (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
      name TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_post_tags_post_id ON post_tags(post_id);
    CREATE INDEX IF NOT EXISTS idx_post_tags_name ON post_tags(name);
    "#,
    r#"
    ALTER TABLE import_state ADD COLUMN comment_count INTEGER NOT NULL DEFAULT 0;

    CREATE INDEX IF NOT EXISTS idx_messages_thread_timestamp
      ON messages(thread_id, timestamp_ms DESC);
    "#,
];
