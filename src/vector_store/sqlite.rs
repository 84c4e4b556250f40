//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For large corpora consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{cosine_similarity, Course, CourseChunk, Lesson, ScoredChunk, VectorStore};
use crate::error::{CorsoError, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    title TEXT PRIMARY KEY,
    link TEXT,
    instructor TEXT,
    lessons_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_title TEXT NOT NULL,
    lesson_number INTEGER,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_course_title ON chunks(course_title);
"#;

/// SQLite-based course store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite course store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CorsoError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_course(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
        let lessons_json: String = row.get(3)?;
        Ok(Course {
            title: row.get(0)?,
            link: row.get(1)?,
            instructor: row.get(2)?,
            lessons: serde_json::from_str::<Vec<Lesson>>(&lessons_json).unwrap_or_default(),
        })
    }
}

impl VectorStore for SqliteVectorStore {
    fn add_course(&self, course: &Course) -> Result<()> {
        let conn = self.lock()?;
        let lessons_json = serde_json::to_string(&course.lessons)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses (title, link, instructor, lessons_json)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![course.title, course.link, course.instructor, lessons_json],
        )?;

        debug!("Stored course '{}'", course.title);
        Ok(())
    }

    fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            tx.execute(
                r#"
                INSERT INTO chunks (course_title, lesson_number, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index as i64,
                    chunk.content,
                    Self::embedding_to_bytes(&chunk.embedding),
                ],
            )?;
        }

        tx.commit()?;
        info!("Stored {} chunks", chunks.len());
        Ok(())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        course_title: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<Vec<ScoredChunk>> {
        let conn = self.lock()?;

        let mut sql =
            String::from("SELECT course_title, lesson_number, content, embedding FROM chunks");
        let mut clauses = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = course_title {
            clauses.push(format!("course_title = ?{}", values.len() + 1));
            values.push(Box::new(title.to_string()));
        }
        if let Some(number) = lesson_number {
            clauses.push(format!("lesson_number = ?{}", values.len() + 1));
            values.push(Box::new(number));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let rows = stmt.query_map(params.as_slice(), |row| {
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<u32>>(1)?,
                row.get::<_, String>(2)?,
                Self::bytes_to_embedding(&embedding_bytes),
            ))
        })?;

        let mut results: Vec<ScoredChunk> = rows
            .filter_map(|r| r.ok())
            .map(|(course_title, lesson_number, content, embedding)| ScoredChunk {
                course_title,
                lesson_number,
                content,
                score: cosine_similarity(query_embedding, &embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let conn = self.lock()?;

        let exact = conn.query_row(
            "SELECT title FROM courses WHERE title = ?1",
            params![name],
            |row| row.get::<_, String>(0),
        );
        match exact {
            Ok(title) => return Ok(Some(title)),
            Err(rusqlite::Error::QueryReturnedNoRows) => {}
            Err(e) => return Err(e.into()),
        }

        let partial = conn.query_row(
            "SELECT title FROM courses WHERE LOWER(title) LIKE '%' || LOWER(?1) || '%' \
             ORDER BY title LIMIT 1",
            params![name],
            |row| row.get::<_, String>(0),
        );
        match partial {
            Ok(title) => Ok(Some(title)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT title, link, instructor, lessons_json FROM courses WHERE title = ?1",
            params![title],
            Self::row_to_course,
        );
        match result {
            Ok(course) => Ok(Some(course)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY title")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn delete_course(&self, title: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM chunks WHERE course_title = ?1", params![title])?;
        let deleted = conn.execute("DELETE FROM courses WHERE title = ?1", params![title])?;
        info!("Deleted course '{}' ({} rows)", title, deleted);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM chunks", [])?;
        conn.execute("DELETE FROM courses", [])?;
        info!("Cleared course store");
        Ok(())
    }
}
