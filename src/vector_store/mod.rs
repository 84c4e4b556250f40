//! Course storage and semantic search.
//!
//! Two backends implement [`VectorStore`]: a SQLite store for persistence
//! and an in-memory store for tests. Both rank chunks by cosine similarity
//! against a query embedding.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One lesson within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// Course metadata. The title is the unique identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// A chunk of course text with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseChunk {
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A chunk returned from a search, with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub content: String,
    pub score: f32,
}

/// Storage backend for courses and their embedded chunks.
pub trait VectorStore: Send + Sync {
    /// Store course metadata. Replaces any existing course with the same title.
    fn add_course(&self, course: &Course) -> Result<()>;

    /// Store embedded chunks.
    fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<()>;

    /// Rank chunks by cosine similarity to `query_embedding`, optionally
    /// filtered to one course and/or one lesson.
    fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        course_title: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Resolve a partial course name to a stored title: exact match first,
    /// then case-insensitive substring match.
    fn resolve_course_name(&self, name: &str) -> Result<Option<String>>;

    /// Fetch a course by exact title.
    fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// All stored course titles.
    fn list_course_titles(&self) -> Result<Vec<String>>;

    fn course_count(&self) -> Result<usize>;

    fn chunk_count(&self) -> Result<usize>;

    /// Link for a lesson of a course, when recorded.
    fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self.get_course(course_title)?.and_then(|course| {
            course
                .lessons
                .iter()
                .find(|l| l.number == lesson_number)
                .and_then(|l| l.link.clone())
        }))
    }

    /// Remove a course and its chunks.
    fn delete_course(&self, title: &str) -> Result<()>;

    /// Remove all courses and chunks.
    fn clear(&self) -> Result<()>;
}

/// Cosine similarity between two vectors. Zero-magnitude or mismatched
/// vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}
