//! In-memory store, used by tests and available as a non-persistent backend.

use super::{cosine_similarity, Course, CourseChunk, ScoredChunk, VectorStore};
use crate::error::Result;
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    courses: Vec<Course>,
    chunks: Vec<CourseChunk>,
}

#[derive(Default)]
pub struct MemoryVectorStore {
    inner: RwLock<Inner>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryVectorStore {
    fn add_course(&self, course: &Course) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.courses.retain(|c| c.title != course.title);
        inner.courses.push(course.clone());
        Ok(())
    }

    fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<()> {
        self.inner.write().unwrap().chunks.extend_from_slice(chunks);
        Ok(())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        course_title: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<Vec<ScoredChunk>> {
        let inner = self.inner.read().unwrap();
        let mut scored: Vec<ScoredChunk> = inner
            .chunks
            .iter()
            .filter(|chunk| {
                course_title.is_none_or(|t| chunk.course_title == t)
                    && lesson_number.is_none_or(|n| chunk.lesson_number == Some(n))
            })
            .map(|chunk| ScoredChunk {
                course_title: chunk.course_title.clone(),
                lesson_number: chunk.lesson_number,
                content: chunk.content.clone(),
                score: cosine_similarity(query_embedding, &chunk.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let inner = self.inner.read().unwrap();
        if let Some(course) = inner.courses.iter().find(|c| c.title == name) {
            return Ok(Some(course.title.clone()));
        }
        let needle = name.to_lowercase();
        Ok(inner
            .courses
            .iter()
            .find(|c| c.title.to_lowercase().contains(&needle))
            .map(|c| c.title.clone()))
    }

    fn get_course(&self, title: &str) -> Result<Option<Course>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .courses
            .iter()
            .find(|c| c.title == title)
            .cloned())
    }

    fn list_course_titles(&self) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .courses
            .iter()
            .map(|c| c.title.clone())
            .collect())
    }

    fn course_count(&self) -> Result<usize> {
        Ok(self.inner.read().unwrap().courses.len())
    }

    fn chunk_count(&self) -> Result<usize> {
        Ok(self.inner.read().unwrap().chunks.len())
    }

    fn delete_course(&self, title: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.courses.retain(|c| c.title != title);
        inner.chunks.retain(|c| c.course_title != title);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.courses.clear();
        inner.chunks.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::Lesson;

    fn sample_course() -> Course {
        Course {
            title: "Python Basics".to_string(),
            link: Some("https://example.com/python".to_string()),
            instructor: Some("Ada".to_string()),
            lessons: vec![Lesson {
                number: 1,
                title: "Variables".to_string(),
                link: Some("https://example.com/python/1".to_string()),
            }],
        }
    }

    fn chunk(course: &str, lesson: Option<u32>, content: &str, embedding: Vec<f32>) -> CourseChunk {
        CourseChunk {
            course_title: course.to_string(),
            lesson_number: lesson,
            chunk_index: 0,
            content: content.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let store = MemoryVectorStore::new();
        store
            .add_chunks(&[
                chunk("A", Some(1), "far", vec![0.0, 1.0]),
                chunk("A", Some(2), "near", vec![1.0, 0.0]),
            ])
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2, None, None).unwrap();
        assert_eq!(results[0].content, "near");
        assert_eq!(results[1].content, "far");
    }

    #[test]
    fn test_search_filters_course_and_lesson() {
        let store = MemoryVectorStore::new();
        store
            .add_chunks(&[
                chunk("A", Some(1), "a1", vec![1.0, 0.0]),
                chunk("A", Some(2), "a2", vec![1.0, 0.0]),
                chunk("B", Some(1), "b1", vec![1.0, 0.0]),
            ])
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10, Some("A"), Some(2)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "a2");
    }

    #[test]
    fn test_resolve_course_name_partial_match() {
        let store = MemoryVectorStore::new();
        store.add_course(&sample_course()).unwrap();

        assert_eq!(
            store.resolve_course_name("python").unwrap(),
            Some("Python Basics".to_string())
        );
        assert_eq!(store.resolve_course_name("Haskell").unwrap(), None);
    }

    #[test]
    fn test_lesson_link_lookup() {
        let store = MemoryVectorStore::new();
        store.add_course(&sample_course()).unwrap();

        assert_eq!(
            store.get_lesson_link("Python Basics", 1).unwrap(),
            Some("https://example.com/python/1".to_string())
        );
        assert_eq!(store.get_lesson_link("Python Basics", 9).unwrap(), None);
    }

    #[test]
    fn test_delete_course_removes_chunks() {
        let store = MemoryVectorStore::new();
        store.add_course(&sample_course()).unwrap();
        store
            .add_chunks(&[chunk("Python Basics", Some(1), "x", vec![1.0])])
            .unwrap();

        store.delete_course("Python Basics").unwrap();
        assert_eq!(store.course_count().unwrap(), 0);
        assert_eq!(store.chunk_count().unwrap(), 0);
    }
}
