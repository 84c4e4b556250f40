//! Course document parsing and chunking.
//!
//! Course documents are plain text with a metadata header followed by
//! lesson sections:
//!
//! ```text
//! Course Title: Building Towards Computer Use
//! Course Link: https://example.com/course
//! Course Instructor: Colt Steele
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/lesson0
//! Lesson content...
//! ```
//!
//! Content is split on sentence boundaries into overlapping chunks sized
//! for embedding.

use crate::error::{CorsoError, Result};
use crate::vector_store::{Course, CourseChunk, Lesson};
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

/// A parsed document: course metadata plus its chunks, not yet embedded.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub course: Course,
    pub chunks: Vec<CourseChunk>,
}

/// Parses course documents and chunks their content.
pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
    lesson_marker: Regex,
    sentence_end: Regex,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            lesson_marker: Regex::new(r"^Lesson\s+(\d+):\s*(.*)$").expect("valid regex"),
            sentence_end: Regex::new(r"[.!?]+\s+").expect("valid regex"),
        }
    }

    /// Read and process a course document from disk.
    pub fn process_file(&self, path: &Path) -> Result<ProcessedDocument> {
        let text = std::fs::read_to_string(path)?;
        self.process(&text)
            .map_err(|e| CorsoError::Document(format!("{}: {}", path.display(), e)))
    }

    /// Parse a course document and chunk its lesson content.
    pub fn process(&self, text: &str) -> Result<ProcessedDocument> {
        let mut lines = text.lines().peekable();

        let title = Self::header_value(lines.peek().copied(), "Course Title:")
            .ok_or_else(|| {
                CorsoError::Document("missing 'Course Title:' header on first line".to_string())
            })?
            .to_string();
        lines.next();

        let mut link = None;
        let mut instructor = None;
        while let Some(&line) = lines.peek() {
            if let Some(value) = Self::header_value(Some(line), "Course Link:") {
                link = Some(value.to_string());
            } else if let Some(value) = Self::header_value(Some(line), "Course Instructor:") {
                instructor = Some(value.to_string());
            } else if !line.trim().is_empty() {
                break;
            }
            lines.next();
        }

        let mut lessons = Vec::new();
        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;

        let mut current_lesson: Option<(u32, String, Option<String>)> = None;
        let mut content_lines: Vec<&str> = Vec::new();

        let flush =
            |lesson: Option<&(u32, String, Option<String>)>,
             content_lines: &mut Vec<&str>,
             chunk_index: &mut usize,
             chunks: &mut Vec<CourseChunk>| {
                let content = content_lines.join(" ");
                content_lines.clear();
                if content.trim().is_empty() {
                    return;
                }
                let lesson_number = lesson.map(|(n, _, _)| *n);
                for piece in self.chunk_text(&content) {
                    let prefixed = match lesson_number {
                        Some(n) => format!("Course {} Lesson {} content: {}", title, n, piece),
                        None => format!("Course {} content: {}", title, piece),
                    };
                    chunks.push(CourseChunk {
                        course_title: title.clone(),
                        lesson_number,
                        chunk_index: *chunk_index,
                        content: prefixed,
                        embedding: Vec::new(),
                    });
                    *chunk_index += 1;
                }
            };

        for line in lines {
            if let Some(captures) = self.lesson_marker.captures(line) {
                flush(
                    current_lesson.as_ref(),
                    &mut content_lines,
                    &mut chunk_index,
                    &mut chunks,
                );
                if let Some((number, lesson_title, lesson_link)) = current_lesson.take() {
                    lessons.push(Lesson {
                        number,
                        title: lesson_title,
                        link: lesson_link,
                    });
                }

                let number: u32 = captures[1].parse().map_err(|_| {
                    CorsoError::Document(format!("invalid lesson number in '{}'", line))
                })?;
                current_lesson = Some((number, captures[2].trim().to_string(), None));
            } else if let Some(value) = Self::header_value(Some(line), "Lesson Link:") {
                if let Some(lesson) = current_lesson.as_mut() {
                    lesson.2 = Some(value.to_string());
                } else {
                    content_lines.push(line);
                }
            } else if !line.trim().is_empty() {
                content_lines.push(line.trim());
            }
        }

        flush(
            current_lesson.as_ref(),
            &mut content_lines,
            &mut chunk_index,
            &mut chunks,
        );
        if let Some((number, lesson_title, lesson_link)) = current_lesson {
            lessons.push(Lesson {
                number,
                title: lesson_title,
                link: lesson_link,
            });
        }

        info!(
            course = %title,
            lessons = lessons.len(),
            chunks = chunks.len(),
            "Processed course document"
        );

        Ok(ProcessedDocument {
            course: Course {
                title,
                link,
                instructor,
                lessons,
            },
            chunks,
        })
    }

    fn header_value<'a>(line: Option<&'a str>, prefix: &str) -> Option<&'a str> {
        line.and_then(|l| l.strip_prefix(prefix)).map(str::trim)
    }

    /// Split text into sentences, then pack sentences greedily into chunks
    /// of at most `chunk_size` characters with sentence-level overlap.
    fn chunk_text(&self, text: &str) -> Vec<String> {
        let sentences = self.split_sentences(text);
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < sentences.len() {
            let mut end = start;
            let mut size = 0usize;
            while end < sentences.len() {
                let next = sentences[end].len() + if size > 0 { 1 } else { 0 };
                if size + next > self.chunk_size && size > 0 {
                    break;
                }
                size += next;
                end += 1;
            }

            chunks.push(sentences[start..end].join(" "));

            if end >= sentences.len() {
                break;
            }

            // Step back over trailing sentences until roughly chunk_overlap
            // characters are carried into the next chunk.
            let mut overlap_start = end;
            let mut carried = 0usize;
            while overlap_start > start + 1 {
                let len = sentences[overlap_start - 1].len();
                if carried + len > self.chunk_overlap {
                    break;
                }
                carried += len;
                overlap_start -= 1;
            }
            start = overlap_start.max(start + 1);
        }

        debug!(chunks = chunks.len(), "Chunked text");
        chunks
    }

    fn split_sentences(&self, text: &str) -> Vec<String> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut sentences = Vec::new();
        let mut last = 0usize;
        for m in self.sentence_end.find_iter(&normalized) {
            let sentence = normalized[last..m.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            last = m.end();
        }
        let tail = normalized[last..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
        sentences
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(800, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Course Title: Python Basics
Course Link: https://example.com/python
Course Instructor: Ada Lovelace

Lesson 0: Introduction
Lesson Link: https://example.com/python/0
Welcome to the course. This lesson covers the basics.

Lesson 1: Variables
Lesson Link: https://example.com/python/1
Variables hold values. They are created by assignment.
";

    #[test]
    fn test_parses_course_metadata() {
        let doc = DocumentProcessor::default().process(SAMPLE).unwrap();

        assert_eq!(doc.course.title, "Python Basics");
        assert_eq!(
            doc.course.link.as_deref(),
            Some("https://example.com/python")
        );
        assert_eq!(doc.course.instructor.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_parses_lessons_with_links() {
        let doc = DocumentProcessor::default().process(SAMPLE).unwrap();

        assert_eq!(doc.course.lessons.len(), 2);
        assert_eq!(doc.course.lessons[0].number, 0);
        assert_eq!(doc.course.lessons[0].title, "Introduction");
        assert_eq!(
            doc.course.lessons[1].link.as_deref(),
            Some("https://example.com/python/1")
        );
    }

    #[test]
    fn test_chunks_carry_course_and_lesson_context() {
        let doc = DocumentProcessor::default().process(SAMPLE).unwrap();

        assert!(!doc.chunks.is_empty());
        let first = &doc.chunks[0];
        assert_eq!(first.course_title, "Python Basics");
        assert_eq!(first.lesson_number, Some(0));
        assert!(first
            .content
            .starts_with("Course Python Basics Lesson 0 content: Welcome to the course."));
        assert!(first.embedding.is_empty());

        let indices: Vec<usize> = doc.chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, (0..doc.chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_title_is_an_error() {
        let err = DocumentProcessor::default()
            .process("Just some text without headers.")
            .unwrap_err();
        assert!(matches!(err, CorsoError::Document(_)));
    }

    #[test]
    fn test_content_before_any_lesson_is_kept() {
        let text = "\
Course Title: Orphan Content
Course Link: https://example.com

Some preamble text that belongs to no lesson. It still gets indexed.
";
        let doc = DocumentProcessor::default().process(text).unwrap();

        assert_eq!(doc.chunks.len(), 1);
        assert_eq!(doc.chunks[0].lesson_number, None);
        assert!(doc.chunks[0]
            .content
            .starts_with("Course Orphan Content content: Some preamble text"));
    }

    #[test]
    fn test_long_lesson_splits_with_overlap() {
        let mut text = String::from("Course Title: Long Course\n\nLesson 1: Length\n");
        for i in 0..40 {
            text.push_str(&format!("Sentence number {} fills out the lesson body. ", i));
        }

        let processor = DocumentProcessor::new(200, 50);
        let doc = processor.process(&text).unwrap();

        assert!(doc.chunks.len() > 1);
        for chunk in &doc.chunks {
            // Prefix excluded, each chunk stays near the configured size.
            let body = chunk
                .content
                .strip_prefix("Course Long Course Lesson 1 content: ")
                .unwrap();
            assert!(body.len() <= 250, "chunk too large: {}", body.len());
        }

        // Consecutive chunks share overlapping sentences.
        let first_body = &doc.chunks[0].content;
        let second_body = &doc.chunks[1].content;
        let last_sentence = first_body.rsplit(". ").next().unwrap();
        assert!(second_body.contains(last_sentence.trim_end_matches('.')));
    }

    #[test]
    fn test_sentence_split_handles_terminators() {
        let processor = DocumentProcessor::default();
        let sentences =
            processor.split_sentences("First one. Second one! Third one? Fourth without end");
        assert_eq!(
            sentences,
            vec![
                "First one.",
                "Second one!",
                "Third one?",
                "Fourth without end"
            ]
        );
    }
}
