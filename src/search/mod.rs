//! Tantivy-based search index module.
//!
//! Full-text matching of questions on their name and the plain text of their
//! content, with the name weighted higher.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Question;

const BOOST_NAME: f32 = 2.0;
const BOOST_DETAIL: f32 = 1.0;

/// Search result with question id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub question_id: String,
    pub score: f32,
}

struct SearchFields {
    question_id: Field,
    name: Field,
    detail: Field,
}

/// Tantivy search index for questions.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let question_id = schema_builder.add_text_field("question_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT);
        let detail = schema_builder.add_text_field("detail", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            question_id,
            name,
            detail,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from questions.
    pub async fn rebuild(&self, questions: &[Question]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for question in questions {
            writer.add_document(self.create_document(question))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} questions", questions.len());
        Ok(())
    }

    /// Index a single question, replacing any previous entry.
    pub async fn index_question(&self, question: &Question) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = Term::from_field_text(self.fields.question_id, &question.id);
        writer.delete_term(term);
        writer.add_document(self.create_document(question))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for questions matching free text. Malformed query syntax is
    /// matched leniently, so pasted content never fails to parse.
    pub fn search(&self, text: &str, limit: usize) -> Result<Vec<SearchResult>, AppError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in [
            (self.fields.name, BOOST_NAME),
            (self.fields.detail, BOOST_DETAIL),
        ] {
            let parser = QueryParser::for_index(&self.index, vec![field]);
            let (field_query, errors) = parser.parse_query_lenient(text);
            if !errors.is_empty() {
                tracing::debug!(?errors, "lenient query parse");
            }
            subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }
        let query = BooleanQuery::new(subqueries);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit.max(1)))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let question_id = doc.get_first(self.fields.question_id)?.as_str()?.to_string();
                Some(SearchResult { question_id, score })
            })
            .collect();

        Ok(results)
    }

    /// Ids of every question matching free text, best match first.
    pub fn search_ids(&self, text: &str) -> Result<Vec<String>, AppError> {
        let indexed = usize::try_from(self.reader.searcher().num_docs()).unwrap_or(usize::MAX);
        Ok(self
            .search(text, indexed)?
            .into_iter()
            .map(|r| r.question_id)
            .collect())
    }

    fn create_document(&self, question: &Question) -> TantivyDocument {
        doc!(
            self.fields.question_id => question.id.clone(),
            self.fields.name => question.name.clone().unwrap_or_default(),
            self.fields.detail => question.detail.plain_text()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Document, QuestionType, ReviewStatus};
    use tempfile::TempDir;

    fn create_test_question(id: &str, name: Option<&str>, detail: &str) -> Question {
        Question {
            id: id.to_string(),
            kind: QuestionType::QuestionAnswer,
            difficulty: Difficulty::Easy,
            tags: vec!["rust".to_string()],
            detail: Document::new(detail),
            params: None,
            reference: None,
            name: name.map(str::to_string),
            priority: None,
            score: 5,
            review_status: ReviewStatus::Pass,
            review_message: None,
            review_time: None,
            publish_time: None,
            create_time: "2024-01-01T00:00:00Z".to_string(),
            update_time: "2024-01-01T00:00:00Z".to_string(),
            user_id: "u1".to_string(),
            view_num: 0,
            comment_num: 0,
            favour_num: 0,
        }
    }

    #[tokio::test]
    async fn test_search_matches_name_and_content() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let questions = vec![
            create_test_question("1", Some("Borrow checker"), "<p>Explain lifetimes</p>"),
            create_test_question("2", None, "<p>What does the <b>borrow</b> checker reject?</p>"),
            create_test_question("3", Some("Joins"), "<p>Inner versus outer join</p>"),
        ];
        index.rebuild(&questions).await.unwrap();

        let ids = index.search_ids("borrow").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "1");
        assert!(ids.contains(&"2".to_string()));
    }

    #[tokio::test]
    async fn test_search_ids_returns_every_match() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let questions: Vec<Question> = (0..1_500)
            .map(|i| create_test_question(&i.to_string(), None, "<p>graph traversal</p>"))
            .collect();
        index.rebuild(&questions).await.unwrap();

        assert_eq!(index.search_ids("graph").unwrap().len(), 1_500);
    }

    #[tokio::test]
    async fn test_reindex_replaces_entry() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index
            .rebuild(&[create_test_question("1", None, "<p>binary search</p>")])
            .await
            .unwrap();

        index
            .index_question(&create_test_question("1", None, "<p>hash maps</p>"))
            .await
            .unwrap();

        assert!(index.search_ids("binary").unwrap().is_empty());
        assert_eq!(index.search_ids("hash").unwrap(), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_unbalanced_syntax_does_not_fail() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index
            .rebuild(&[create_test_question("1", None, "<p>what is (a + b</p>")])
            .await
            .unwrap();

        assert!(index.search_ids("what is (a + b").is_ok());
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        assert!(index.search_ids("  ").unwrap().is_empty());
    }
}
