//! Database repository for users, tags, questions and comments.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Comment, CommentPage, CreateTagRequest, CreateUserRequest, Difficulty, Document, ExtraAuthority, OrderKey,
    Principal, Question, QuestionPatch, QuestionType, ReviewStatus, Role, SearchPage, SearchQuery,
    Tag, UserProfile,
};
use crate::workbench::backend::ReviewTransition;
use crate::workbench::workflow::validate_transition;

const QUESTION_COLUMNS: &str = "id, type, difficulty, tags, detail, params, reference, name, \
     priority, score, review_status, review_message, review_time, publish_time, create_time, \
     update_time, user_id, view_num, comment_num, favour_num";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Register a user.
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<Principal, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let authority_json = serde_json::to_string(&request.extra_authority.tags)?;

        sqlx::query(
            "INSERT INTO users (id, display_name, avatar_url, role, authority_tags, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.display_name)
        .bind(&request.avatar_url)
        .bind(request.role.as_str())
        .bind(&authority_json)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Principal {
            id,
            display_name: request.display_name.clone(),
            avatar_url: request.avatar_url.clone(),
            role: request.role,
            extra_authority: request.extra_authority.clone(),
        })
    }

    /// Get a user with role and authority tags.
    pub async fn get_principal(&self, id: &str) -> Result<Option<Principal>, AppError> {
        let row = sqlx::query(
            "SELECT id, display_name, avatar_url, role, authority_tags FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(principal_from_row).transpose()
    }

    /// Get the public profile of a user.
    pub async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query("SELECT id, display_name, avatar_url FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserProfile {
            id: row.get("id"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
        }))
    }

    // ==================== TAG OPERATIONS ====================

    /// List all tags, grouped tags together.
    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, group_name, created_at FROM tags ORDER BY group_name, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Create a tag. Names are unique.
    pub async fn create_tag(&self, request: &CreateTagRequest) -> Result<Tag, AppError> {
        let existing = sqlx::query("SELECT id FROM tags WHERE name = ?")
            .bind(&request.name)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Validation(format!(
                "Tag {} already exists",
                request.name
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO tags (id, name, group_name, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&request.name)
            .bind(&request.group_name)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(Tag {
            id,
            name: request.name.clone(),
            group_name: request.group_name.clone(),
            created_at: now,
        })
    }

    // ==================== QUESTION OPERATIONS ====================

    /// List every question, for index rebuilds.
    pub async fn list_questions(&self) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {} FROM questions ORDER BY create_time DESC",
            QUESTION_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(question_from_row).collect()
    }

    /// Get a question by ID.
    pub async fn get_question(&self, id: &str) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {} FROM questions WHERE id = ?", QUESTION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(question_from_row).transpose()
    }

    /// Insert a validated submission. New questions enter the review queue.
    pub async fn create_question(
        &self,
        user_id: &str,
        patch: &QuestionPatch,
    ) -> Result<Question, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(&patch.tags)?;
        let params_json = params_json(patch)?;

        sqlx::query(
            r#"INSERT INTO questions (
                id, type, difficulty, tags, detail, params, reference, name, priority, score,
                review_status, create_time, update_time, user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(patch.kind.code())
        .bind(patch.difficulty.code())
        .bind(&tags_json)
        .bind(patch.detail.as_markup())
        .bind(&params_json)
        .bind(reference_markup(&patch.reference))
        .bind(&patch.name)
        .bind(patch.priority)
        .bind(patch.score)
        .bind(ReviewStatus::Reviewing.code())
        .bind(&now)
        .bind(&now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_question(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Question {} vanished after insert", id)))
    }

    /// Page through questions matching `query`.
    ///
    /// `ids`, when given, restricts the result to those questions; it carries
    /// the matches of a free-text search.
    pub async fn search_questions(
        &self,
        query: &SearchQuery,
        ids: Option<&[String]>,
    ) -> Result<SearchPage, AppError> {
        if ids.is_some_and(|ids| ids.is_empty()) {
            return Ok(SearchPage::default());
        }
        let ids_json = ids.map(serde_json::to_string).transpose()?;
        let ids_json = ids_json.as_deref();

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS total FROM questions");
        push_filters(&mut count, query, ids_json);
        let total: i64 = count.build().fetch_one(&self.pool).await?.get("total");

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM questions",
            QUESTION_COLUMNS
        ));
        push_filters(&mut select, query, ids_json);
        select.push(match query.order_key {
            OrderKey::CreateTime => " ORDER BY create_time DESC",
            OrderKey::UpdateTime => " ORDER BY update_time DESC",
            OrderKey::Priority => " ORDER BY priority IS NULL, priority DESC, create_time DESC",
        });
        select
            .push(" LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);

        let rows = select.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(question_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchPage {
            items,
            total: total.max(0) as u64,
        })
    }

    /// Apply an edit patch. The review status is left untouched.
    pub async fn update_question(
        &self,
        id: &str,
        patch: &QuestionPatch,
    ) -> Result<Question, AppError> {
        let now = Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(&patch.tags)?;
        let params_json = params_json(patch)?;

        let result = sqlx::query(
            r#"UPDATE questions SET
                type = ?, difficulty = ?, tags = ?, detail = ?, params = ?, reference = ?,
                name = ?, priority = ?, score = ?, update_time = ?
            WHERE id = ?"#,
        )
        .bind(patch.kind.code())
        .bind(patch.difficulty.code())
        .bind(&tags_json)
        .bind(patch.detail.as_markup())
        .bind(&params_json)
        .bind(reference_markup(&patch.reference))
        .bind(&patch.name)
        .bind(patch.priority)
        .bind(patch.score)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Question {} not found", id)));
        }

        self.get_question(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question {} not found", id)))
    }

    /// Move a question to PASS or REJECT.
    pub async fn transition_question(
        &self,
        transition: &ReviewTransition,
    ) -> Result<Question, AppError> {
        let existing = self
            .get_question(&transition.question_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question {} not found", transition.question_id))
            })?;
        validate_transition(existing.review_status, transition.target)?;

        let reason = transition
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let message = match transition.target {
            ReviewStatus::Reject => Some(reason.ok_or_else(|| {
                AppError::Validation("A rejection reason is required".to_string())
            })?),
            _ => None,
        };

        let now = Utc::now().to_rfc3339();
        let publish_time = (transition.target == ReviewStatus::Pass).then(|| now.clone());

        sqlx::query(
            r#"UPDATE questions SET
                score = ?, review_status = ?, review_message = ?, review_time = ?,
                publish_time = ?, update_time = ?
            WHERE id = ?"#,
        )
        .bind(transition.score)
        .bind(transition.target.code())
        .bind(message)
        .bind(&now)
        .bind(&publish_time)
        .bind(&now)
        .bind(&transition.question_id)
        .execute(&self.pool)
        .await?;

        self.get_question(&transition.question_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question {} not found", transition.question_id))
            })
    }

    // ==================== COMMENT OPERATIONS ====================

    /// Add a comment and bump the question's comment counter.
    pub async fn create_comment(
        &self,
        question_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE questions SET comment_num = comment_num + 1 WHERE id = ?")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Question {} not found",
                question_id
            )));
        }
        sqlx::query(
            "INSERT INTO comments (id, question_id, user_id, content, create_time) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(question_id)
        .bind(user_id)
        .bind(content)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Comment {
            id,
            question_id: question_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            create_time: now,
        })
    }

    /// Page through a question's comments, newest first.
    pub async fn list_comments(
        &self,
        question_id: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<CommentPage, AppError> {
        let total: i64 =
            sqlx::query("SELECT COUNT(*) AS total FROM comments WHERE question_id = ?")
                .bind(question_id)
                .fetch_one(&self.pool)
                .await?
                .get("total");

        let offset = i64::from(page_num.max(1) - 1) * i64::from(page_size);
        let rows = sqlx::query(
            "SELECT id, question_id, user_id, content, create_time FROM comments \
             WHERE question_id = ? ORDER BY create_time DESC, rowid DESC LIMIT ? OFFSET ?",
        )
        .bind(question_id)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(CommentPage {
            items: rows.iter().map(comment_from_row).collect(),
            total: total.max(0) as u64,
        })
    }
}

/// Append the WHERE clause for `query`.
///
/// `ids` is a JSON array of question ids.
fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    query: &'a SearchQuery,
    ids: Option<&'a str>,
) {
    builder.push(" WHERE 1 = 1");

    if let Some(status) = query.review_status {
        builder.push(" AND review_status = ").push_bind(status.code());
    }
    if let Some(kind) = query.kind {
        builder.push(" AND type = ").push_bind(kind.code());
    }
    if let Some(user_id) = &query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(tags) = &query.tags {
        for tag in tags {
            builder
                .push(" AND EXISTS (SELECT 1 FROM json_each(questions.tags) WHERE json_each.value = ")
                .push_bind(tag)
                .push(")");
        }
    }
    if let Some(or_tags) = query.or_tags.as_ref().filter(|t| !t.is_empty()) {
        builder.push(" AND EXISTS (SELECT 1 FROM json_each(questions.tags) WHERE json_each.value IN (");
        let mut separated = builder.separated(", ");
        for tag in or_tags {
            separated.push_bind(tag);
        }
        separated.push_unseparated("))");
    }
    if let Some(ids) = ids {
        builder
            .push(" AND id IN (SELECT value FROM json_each(")
            .push_bind(ids)
            .push("))");
    }
}

fn params_json(patch: &QuestionPatch) -> Result<Option<String>, AppError> {
    if !patch.kind.has_options() {
        return Ok(None);
    }
    patch
        .params
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(AppError::from)
}

fn reference_markup(reference: &Document) -> Option<&str> {
    (!reference.is_empty()).then(|| reference.as_markup())
}

// Helper functions for row conversion

fn principal_from_row(row: &SqliteRow) -> Result<Principal, AppError> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let authority_tags: String = row.get("authority_tags");
    let tags = parse_json_array(&authority_tags)
        .map_err(|e| AppError::Internal(format!("User {} has invalid authority tags: {}", id, e)))?;
    Ok(Principal {
        display_name: row.get("display_name"),
        avatar_url: row.get("avatar_url"),
        role: Role::from_str(&role).unwrap_or_default(),
        extra_authority: ExtraAuthority { tags },
        id,
    })
}

fn tag_from_row(row: &SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        group_name: row.get("group_name"),
        created_at: row.get("created_at"),
    }
}

fn question_from_row(row: &SqliteRow) -> Result<Question, AppError> {
    let id: String = row.get("id");
    let corrupt = |column: &str, code: i64| {
        AppError::Internal(format!("Question {} has invalid {} {}", id, column, code))
    };

    let kind_code: i64 = row.get("type");
    let difficulty_code: i64 = row.get("difficulty");
    let status_code: i64 = row.get("review_status");
    let kind = QuestionType::from_code(kind_code).ok_or_else(|| corrupt("type", kind_code))?;
    let difficulty = Difficulty::from_code(difficulty_code)
        .ok_or_else(|| corrupt("difficulty", difficulty_code))?;
    let review_status = ReviewStatus::from_code(status_code)
        .ok_or_else(|| corrupt("review status", status_code))?;

    let tags: String = row.get("tags");
    let detail: String = row.get("detail");
    let params: Option<String> = row.get("params");
    let reference: Option<String> = row.get("reference");

    Ok(Question {
        kind,
        difficulty,
        tags: parse_json_array(&tags)
            .map_err(|e| AppError::Internal(format!("Question {} has invalid tags: {}", id, e)))?,
        detail: Document::new(detail),
        params: params.and_then(|p| serde_json::from_str(&p).ok()),
        reference: reference.filter(|r| !r.is_empty()).map(Document::new),
        name: row.get("name"),
        priority: row.get("priority"),
        score: row.get("score"),
        review_status,
        review_message: row.get("review_message"),
        review_time: row.get("review_time"),
        publish_time: row.get("publish_time"),
        create_time: row.get("create_time"),
        update_time: row.get("update_time"),
        user_id: row.get("user_id"),
        view_num: row.get("view_num"),
        comment_num: row.get("comment_num"),
        favour_num: row.get("favour_num"),
        id,
    })
}

fn parse_json_array(s: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(s)
}

fn comment_from_row(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        question_id: row.get("question_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        create_time: row.get("create_time"),
    }
}
