/// Data models for post-service
///
/// - `Post`: the authoritative row owned by the record store
/// - `ActivityLogEntry`: append-only audit row written with every new post
/// - `SearchDocument`: denormalized copy kept in the search index
/// - `PostWithRelated`: a post composed with its related-post recommendations
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Store-assigned post identifier.
pub type PostId = i64;

/// A blog post as persisted in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied post fields. Used for both create and full-replacement update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PostInput {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PostInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags,
        }
    }
}

/// Activity log actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    NewPost,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::NewPost => "new_post",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub action: String,
    pub post_id: PostId,
    pub logged_at: DateTime<Utc>,
}

/// Search index projection of a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: PostId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Post> for SearchDocument {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
        }
    }
}

/// A post bundled with related posts found through tag overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithRelated {
    #[serde(flatten)]
    pub post: Post,
    pub related_posts: Vec<SearchDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_input_validation() {
        assert!(PostInput::new("A", "B", vec![]).validate().is_ok());
        assert!(PostInput::new("", "B", vec![]).validate().is_err());
        assert!(PostInput::new("A", "", vec!["go".into()]).validate().is_err());
        assert!(PostInput::new("x".repeat(256), "B", vec![]).validate().is_err());
    }

    #[test]
    fn test_missing_tags_default_to_empty() {
        let input: PostInput =
            serde_json::from_str(r#"{"title":"A","content":"B"}"#).unwrap();
        assert!(input.tags.is_empty());
    }

    #[test]
    fn test_post_with_related_flattens_post() {
        let now = Utc::now();
        let bundle = PostWithRelated {
            post: Post {
                id: 3,
                title: "A".into(),
                content: "B".into(),
                tags: vec!["go".into()],
                created_at: now,
                updated_at: now,
            },
            related_posts: vec![],
        };

        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["title"], "A");
        assert_eq!(value["related_posts"], serde_json::json!([]));
    }

    #[test]
    fn test_activity_action_label() {
        assert_eq!(ActivityAction::NewPost.to_string(), "new_post");
    }
}
