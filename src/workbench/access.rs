//! Tag-scoped visibility and moderation rights of a principal.

use serde::Serialize;

use crate::models::{Principal, TagGroup, TagTaxonomy};

/// Name of the synthetic group listing a scoped reviewer's tags.
pub const SCOPED_GROUP_NAME: &str = "Reviewable tags";

/// What the current principal may see and moderate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessScope {
    pub can_visit: bool,
    pub is_admin: bool,
    pub visible_tags: Vec<String>,
    pub grouped_tags: Vec<TagGroup>,
    /// Initial `orTags` filter of the review queue.
    pub default_or_tags: Vec<String>,
}

impl AccessScope {
    /// Compute the scope of `principal` against a taxonomy snapshot.
    pub fn for_principal(principal: &Principal, taxonomy: &TagTaxonomy) -> Self {
        let is_admin = principal.is_admin();
        let authority_tags = dedup(&principal.extra_authority.tags);
        let can_visit = is_admin || !authority_tags.is_empty();

        if is_admin {
            Self {
                can_visit,
                is_admin,
                visible_tags: taxonomy.all_tags.clone(),
                grouped_tags: taxonomy.group_tags.clone(),
                default_or_tags: Vec::new(),
            }
        } else {
            Self {
                can_visit,
                is_admin,
                grouped_tags: vec![TagGroup {
                    name: SCOPED_GROUP_NAME.to_string(),
                    tags: authority_tags.clone(),
                }],
                default_or_tags: authority_tags.clone(),
                visible_tags: authority_tags,
            }
        }
    }

    /// Scope of an unknown principal: nothing is visible.
    pub fn denied() -> Self {
        Self {
            can_visit: false,
            is_admin: false,
            visible_tags: Vec::new(),
            grouped_tags: Vec::new(),
            default_or_tags: Vec::new(),
        }
    }

    /// Whether the `tags` (AND) filter is editable.
    pub fn can_edit_and_tags(&self) -> bool {
        self.is_admin
    }

    /// Whether a record carrying `tags` may be edited or transitioned.
    pub fn can_moderate(&self, tags: &[String]) -> bool {
        if !self.can_visit {
            return false;
        }
        self.is_admin || tags.iter().any(|tag| self.visible_tags.contains(tag))
    }

    /// Restrict a requested `orTags` selection to what this scope may query.
    ///
    /// Admins pass through unchanged. Scoped reviewers keep only their own
    /// tags and fall back to the full default when nothing is left, so a
    /// scoped query never loses its tag restriction.
    pub fn clamp_or_tags(&self, requested: Option<Vec<String>>) -> Option<Vec<String>> {
        if self.is_admin {
            return requested.filter(|tags| !tags.is_empty());
        }
        let kept: Vec<String> = requested
            .unwrap_or_default()
            .into_iter()
            .filter(|tag| self.visible_tags.contains(tag))
            .collect();
        if kept.is_empty() {
            Some(self.default_or_tags.clone())
        } else {
            Some(dedup(&kept))
        }
    }
}

fn dedup(tags: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(tag) {
            unique.push(tag.clone());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtraAuthority, Role};

    fn taxonomy() -> TagTaxonomy {
        TagTaxonomy {
            all_tags: vec!["math".into(), "rust".into(), "go".into()],
            group_tags: vec![
                TagGroup {
                    name: "basics".into(),
                    tags: vec!["math".into()],
                },
                TagGroup {
                    name: "languages".into(),
                    tags: vec!["rust".into(), "go".into()],
                },
            ],
        }
    }

    fn principal(role: Role, tags: &[&str]) -> Principal {
        Principal {
            id: "u1".into(),
            display_name: "Reviewer".into(),
            avatar_url: None,
            role,
            extra_authority: ExtraAuthority {
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        }
    }

    #[test]
    fn test_admin_sees_full_taxonomy() {
        let scope = AccessScope::for_principal(&principal(Role::Admin, &[]), &taxonomy());
        assert!(scope.can_visit);
        assert!(scope.is_admin);
        assert_eq!(scope.visible_tags.len(), 3);
        assert_eq!(scope.grouped_tags, taxonomy().group_tags);
        assert!(scope.default_or_tags.is_empty());
        assert!(scope.can_edit_and_tags());
    }

    #[test]
    fn test_scoped_reviewer_sees_authority_tags_only() {
        let scope = AccessScope::for_principal(&principal(Role::User, &["math"]), &taxonomy());
        assert!(scope.can_visit);
        assert!(!scope.is_admin);
        assert_eq!(scope.visible_tags, vec!["math"]);
        assert_eq!(scope.grouped_tags.len(), 1);
        assert_eq!(scope.grouped_tags[0].tags, vec!["math"]);
        assert_eq!(scope.default_or_tags, vec!["math"]);
        assert!(!scope.can_edit_and_tags());
    }

    #[test]
    fn test_plain_user_cannot_visit() {
        let scope = AccessScope::for_principal(&principal(Role::User, &[]), &taxonomy());
        assert!(!scope.can_visit);
        assert!(!scope.can_moderate(&["math".to_string()]));
    }

    #[test]
    fn test_can_moderate_requires_intersection() {
        let scope = AccessScope::for_principal(&principal(Role::User, &["math"]), &taxonomy());
        assert!(scope.can_moderate(&["math".into(), "rust".into()]));
        assert!(!scope.can_moderate(&["rust".into()]));
        assert!(!scope.can_moderate(&[]));
    }

    #[test]
    fn test_clamp_or_tags_for_scoped_reviewer() {
        let scope =
            AccessScope::for_principal(&principal(Role::User, &["math", "go"]), &taxonomy());
        assert_eq!(
            scope.clamp_or_tags(Some(vec!["go".into(), "rust".into()])),
            Some(vec!["go".to_string()])
        );
        assert_eq!(
            scope.clamp_or_tags(Some(vec!["rust".into()])),
            Some(vec!["math".to_string(), "go".to_string()])
        );
        assert_eq!(
            scope.clamp_or_tags(None),
            Some(vec!["math".to_string(), "go".to_string()])
        );
    }

    #[test]
    fn test_clamp_or_tags_for_admin_passes_through() {
        let scope = AccessScope::for_principal(&principal(Role::Admin, &[]), &taxonomy());
        assert_eq!(scope.clamp_or_tags(Some(vec![])), None);
        assert_eq!(
            scope.clamp_or_tags(Some(vec!["rust".into()])),
            Some(vec!["rust".to_string()])
        );
    }
}
