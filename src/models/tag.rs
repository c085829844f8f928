//! Tag and taxonomy models.

use serde::{Deserialize, Serialize};

/// A tag as stored in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Name of the group this tag is listed under.
    pub group_name: String,
    pub created_at: String,
}

/// Request body for creating a tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub name: String,
    pub group_name: String,
}

/// A named group of tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagGroup {
    pub name: String,
    pub tags: Vec<String>,
}

/// Snapshot of the tag taxonomy: flat list plus grouping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagTaxonomy {
    pub all_tags: Vec<String>,
    pub group_tags: Vec<TagGroup>,
}

impl TagTaxonomy {
    /// Build the taxonomy from catalog rows, keeping first-seen group order.
    pub fn from_tags(tags: &[Tag]) -> Self {
        let mut taxonomy = TagTaxonomy::default();
        for tag in tags {
            taxonomy.all_tags.push(tag.name.clone());
            match taxonomy
                .group_tags
                .iter_mut()
                .find(|group| group.name == tag.group_name)
            {
                Some(group) => group.tags.push(tag.name.clone()),
                None => taxonomy.group_tags.push(TagGroup {
                    name: tag.group_name.clone(),
                    tags: vec![tag.name.clone()],
                }),
            }
        }
        taxonomy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, group: &str) -> Tag {
        Tag {
            id: name.to_string(),
            name: name.to_string(),
            group_name: group.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_taxonomy_groups_in_first_seen_order() {
        let taxonomy = TagTaxonomy::from_tags(&[
            tag("rust", "languages"),
            tag("math", "basics"),
            tag("go", "languages"),
        ]);
        assert_eq!(taxonomy.all_tags, vec!["rust", "math", "go"]);
        assert_eq!(taxonomy.group_tags.len(), 2);
        assert_eq!(taxonomy.group_tags[0].name, "languages");
        assert_eq!(taxonomy.group_tags[0].tags, vec!["rust", "go"]);
    }
}
