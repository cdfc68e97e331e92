use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::user::model::AuthorSummary;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Community {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_by: ObjectId,
    /// Threads posted within this community, in creation order.
    #[serde(default)]
    pub threads: Vec<ObjectId>,
    #[serde(default)]
    pub members: Vec<ObjectId>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// The community fields attached to populated thread responses.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommunitySummary {
    pub id: String,
    pub name: String,
    pub username: String,
    pub image: Option<String>,
}

impl Community {
    pub fn summary(&self) -> CommunitySummary {
        CommunitySummary {
            id: self.id.to_hex(),
            name: self.name.clone(),
            username: self.username.clone(),
            image: self.image.clone(),
        }
    }
}

/// Batch-load the communities referenced by `ids`, keyed by id.
pub async fn load_community_summaries(
    communities: &Collection<Community>,
    ids: &[ObjectId],
) -> Result<HashMap<ObjectId, CommunitySummary>, mongodb::error::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let cursor = communities
        .find(doc! { "_id": { "$in": ids.to_vec() } })
        .await?;
    let docs: Vec<Community> = cursor.try_collect().await?;

    Ok(docs.into_iter().map(|c| (c.id, c.summary())).collect())
}

/// Community with its member references resolved.
#[derive(Debug, Serialize)]
pub struct CommunityView {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_by: String,
    pub members: Vec<AuthorSummary>,
    pub created_at: DateTime<Utc>,
}

impl CommunityView {
    /// Resolve a community document against already-fetched member summaries,
    /// preserving the order of the `members` array.
    pub fn build(community: &Community, members: &HashMap<ObjectId, AuthorSummary>) -> CommunityView {
        CommunityView {
            id: community.id.to_hex(),
            username: community.username.clone(),
            name: community.name.clone(),
            image: community.image.clone(),
            bio: community.bio.clone(),
            created_by: community.created_by.to_hex(),
            members: community
                .members
                .iter()
                .filter_map(|id| members.get(id).cloned())
                .collect(),
            created_at: community.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateCommunityRequest {
    pub name: String,
    pub username: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_by: String,
}

#[derive(Deserialize)]
pub struct UpdateCommunityRequest {
    pub name: String,
    pub username: String,
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct CommunitySearchQuery {
    pub search_string: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CommunitiesPage {
    pub communities: Vec<CommunitySummary>,
    pub is_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_orders_members_by_the_members_array() {
        let (m1, m2) = (ObjectId::new(), ObjectId::new());
        let community = Community {
            id: ObjectId::new(),
            username: "rustaceans".into(),
            name: "Rustaceans".into(),
            image: None,
            bio: None,
            created_by: m1,
            threads: Vec::new(),
            members: vec![m2, m1],
            created_at: Utc::now(),
        };

        let mut members = HashMap::new();
        for (id, name) in [(m1, "First"), (m2, "Second")] {
            members.insert(
                id,
                AuthorSummary {
                    id: id.to_hex(),
                    name: name.into(),
                    username: name.to_lowercase(),
                    image: None,
                },
            );
        }

        let view = CommunityView::build(&community, &members);
        let names: Vec<&str> = view.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }
}
