use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::community::model::CommunitySummary;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub onboarded: bool,
    /// Top-level threads authored by this user, in creation order.
    #[serde(default)]
    pub threads: Vec<ObjectId>,
    #[serde(default)]
    pub communities: Vec<ObjectId>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// The author fields attached to populated thread responses.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub username: String,
    pub image: Option<String>,
}

impl User {
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id.to_hex(),
            name: self.name.clone(),
            username: self.username.clone(),
            image: self.image.clone(),
        }
    }
}

/// Batch-load the users referenced by `ids`, keyed by id. Dangling ids are
/// simply absent from the map.
pub async fn load_author_summaries(
    users: &Collection<User>,
    ids: &[ObjectId],
) -> Result<HashMap<ObjectId, AuthorSummary>, mongodb::error::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let cursor = users.find(doc! { "_id": { "$in": ids.to_vec() } }).await?;
    let docs: Vec<User> = cursor.try_collect().await?;

    Ok(docs.into_iter().map(|u| (u.id, u.summary())).collect())
}

/// User with its community references resolved.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub onboarded: bool,
    pub communities: Vec<CommunitySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserView {
    /// Resolve a user document against already-fetched community summaries,
    /// preserving the order of the user's `communities` array.
    pub fn build(user: &User, communities: &HashMap<ObjectId, CommunitySummary>) -> UserView {
        UserView {
            id: user.id.to_hex(),
            username: user.username.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            bio: user.bio.clone(),
            onboarded: user.onboarded,
            communities: user
                .communities
                .iter()
                .filter_map(|id| communities.get(id).cloned())
                .collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub user_id: String,
    pub name: String,
    pub username: String,
    pub bio: String,
    pub image: String,
    pub path: String,
}

#[derive(Deserialize)]
pub struct UserSearchQuery {
    pub user_id: String,
    pub search_string: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UsersPage {
    pub users: Vec<AuthorSummary>,
    pub is_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_communities(communities: Vec<ObjectId>) -> User {
        User {
            id: ObjectId::new(),
            username: "ada".into(),
            name: "Ada".into(),
            image: None,
            bio: Some("bio".into()),
            onboarded: true,
            threads: Vec::new(),
            communities,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn summary_for(id: ObjectId, name: &str) -> CommunitySummary {
        CommunitySummary {
            id: id.to_hex(),
            name: name.into(),
            username: name.to_lowercase(),
            image: None,
        }
    }

    #[test]
    fn view_preserves_community_order_and_skips_dangling_refs() {
        let (a, b, c) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        let user = user_with_communities(vec![c, a, b]);

        let mut summaries = HashMap::new();
        summaries.insert(a, summary_for(a, "Alpha"));
        summaries.insert(c, summary_for(c, "Gamma"));
        // b was deleted out from under the user: no summary for it

        let view = UserView::build(&user, &summaries);
        let names: Vec<&str> = view.communities.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha"]);
    }
}
