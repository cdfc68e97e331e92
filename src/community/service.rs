use std::collections::HashMap;

use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::community::model::{
    CommunitiesPage, Community, CommunityView, load_community_summaries,
};
use crate::database::DB_NAME;
use crate::thread::thread_model::{Thread, ThreadView};
use crate::thread::thread_service::populate_posts;
use crate::user::model::{User, load_author_summaries};
use crate::utils::error::CustomError;
use crate::utils::helpers::{is_next, skip_amount};

pub struct CommunityService {
    communities: Collection<Community>,
    users: Collection<User>,
    threads: Collection<Thread>,
}

impl CommunityService {
    pub fn new(client: &Client) -> Self {
        let db = client.database(DB_NAME);
        CommunityService {
            communities: db.collection::<Community>("communities"),
            users: db.collection::<User>("users"),
            threads: db.collection::<Thread>("threads"),
        }
    }

    /// Insert a community and record it on its creator.
    pub async fn create_community(
        &self,
        name: String,
        username: String,
        image: Option<String>,
        bio: Option<String>,
        created_by: ObjectId,
    ) -> Result<Community, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to create community: {}", e))
        };

        let creator = self
            .users
            .find_one(doc! { "_id": created_by })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

        let community = Community {
            id: ObjectId::new(),
            username,
            name,
            image,
            bio,
            created_by: creator.id,
            threads: Vec::new(),
            members: vec![creator.id],
            created_at: Utc::now(),
        };

        self.communities
            .insert_one(&community)
            .await
            .map_err(db_err)?;

        self.users
            .update_one(
                doc! { "_id": creator.id },
                doc! { "$push": { "communities": community.id } },
            )
            .await
            .map_err(db_err)?;

        Ok(community)
    }

    pub async fn fetch_community_details(&self, id: &str) -> Result<CommunityView, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to fetch community details: {}", e))
        };

        let object_id = ObjectId::parse_str(id)
            .map_err(|_| CustomError::BadRequestError("Invalid community ID".to_string()))?;

        let community = self
            .communities
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Community not found".to_string()))?;

        let members = load_author_summaries(&self.users, &community.members)
            .await
            .map_err(db_err)?;

        Ok(CommunityView::build(&community, &members))
    }

    /// The community's threads in the order of its reference list, populated
    /// like a posts page.
    pub async fn fetch_community_posts(&self, id: &str) -> Result<Vec<ThreadView>, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to fetch community posts: {}", e))
        };

        let object_id = ObjectId::parse_str(id)
            .map_err(|_| CustomError::BadRequestError("Invalid community ID".to_string()))?;

        let community = self
            .communities
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Community not found".to_string()))?;

        let posts = if community.threads.is_empty() {
            Vec::new()
        } else {
            let cursor = self
                .threads
                .find(doc! { "_id": { "$in": community.threads.clone() } })
                .await
                .map_err(db_err)?;
            let docs: Vec<Thread> = cursor.try_collect().await.map_err(db_err)?;

            let mut by_id: HashMap<ObjectId, Thread> =
                docs.into_iter().map(|t| (t.id, t)).collect();
            community
                .threads
                .iter()
                .filter_map(|id| by_id.remove(id))
                .collect()
        };

        populate_posts(&self.threads, &self.users, &self.communities, &posts)
            .await
            .map_err(db_err)
    }

    /// Paginated community search.
    pub async fn fetch_communities(
        &self,
        search_string: &str,
        page_number: u64,
        page_size: i64,
    ) -> Result<CommunitiesPage, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to fetch communities: {}", e))
        };

        let skip = skip_amount(page_number, page_size);
        let filter = build_communities_filter(search_string);

        let cursor = self
            .communities
            .find(filter.clone())
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(page_size)
            .await
            .map_err(db_err)?;
        let communities: Vec<Community> = cursor.try_collect().await.map_err(db_err)?;

        let total_count = self
            .communities
            .count_documents(filter)
            .await
            .map_err(db_err)?;

        Ok(CommunitiesPage {
            is_next: is_next(total_count, skip, communities.len()),
            communities: communities.iter().map(Community::summary).collect(),
        })
    }

    pub async fn add_member_to_community(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<(), CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to add member to community: {}", e))
        };

        let community_oid = ObjectId::parse_str(community_id)
            .map_err(|_| CustomError::BadRequestError("Invalid community ID".to_string()))?;
        let user_oid = ObjectId::parse_str(user_id)
            .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

        let community = self
            .communities
            .find_one(doc! { "_id": community_oid })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Community not found".to_string()))?;

        let user = self
            .users
            .find_one(doc! { "_id": user_oid })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

        if community.members.contains(&user.id) {
            return Err(CustomError::ConflictError(
                "User is already a member of the community".to_string(),
            ));
        }

        self.communities
            .update_one(
                doc! { "_id": community.id },
                doc! { "$push": { "members": user.id } },
            )
            .await
            .map_err(db_err)?;

        self.users
            .update_one(
                doc! { "_id": user.id },
                doc! { "$push": { "communities": community.id } },
            )
            .await
            .map_err(db_err)?;

        Ok(())
    }

    pub async fn remove_user_from_community(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> Result<(), CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to remove user from community: {}", e))
        };

        let community_oid = ObjectId::parse_str(community_id)
            .map_err(|_| CustomError::BadRequestError("Invalid community ID".to_string()))?;
        let user_oid = ObjectId::parse_str(user_id)
            .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

        let community = self
            .communities
            .find_one(doc! { "_id": community_oid })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Community not found".to_string()))?;

        let user = self
            .users
            .find_one(doc! { "_id": user_oid })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

        self.communities
            .update_one(
                doc! { "_id": community.id },
                doc! { "$pull": { "members": user.id } },
            )
            .await
            .map_err(db_err)?;

        self.users
            .update_one(
                doc! { "_id": user.id },
                doc! { "$pull": { "communities": community.id } },
            )
            .await
            .map_err(db_err)?;

        Ok(())
    }

    pub async fn update_community_info(
        &self,
        community_id: &str,
        name: String,
        username: String,
        image: Option<String>,
    ) -> Result<(), CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to update community information: {}", e))
        };

        let object_id = ObjectId::parse_str(community_id)
            .map_err(|_| CustomError::BadRequestError("Invalid community ID".to_string()))?;

        let mut set = doc! { "name": name, "username": username };
        if let Some(image) = image {
            set.insert("image", image);
        }

        let result = self
            .communities
            .update_one(doc! { "_id": object_id }, doc! { "$set": set })
            .await
            .map_err(db_err)?;

        if result.matched_count == 0 {
            return Err(CustomError::NotFoundError(
                "Community not found".to_string(),
            ));
        }

        Ok(())
    }

    /// Delete a community, its threads, and the membership references that
    /// point at it. Thread ids are not retracted from user `threads` lists.
    pub async fn delete_community(&self, community_id: &str) -> Result<Community, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to delete community: {}", e))
        };

        let object_id = ObjectId::parse_str(community_id)
            .map_err(|_| CustomError::BadRequestError("Invalid community ID".to_string()))?;

        let deleted = self
            .communities
            .find_one_and_delete(doc! { "_id": object_id })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Community not found".to_string()))?;

        self.threads
            .delete_many(doc! { "community": deleted.id })
            .await
            .map_err(db_err)?;

        self.users
            .update_many(
                doc! { "communities": deleted.id },
                doc! { "$pull": { "communities": deleted.id } },
            )
            .await
            .map_err(db_err)?;

        Ok(deleted)
    }
}

/// Search filter over username/name, case-insensitive, metacharacters
/// escaped.
pub(crate) fn build_communities_filter(search_string: &str) -> Document {
    let mut filter = Document::new();

    let search = search_string.trim();
    if !search.is_empty() {
        let pattern = regex::escape(search);
        filter.insert(
            "$or",
            vec![
                doc! { "username": { "$regex": &pattern, "$options": "i" } },
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_matches_everything() {
        assert!(build_communities_filter("").is_empty());
        assert!(build_communities_filter("  ").is_empty());
    }

    #[test]
    fn search_builds_case_insensitive_clauses() {
        let filter = build_communities_filter("rust");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        let name_clause = clauses[1].as_document().unwrap();
        assert_eq!(
            name_clause.get_document("name").unwrap().get_str("$options").unwrap(),
            "i"
        );
    }
}
