use std::collections::{HashMap, HashSet};

use futures_util::TryStreamExt;
use mongodb::bson::{Bson, DateTime, Document, doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::community::model::{Community, load_community_summaries};
use crate::database::DB_NAME;
use crate::thread::thread_model::{Thread, ThreadView};
use crate::thread::thread_service::populate_posts;
use crate::user::model::{User, UserView, UsersPage, load_author_summaries};
use crate::utils::error::CustomError;
use crate::utils::helpers::{is_next, skip_amount};
use crate::utils::validation::validate_profile;

pub struct UserService {
    users: Collection<User>,
    threads: Collection<Thread>,
    communities: Collection<Community>,
}

impl UserService {
    pub fn new(client: &Client) -> Self {
        let db = client.database(DB_NAME);
        UserService {
            users: db.collection::<User>("users"),
            threads: db.collection::<Thread>("threads"),
            communities: db.collection::<Community>("communities"),
        }
    }

    /// Validate and upsert a user profile. A fresh document gets empty
    /// reference lists; an existing one keeps them.
    pub async fn upsert_user(
        &self,
        user_id: ObjectId,
        name: String,
        username: String,
        bio: String,
        image: String,
    ) -> Result<(), CustomError> {
        validate_profile(&name, &username, &bio, Some(&image))?;

        let now = DateTime::now();
        self.users
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$set": {
                        "name": name,
                        "username": username,
                        "bio": bio,
                        "image": image,
                        "onboarded": true,
                        "updated_at": now,
                    },
                    "$setOnInsert": {
                        "threads": [],
                        "communities": [],
                        "created_at": now,
                    },
                },
            )
            .upsert(true)
            .await
            .map_err(|e| {
                CustomError::DatabaseError(format!("Failed to create/update user: {}", e))
            })?;

        Ok(())
    }

    pub async fn fetch_user(&self, user_id: ObjectId) -> Result<UserView, CustomError> {
        let db_err =
            |e: mongodb::error::Error| CustomError::DatabaseError(format!("Failed to fetch user: {}", e));

        let user = self
            .users
            .find_one(doc! { "_id": user_id })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

        let communities = load_community_summaries(&self.communities, &user.communities)
            .await
            .map_err(db_err)?;

        Ok(UserView::build(&user, &communities))
    }

    /// The user's top-level threads, newest first, populated like a posts
    /// page.
    pub async fn fetch_user_posts(&self, user_id: ObjectId) -> Result<Vec<ThreadView>, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to fetch user posts: {}", e))
        };

        let cursor = self
            .threads
            .find(doc! { "author": user_id, "parent_id": Bson::Null })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(db_err)?;
        let posts: Vec<Thread> = cursor.try_collect().await.map_err(db_err)?;

        populate_posts(&self.threads, &self.users, &self.communities, &posts)
            .await
            .map_err(db_err)
    }

    /// Paginated user search, excluding the requesting user.
    pub async fn fetch_users(
        &self,
        user_id: ObjectId,
        search_string: &str,
        page_number: u64,
        page_size: i64,
    ) -> Result<UsersPage, CustomError> {
        let db_err =
            |e: mongodb::error::Error| CustomError::DatabaseError(format!("Failed to fetch users: {}", e));

        let skip = skip_amount(page_number, page_size);
        let filter = build_users_filter(&user_id, search_string);

        let cursor = self
            .users
            .find(filter.clone())
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(page_size)
            .await
            .map_err(db_err)?;
        let users: Vec<User> = cursor.try_collect().await.map_err(db_err)?;

        let total_users_count = self.users.count_documents(filter).await.map_err(db_err)?;

        Ok(UsersPage {
            is_next: is_next(total_users_count, skip, users.len()),
            users: users.iter().map(User::summary).collect(),
        })
    }

    /// Replies the user has received: threads whose id appears in the
    /// children of any of the user's threads, written by someone else.
    pub async fn get_activity(&self, user_id: ObjectId) -> Result<Vec<ThreadView>, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to fetch activity: {}", e))
        };

        let cursor = self
            .threads
            .find(doc! { "author": user_id })
            .await
            .map_err(db_err)?;
        let user_threads: Vec<Thread> = cursor.try_collect().await.map_err(db_err)?;

        let child_ids: Vec<ObjectId> = user_threads
            .iter()
            .flat_map(|t| t.children.iter().copied())
            .collect();
        if child_ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .threads
            .find(doc! { "_id": { "$in": child_ids }, "author": { "$ne": user_id } })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(db_err)?;
        let replies: Vec<Thread> = cursor.try_collect().await.map_err(db_err)?;

        let author_ids: Vec<ObjectId> = replies
            .iter()
            .map(|r| r.author)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let authors = load_author_summaries(&self.users, &author_ids)
            .await
            .map_err(db_err)?;

        Ok(replies
            .iter()
            .filter_map(|r| ThreadView::build(r, &authors, &HashMap::new(), Vec::new()))
            .collect())
    }
}

/// Search filter over username/name, case-insensitive, with the requesting
/// user excluded. The search input is escaped so regex metacharacters match
/// literally.
pub(crate) fn build_users_filter(exclude_id: &ObjectId, search_string: &str) -> Document {
    let mut filter = doc! { "_id": { "$ne": *exclude_id } };

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
    fn empty_search_only_excludes_the_requesting_user() {
        let id = ObjectId::new();
        let filter = build_users_filter(&id, "   ");
        assert!(filter.get("$or").is_none());
        assert_eq!(
            filter.get_document("_id").unwrap().get_object_id("$ne").unwrap(),
            id
        );
    }

    #[test]
    fn search_input_is_escaped() {
        let filter = build_users_filter(&ObjectId::new(), "a.b*");
        let clauses = filter.get_array("$or").unwrap();
        let username_clause = clauses[0].as_document().unwrap();
        let regex = username_clause
            .get_document("username")
            .unwrap()
            .get_str("$regex")
            .unwrap();
        assert_eq!(regex, r"a\.b\*");
    }
}
