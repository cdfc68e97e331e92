use std::collections::{HashMap, HashSet};

use futures_util::TryStreamExt;
use mongodb::bson::{Bson, doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::community::model::{Community, load_community_summaries};
use crate::database::DB_NAME;
use crate::thread::thread_model::{PostsPage, Thread, ThreadView};
use crate::user::model::{User, load_author_summaries};
use crate::utils::error::CustomError;
use crate::utils::helpers::{is_next, skip_amount};

pub struct ThreadService {
    threads: Collection<Thread>,
    users: Collection<User>,
    communities: Collection<Community>,
}

impl ThreadService {
    pub fn new(client: &Client) -> Self {
        let db = client.database(DB_NAME);
        ThreadService {
            threads: db.collection::<Thread>("threads"),
            users: db.collection::<User>("users"),
            communities: db.collection::<Community>("communities"),
        }
    }

    /// Create a top-level thread. The community id is attached only when it
    /// resolves to an existing community; otherwise the thread is personal.
    pub async fn create_thread(
        &self,
        text: String,
        author: ObjectId,
        community_id: Option<&str>,
    ) -> Result<Thread, CustomError> {
        let db_err =
            |e: mongodb::error::Error| CustomError::DatabaseError(format!("Failed to create thread: {}", e));

        let community = match community_id {
            Some(id) => {
                let community_oid = ObjectId::parse_str(id)
                    .map_err(|_| CustomError::BadRequestError("Invalid community ID".to_string()))?;
                self.communities
                    .find_one(doc! { "_id": community_oid })
                    .await
                    .map_err(db_err)?
                    .map(|c| c.id)
            }
            None => None,
        };

        let thread = Thread::new(text, author, community, None);

        self.threads.insert_one(&thread).await.map_err(db_err)?;

        self.users
            .update_one(
                doc! { "_id": author },
                doc! { "$push": { "threads": thread.id } },
            )
            .await
            .map_err(db_err)?;

        if let Some(community_oid) = community {
            self.communities
                .update_one(
                    doc! { "_id": community_oid },
                    doc! { "$push": { "threads": thread.id } },
                )
                .await
                .map_err(db_err)?;
        }

        Ok(thread)
    }

    /// Paginated listing of top-level threads, newest first, each populated
    /// with author, community and one level of children.
    pub async fn fetch_posts(&self, page_number: u64, page_size: i64) -> Result<PostsPage, CustomError> {
        let db_err =
            |e: mongodb::error::Error| CustomError::DatabaseError(format!("Failed to fetch posts: {}", e));

        let skip = skip_amount(page_number, page_size);
        let filter = doc! { "parent_id": Bson::Null };

        let cursor = self
            .threads
            .find(filter.clone())
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(page_size)
            .await
            .map_err(db_err)?;
        let posts: Vec<Thread> = cursor.try_collect().await.map_err(db_err)?;

        let total_posts_count = self.threads.count_documents(filter).await.map_err(db_err)?;

        let views = populate_posts(&self.threads, &self.users, &self.communities, &posts)
            .await
            .map_err(db_err)?;

        Ok(PostsPage {
            is_next: is_next(total_posts_count, skip, posts.len()),
            posts: views,
        })
    }

    /// Single-thread fetch with author, community and two levels of children
    /// resolved, each level with its authors attached.
    pub async fn fetch_thread_by_id(&self, id: &str) -> Result<ThreadView, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to fetch thread by id: {}", e))
        };

        let object_id = ObjectId::parse_str(id)
            .map_err(|_| CustomError::BadRequestError("Invalid thread ID".to_string()))?;

        let thread = self
            .threads
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Thread not found".to_string()))?;

        let level_one = self.find_by_ids(&thread.children).await.map_err(db_err)?;
        let grandchild_ids: Vec<ObjectId> = level_one
            .iter()
            .flat_map(|t| t.children.iter().copied())
            .collect();
        let level_two = self.find_by_ids(&grandchild_ids).await.map_err(db_err)?;

        let mut author_ids: HashSet<ObjectId> = HashSet::from([thread.author]);
        author_ids.extend(level_one.iter().map(|t| t.author));
        author_ids.extend(level_two.iter().map(|t| t.author));
        let community_ids: Vec<ObjectId> = thread.community.into_iter().collect();

        let authors =
            load_author_summaries(&self.users, &author_ids.into_iter().collect::<Vec<_>>())
                .await
                .map_err(db_err)?;
        let communities = load_community_summaries(&self.communities, &community_ids)
            .await
            .map_err(db_err)?;

        let mut leaf_views: HashMap<ObjectId, ThreadView> = level_two
            .iter()
            .filter_map(|t| {
                ThreadView::build(t, &authors, &communities, Vec::new()).map(|v| (t.id, v))
            })
            .collect();

        let mut child_views: HashMap<ObjectId, ThreadView> = level_one
            .iter()
            .filter_map(|t| {
                let grandchildren = ThreadView::attach_children(t, &mut leaf_views);
                ThreadView::build(t, &authors, &communities, grandchildren).map(|v| (t.id, v))
            })
            .collect();

        let children = ThreadView::attach_children(&thread, &mut child_views);
        ThreadView::build(&thread, &authors, &communities, children)
            .ok_or_else(|| CustomError::NotFoundError("Thread author not found".to_string()))
    }

    /// Insert a comment under `thread_id` and record it in the parent's
    /// children list. Fails without mutating anything when the parent is
    /// missing.
    pub async fn add_comment_to_thread(
        &self,
        thread_id: &str,
        comment_text: String,
        user_id: ObjectId,
    ) -> Result<Thread, CustomError> {
        let db_err = |e: mongodb::error::Error| {
            CustomError::DatabaseError(format!("Failed to add comment to thread: {}", e))
        };

        let object_id = ObjectId::parse_str(thread_id)
            .map_err(|_| CustomError::BadRequestError("Invalid thread ID".to_string()))?;

        let original_thread = self
            .threads
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Thread not found".to_string()))?;

        let comment = Thread::new(comment_text, user_id, None, Some(original_thread.id));

        self.threads.insert_one(&comment).await.map_err(db_err)?;

        self.threads
            .update_one(
                doc! { "_id": original_thread.id },
                doc! { "$push": { "children": comment.id } },
            )
            .await
            .map_err(db_err)?;

        Ok(comment)
    }

    /// Every thread transitively reachable from `thread_id` via the
    /// parent/child relation, as a flat pre-order sequence (each child
    /// precedes its own descendants). Traversal is iterative with an explicit
    /// stack, so tree depth never threatens the call stack. The parent
    /// relation is assumed acyclic; a corrupted graph would loop here.
    pub async fn collect_descendants(
        &self,
        thread_id: &ObjectId,
    ) -> Result<Vec<Thread>, mongodb::error::Error> {
        let mut descendants = Vec::new();

        let mut stack = self.children_of(thread_id).await?;
        stack.reverse();

        while let Some(thread) = stack.pop() {
            let mut children = self.children_of(&thread.id).await?;
            children.reverse();
            descendants.push(thread);
            stack.append(&mut children);
        }

        Ok(descendants)
    }

    async fn children_of(&self, parent_id: &ObjectId) -> Result<Vec<Thread>, mongodb::error::Error> {
        let cursor = self.threads.find(doc! { "parent_id": *parent_id }).await?;
        cursor.try_collect().await
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Thread>, mongodb::error::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .threads
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        cursor.try_collect().await
    }

    /// Delete a thread together with all its descendants, then retract the
    /// deleted ids from the affected users' and communities' reference lists.
    ///
    /// The descendant traversal must complete before the bulk delete runs: it
    /// reads the very documents the delete removes. The three collection
    /// writes are sequential and not transactional, so a failure partway
    /// through can leave users or communities referencing deleted threads.
    pub async fn delete_thread(&self, id: &str) -> Result<(), CustomError> {
        let db_err =
            |e: mongodb::error::Error| CustomError::DatabaseError(format!("Failed to delete thread: {}", e));

        let object_id = ObjectId::parse_str(id)
            .map_err(|_| CustomError::BadRequestError("Invalid thread ID".to_string()))?;

        let main_thread = self
            .threads
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(db_err)?
            .ok_or_else(|| CustomError::NotFoundError("Thread to delete not found".to_string()))?;

        let descendants = self.collect_descendants(&object_id).await.map_err(db_err)?;

        let (thread_ids, author_ids, community_ids) = affected_ids(&main_thread, &descendants);

        self.threads
            .delete_many(doc! { "_id": { "$in": thread_ids.clone() } })
            .await
            .map_err(db_err)?;

        self.users
            .update_many(
                doc! { "_id": { "$in": author_ids } },
                doc! { "$pull": { "threads": { "$in": thread_ids.clone() } } },
            )
            .await
            .map_err(db_err)?;

        if !community_ids.is_empty() {
            self.communities
                .update_many(
                    doc! { "_id": { "$in": community_ids } },
                    doc! { "$pull": { "threads": { "$in": thread_ids } } },
                )
                .await
                .map_err(db_err)?;
        }

        Ok(())
    }
}

/// The full id set to delete plus the distinct authors and communities whose
/// reference lists must be retracted, computed over the target thread and its
/// descendants.
pub(crate) fn affected_ids(
    main_thread: &Thread,
    descendants: &[Thread],
) -> (Vec<ObjectId>, Vec<ObjectId>, Vec<ObjectId>) {
    let mut thread_ids = Vec::with_capacity(descendants.len() + 1);
    thread_ids.push(main_thread.id);
    thread_ids.extend(descendants.iter().map(|t| t.id));

    let mut author_ids = Vec::new();
    let mut seen_authors = HashSet::new();
    let mut community_ids = Vec::new();
    let mut seen_communities = HashSet::new();

    for thread in std::iter::once(main_thread).chain(descendants.iter()) {
        if seen_authors.insert(thread.author) {
            author_ids.push(thread.author);
        }
        if let Some(community) = thread.community {
            if seen_communities.insert(community) {
                community_ids.push(community);
            }
        }
    }

    (thread_ids, author_ids, community_ids)
}

/// Populate a batch of threads with their authors, communities and one level
/// of children (with the children's authors). Shared by the post listing,
/// user profile and community profile queries.
pub(crate) async fn populate_posts(
    threads: &Collection<Thread>,
    users: &Collection<User>,
    communities: &Collection<Community>,
    posts: &[Thread],
) -> Result<Vec<ThreadView>, mongodb::error::Error> {
    let child_ids: Vec<ObjectId> = posts
        .iter()
        .flat_map(|p| p.children.iter().copied())
        .collect();

    let children: Vec<Thread> = if child_ids.is_empty() {
        Vec::new()
    } else {
        threads
            .find(doc! { "_id": { "$in": child_ids } })
            .await?
            .try_collect()
            .await?
    };

    let mut author_ids: HashSet<ObjectId> = posts.iter().map(|p| p.author).collect();
    author_ids.extend(children.iter().map(|c| c.author));
    let community_ids: HashSet<ObjectId> = posts.iter().filter_map(|p| p.community).collect();

    let authors =
        load_author_summaries(users, &author_ids.into_iter().collect::<Vec<_>>()).await?;
    let community_summaries =
        load_community_summaries(communities, &community_ids.into_iter().collect::<Vec<_>>())
            .await?;

    let mut child_views: HashMap<ObjectId, ThreadView> = children
        .iter()
        .filter_map(|c| {
            ThreadView::build(c, &authors, &community_summaries, Vec::new()).map(|v| (c.id, v))
        })
        .collect();

    Ok(posts
        .iter()
        .filter_map(|p| {
            let kids = ThreadView::attach_children(p, &mut child_views);
            ThreadView::build(p, &authors, &community_summaries, kids)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_by(author: ObjectId, community: Option<ObjectId>) -> Thread {
        Thread::new("t".into(), author, community, None)
    }

    #[test]
    fn affected_ids_cover_target_and_descendants() {
        // T1 has children T2, T3; T2 has child T4
        let (a1, a2, a3) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        let community = ObjectId::new();

        let t1 = thread_by(a1, Some(community));
        let t2 = thread_by(a2, None);
        let t3 = thread_by(a3, None);
        let t4 = thread_by(a1, None);
        let descendants = vec![t2.clone(), t4.clone(), t3.clone()];

        let (thread_ids, author_ids, community_ids) = affected_ids(&t1, &descendants);

        assert_eq!(thread_ids, vec![t1.id, t2.id, t4.id, t3.id]);
        assert_eq!(author_ids, vec![a1, a2, a3]);
        assert_eq!(community_ids, vec![community]);
    }

    #[test]
    fn affected_ids_deduplicate_authors_and_communities() {
        let author = ObjectId::new();
        let community = ObjectId::new();

        let root = thread_by(author, Some(community));
        let descendants = vec![
            thread_by(author, Some(community)),
            thread_by(author, Some(community)),
        ];

        let (thread_ids, author_ids, community_ids) = affected_ids(&root, &descendants);

        assert_eq!(thread_ids.len(), 3);
        assert_eq!(author_ids, vec![author]);
        assert_eq!(community_ids, vec![community]);
    }

    #[test]
    fn affected_ids_for_a_leaf_thread() {
        let author = ObjectId::new();
        let leaf = thread_by(author, None);

        let (thread_ids, author_ids, community_ids) = affected_ids(&leaf, &[]);

        assert_eq!(thread_ids, vec![leaf.id]);
        assert_eq!(author_ids, vec![author]);
        assert!(community_ids.is_empty());
    }
}
