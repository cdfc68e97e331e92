use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::community::model::CommunitySummary;
use crate::user::model::AuthorSummary;

/// A post or a comment. A thread with a `parent_id` is a comment on that
/// parent; a thread without one is a top-level post.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Thread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub text: String,
    pub author: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    /// Direct comments, in the order they were added.
    pub children: Vec<ObjectId>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Thread {
    pub fn new(
        text: String,
        author: ObjectId,
        community: Option<ObjectId>,
        parent_id: Option<ObjectId>,
    ) -> Self {
        Thread {
            id: ObjectId::new(),
            text,
            author,
            community,
            parent_id,
            children: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Thread with its author and community references resolved. `children`
/// holds the populated subtree down to the depth the query requested;
/// deeper levels are simply left empty.
#[derive(Debug, Serialize)]
pub struct ThreadView {
    pub id: String,
    pub text: String,
    pub parent_id: Option<String>,
    pub author: AuthorSummary,
    pub community: Option<CommunitySummary>,
    pub children: Vec<ThreadView>,
    pub created_at: DateTime<Utc>,
}

impl ThreadView {
    /// Resolve one thread document against already-fetched author and
    /// community summaries. Returns None when the author document is missing
    /// (a dangling reference left behind by the non-transactional delete).
    pub fn build(
        thread: &Thread,
        authors: &HashMap<ObjectId, AuthorSummary>,
        communities: &HashMap<ObjectId, CommunitySummary>,
        children: Vec<ThreadView>,
    ) -> Option<ThreadView> {
        let author = authors.get(&thread.author)?.clone();
        let community = thread
            .community
            .and_then(|id| communities.get(&id).cloned());

        Some(ThreadView {
            id: thread.id.to_hex(),
            text: thread.text.clone(),
            parent_id: thread.parent_id.map(|id| id.to_hex()),
            author,
            community,
            children,
            created_at: thread.created_at,
        })
    }

    /// Detach the views for `parent.children` from `views`, preserving the
    /// order of the children array. Ids without a fetched view are skipped.
    pub fn attach_children(
        parent: &Thread,
        views: &mut HashMap<ObjectId, ThreadView>,
    ) -> Vec<ThreadView> {
        parent
            .children
            .iter()
            .filter_map(|id| views.remove(id))
            .collect()
    }
}

#[derive(Deserialize)]
pub struct CreateThreadRequest {
    pub text: String,
    pub author: String,
    pub community_id: Option<String>,
    pub path: String,
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub comment_text: String,
    pub user_id: String,
    pub path: String,
}

#[derive(Deserialize)]
pub struct DeleteThreadQuery {
    pub path: Option<String>,
}

#[derive(Deserialize)]
pub struct FetchPostsQuery {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PostsPage {
    pub posts: Vec<ThreadView>,
    pub is_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(author: ObjectId, children: Vec<ObjectId>) -> Thread {
        let mut t = Thread::new("hello".into(), author, None, None);
        t.children = children;
        t
    }

    fn author_map(ids: &[ObjectId]) -> HashMap<ObjectId, AuthorSummary> {
        ids.iter()
            .map(|id| {
                (
                    *id,
                    AuthorSummary {
                        id: id.to_hex(),
                        name: "n".into(),
                        username: "u".into(),
                        image: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn build_returns_none_without_an_author() {
        let t = thread(ObjectId::new(), Vec::new());
        assert!(ThreadView::build(&t, &HashMap::new(), &HashMap::new(), Vec::new()).is_none());
    }

    #[test]
    fn build_attaches_community_when_resolved() {
        let author = ObjectId::new();
        let community = ObjectId::new();
        let mut t = thread(author, Vec::new());
        t.community = Some(community);

        let mut communities = HashMap::new();
        communities.insert(
            community,
            CommunitySummary {
                id: community.to_hex(),
                name: "c".into(),
                username: "c".into(),
                image: None,
            },
        );

        let view =
            ThreadView::build(&t, &author_map(&[author]), &communities, Vec::new()).unwrap();
        assert_eq!(view.community.unwrap().id, community.to_hex());

        // unresolved community id degrades to None rather than failing
        let view =
            ThreadView::build(&t, &author_map(&[author]), &HashMap::new(), Vec::new()).unwrap();
        assert!(view.community.is_none());
    }

    #[test]
    fn attach_children_follows_the_children_array_order() {
        let author = ObjectId::new();
        let (c1, c2, c3) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        let parent = thread(author, vec![c2, c3, c1]);

        let authors = author_map(&[author]);
        let mut views: HashMap<ObjectId, ThreadView> = [c1, c2, c3]
            .into_iter()
            .map(|id| {
                let mut child = thread(author, Vec::new());
                child.id = id;
                let view =
                    ThreadView::build(&child, &authors, &HashMap::new(), Vec::new()).unwrap();
                (id, view)
            })
            .collect();

        let attached = ThreadView::attach_children(&parent, &mut views);
        let ids: Vec<String> = attached.into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![c2.to_hex(), c3.to_hex(), c1.to_hex()]);
        assert!(views.is_empty());
    }

    #[test]
    fn attach_children_skips_missing_views() {
        let author = ObjectId::new();
        let (c1, c2) = (ObjectId::new(), ObjectId::new());
        let parent = thread(author, vec![c1, c2]);

        let authors = author_map(&[author]);
        let mut views = HashMap::new();
        let mut child = thread(author, Vec::new());
        child.id = c2;
        views.insert(
            c2,
            ThreadView::build(&child, &authors, &HashMap::new(), Vec::new()).unwrap(),
        );

        let attached = ThreadView::attach_children(&parent, &mut views);
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].id, c2.to_hex());
    }
}
