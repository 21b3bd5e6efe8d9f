//! Upsert and deduplication of parsed posts
//!
//! Posts are keyed by canonical URL. A URL seen before updates its existing
//! row; a new URL creates one. The tag set of a post is replaced on every
//! sighting, never accumulated.

use crate::ingest::ParsedPost;
use crate::storage::{NewPost, PostStore, SourceRecord, StorageResult, TagRecord, TagStore};
use crate::timestamp::now_local;
use crate::url::non_blank;
use indexmap::{IndexMap, IndexSet};

/// Merges a batch of parsed posts into the store
///
/// # Merge Rules
///
/// - Posts with a blank canonical URL or title are skipped and not counted
/// - The canonical URL is trimmed; a missing publication date becomes now
/// - Existing posts get title, summary, author and publication date
///   unconditionally; the thumbnail only when the new one is non-blank
/// - Fetched and updated timestamps are refreshed on every sighting
/// - Tag associations are replaced with this batch's tags
///
/// # Arguments
///
/// * `store` - The post and tag store
/// * `source` - The source the batch came from
/// * `posts` - The parsed posts, in parser order
///
/// # Returns
///
/// * `Ok(usize)` - Number of posts created or updated
/// * `Err(StorageError)` - A store operation failed
pub fn upsert<S>(store: &mut S, source: &SourceRecord, posts: &[ParsedPost]) -> StorageResult<usize>
where
    S: PostStore + TagStore + ?Sized,
{
    let mut saved_count = 0;

    for post in posts {
        let canonical_url = post.canonical_url.trim();
        if canonical_url.is_empty() || post.title.trim().is_empty() {
            tracing::debug!(
                "Skipping post without canonical URL or title from {}",
                source.name
            );
            continue;
        }

        let published_at = post.published_at.unwrap_or_else(now_local);
        let tag_names: Vec<String> = post.tags.iter().cloned().collect();
        let tags = find_or_create_tags(store, &tag_names)?;

        let post_id = match store.find_post_by_canonical_url(canonical_url)? {
            Some(mut existing) => {
                let now = now_local();
                existing.title = post.title.clone();
                existing.summary = post.summary.clone();
                existing.author = post.author.clone();
                if let Some(thumbnail_url) = non_blank(post.thumbnail_url.as_deref()) {
                    existing.thumbnail_url = Some(thumbnail_url.to_string());
                }
                existing.published_at = published_at;
                existing.fetched_at = now;
                existing.updated_at = now;
                store.update_post(&existing)?;
                existing.id
            }
            None => store.insert_post(&NewPost {
                source_id: source.id,
                canonical_url: canonical_url.to_string(),
                title: post.title.clone(),
                summary: post.summary.clone(),
                author: post.author.clone(),
                thumbnail_url: non_blank(post.thumbnail_url.as_deref()).map(str::to_string),
                published_at,
            })?,
        };

        let tag_ids: Vec<i64> = tags.iter().map(|tag| tag.id).collect();
        store.replace_post_tags(post_id, &tag_ids)?;
        saved_count += 1;
    }

    Ok(saved_count)
}

/// Resolves tag names into tag rows, creating the missing ones
///
/// Names are trimmed, blank names dropped and duplicates collapsed; the
/// result follows the first-seen order of the names.
pub fn find_or_create_tags<S>(store: &mut S, raw_names: &[String]) -> StorageResult<Vec<TagRecord>>
where
    S: TagStore + ?Sized,
{
    let names: IndexSet<String> = raw_names
        .iter()
        .filter_map(|name| non_blank(Some(name.as_str())))
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let lookup: Vec<String> = names.iter().cloned().collect();
    let mut by_name: IndexMap<String, TagRecord> = store
        .find_tags_by_names(&lookup)?
        .into_iter()
        .map(|tag| (tag.name.clone(), tag))
        .collect();

    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        let tag = match by_name.get(&name) {
            Some(tag) => tag.clone(),
            None => {
                let created = store.insert_tag(&name)?;
                by_name.insert(name, created.clone());
                created
            }
        };
        tags.push(tag);
    }

    Ok(tags)
}
