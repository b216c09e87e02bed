//! Flattening of youtubei renderer trees into plain JSON.
//!
//! Responses nest the data we want at varying depths depending on the
//! endpoint and on whether the page is a first load or a continuation, so
//! lookups walk the whole tree instead of following fixed paths.

use serde_json::{json, Map, Value};

use crate::providers::metadata::{CommentPage, CommentSort, SearchBatch, VideoInfo};

/// Renderers that describe a single video.
const VIDEO_RENDERERS: [&str; 5] = [
    "videoRenderer",
    "compactVideoRenderer",
    "gridVideoRenderer",
    "endScreenVideoRenderer",
    "lockupViewModel",
];

/// Visit every `(key, value)` pair in document order. Returning `false`
/// from `visit` skips the subtree under that key.
fn walk<'a>(value: &'a Value, visit: &mut dyn FnMut(&'a str, &'a Value) -> bool) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if visit(key.as_str(), child) {
                    walk(child, visit);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, visit);
            }
        }
        _ => {}
    }
}

fn find_all<'a>(root: &'a Value, wanted: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    walk(root, &mut |key, value| {
        if key == wanted {
            found.push(value);
        }
        true
    });
    found
}

fn find_first<'a>(root: &'a Value, wanted: &str) -> Option<&'a Value> {
    find_all(root, wanted).into_iter().next()
}

/// Read a text node: `simpleText`, concatenated `runs`, or a plain `content`.
pub fn text(node: &Value) -> Option<String> {
    if let Some(simple) = node.get("simpleText").and_then(Value::as_str) {
        return Some(simple.to_string());
    }
    if let Some(runs) = node.get("runs").and_then(Value::as_array) {
        let joined: String = runs
            .iter()
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .collect();
        return Some(joined);
    }
    node.get("content")
        .and_then(Value::as_str)
        .or_else(|| node.as_str())
        .map(str::to_string)
}

fn text_at(node: &Value, keys: &[&str]) -> Value {
    keys.iter()
        .find_map(|key| node.get(*key).and_then(text))
        .map(Value::String)
        .unwrap_or(Value::Null)
}

fn thumbnails(node: &Value) -> Value {
    node.pointer("/thumbnail/thumbnails")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

/// Summarise one video renderer as `{id, title, author, duration, view_count, published, thumbnails}`.
pub fn video_summary(kind: &str, renderer: &Value) -> Option<Value> {
    if kind == "lockupViewModel" {
        return lockup_summary(renderer);
    }
    let id = renderer.get("videoId").and_then(Value::as_str)?;
    Some(json!({
        "id": id,
        "title": text_at(renderer, &["title", "headline"]),
        "author": text_at(renderer, &["ownerText", "longBylineText", "shortBylineText"]),
        "duration": text_at(renderer, &["lengthText"]),
        "view_count": text_at(renderer, &["viewCountText", "shortViewCountText"]),
        "published": text_at(renderer, &["publishedTimeText"]),
        "thumbnails": thumbnails(renderer),
    }))
}

// Newer watch pages describe related videos as lockups: the id sits at
// `contentId`, text at `metadata.lockupMetadataViewModel`.
fn lockup_summary(lockup: &Value) -> Option<Value> {
    if lockup.get("contentType").and_then(Value::as_str) != Some("LOCKUP_CONTENT_TYPE_VIDEO") {
        return None;
    }
    let id = lockup.get("contentId").and_then(Value::as_str)?;
    let metadata = lockup.pointer("/metadata/lockupMetadataViewModel");
    let title = metadata
        .and_then(|m| m.get("title"))
        .and_then(text)
        .map(Value::String)
        .unwrap_or(Value::Null);
    let rows: Vec<String> = metadata
        .map(|m| find_all(m, "metadataParts"))
        .unwrap_or_default()
        .into_iter()
        .filter_map(Value::as_array)
        .flat_map(|parts| parts.iter().filter_map(|part| part.get("text").and_then(text)))
        .collect();
    let thumbs = lockup
        .pointer("/contentImage/thumbnailViewModel/image/sources")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));

    Some(json!({
        "id": id,
        "title": title,
        "author": rows.first(),
        "duration": Value::Null,
        "view_count": rows.get(1),
        "published": rows.get(2),
        "thumbnails": thumbs,
    }))
}

/// Every video in the tree, in document order.
pub fn collect_videos(root: &Value) -> Vec<Value> {
    let mut videos = Vec::new();
    walk(root, &mut |key, value| {
        if VIDEO_RENDERERS.contains(&key) {
            videos.extend(video_summary(key, value));
            return false;
        }
        true
    });
    videos
}

fn continuation_command_token(node: &Value) -> Option<String> {
    find_first(node, "continuationCommand")
        .and_then(|command| command.get("token"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Tokens of every `continuationItemRenderer`, in document order.
pub fn continuation_tokens(root: &Value) -> Vec<String> {
    find_all(root, "continuationItemRenderer")
        .into_iter()
        .filter_map(continuation_command_token)
        .collect()
}

pub fn search_batch(root: &Value) -> SearchBatch {
    SearchBatch {
        videos: collect_videos(root),
        continuation: continuation_tokens(root).into_iter().next(),
    }
}

/// Search `params` for a sort order. Every value also restricts results to videos.
pub fn search_params(sort_by: Option<&str>) -> Option<&'static str> {
    match sort_by? {
        "relevance" => Some("CAASAhAB"),
        "rating" => Some("CAESAhAB"),
        "upload_date" => Some("CAISAhAB"),
        "view_count" => Some("CAMSAhAB"),
        _ => None,
    }
}

/// Combine `player` and `next` responses into a [`VideoInfo`].
pub fn video_info(player: &Value, next: &Value) -> VideoInfo {
    let details = &player["videoDetails"];
    let primary = find_first(next, "videoPrimaryInfoRenderer").unwrap_or(&Value::Null);
    let secondary = find_first(next, "videoSecondaryInfoRenderer").unwrap_or(&Value::Null);
    let owner = find_first(secondary, "videoOwnerRenderer").unwrap_or(&Value::Null);

    let mut body = Map::new();
    body.insert(
        "basic_info".into(),
        json!({
            "id": details.get("videoId"),
            "title": details.get("title"),
            "author": details.get("author"),
            "channel_id": details.get("channelId"),
            "duration": details
                .get("lengthSeconds")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok()),
            "view_count": details
                .get("viewCount")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok()),
            "short_description": details.get("shortDescription"),
            "keywords": details.get("keywords").cloned().unwrap_or_else(|| json!([])),
            "is_live": details.get("isLiveContent").cloned().unwrap_or(Value::Bool(false)),
            "thumbnails": details
                .pointer("/thumbnail/thumbnails")
                .cloned()
                .unwrap_or_else(|| json!([])),
        }),
    );
    body.insert(
        "primary_info".into(),
        json!({
            "title": text_at(primary, &["title"]),
            "view_count": primary
                .pointer("/viewCount/videoViewCountRenderer/viewCount")
                .and_then(text),
            "published": text_at(primary, &["dateText"]),
            "relative_date": text_at(primary, &["relativeDateText"]),
        }),
    );
    body.insert(
        "secondary_info".into(),
        json!({
            "owner": {
                "name": text_at(owner, &["title"]),
                "channel_id": owner.pointer("/navigationEndpoint/browseEndpoint/browseId"),
                "subscriber_count": text_at(owner, &["subscriberCountText"]),
                "thumbnails": thumbnails(owner),
            },
            "description": secondary
                .get("attributedDescription")
                .and_then(text)
                .or_else(|| secondary.get("description").and_then(text)),
        }),
    );
    body.insert(
        "playability_status".into(),
        player.get("playabilityStatus").cloned().unwrap_or(Value::Null),
    );
    body.insert(
        "streaming_data".into(),
        player.get("streamingData").cloned().unwrap_or(Value::Null),
    );

    let watch_next_feed = next
        .pointer("/contents/twoColumnWatchNextResults/secondaryResults")
        .map(collect_videos)
        .unwrap_or_default();
    let related_videos = next
        .get("playerOverlays")
        .map(collect_videos)
        .unwrap_or_default();

    VideoInfo {
        details: body,
        watch_next_feed,
        related_videos,
    }
}

/// Token that loads the first comment page of a watch page.
pub fn comment_section_token(next: &Value) -> Option<String> {
    find_all(next, "itemSectionRenderer")
        .into_iter()
        .find(|section| {
            section.get("sectionIdentifier").and_then(Value::as_str) == Some("comment-item-section")
        })
        .and_then(|section| continuation_tokens(section).into_iter().next())
}

/// Token that reloads comments in the requested order, from the sort menu.
pub fn comment_sort_token(page: &Value, sort: CommentSort) -> Option<String> {
    let index = match sort {
        CommentSort::Top => 0,
        CommentSort::Newest => 1,
    };
    find_first(page, "sortFilterSubMenuRenderer")
        .and_then(|menu| menu.get("subMenuItems"))
        .and_then(|items| items.get(index))
        .and_then(continuation_command_token)
}

fn comment_summary(payload: &Value) -> Option<Value> {
    let properties = payload.get("properties")?;
    let id = properties.get("commentId").and_then(Value::as_str)?;
    let author = payload.get("author").unwrap_or(&Value::Null);
    let toolbar = payload.get("toolbar").unwrap_or(&Value::Null);

    Some(json!({
        "id": id,
        "content": properties.get("content").and_then(text),
        "published": properties.get("publishedTime"),
        "author": {
            "name": author.get("displayName"),
            "channel_id": author.get("channelId"),
            "thumbnail": author.get("avatarThumbnailUrl"),
        },
        "like_count": toolbar.get("likeCountNotliked"),
        "reply_count": toolbar.get("replyCount"),
    }))
}

/// Comments from `frameworkUpdates` entity mutations plus the next-page token.
///
/// Reply threads carry their own continuation renderers ahead of the page's,
/// so the page token is the last one in the tree.
pub fn comment_page(page: &Value) -> CommentPage {
    CommentPage {
        comments: find_all(page, "commentEntityPayload")
            .into_iter()
            .filter_map(comment_summary)
            .collect(),
        continuation: continuation_tokens(page).pop(),
    }
}
