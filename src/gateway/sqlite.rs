// SQLite implementation of the gateway. All SQL lives here; every call runs
// on tokio's blocking pool with its own pooled connection.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::db::models::{
    AuthorSummary, Comment, CommentTarget, Community, ConnectionRequest, ConnectionStatus, Event,
    ParseEnumError, Post, Profile, Role, RsvpStatus,
};
use crate::db::{self, parse_timestamp};
use crate::domain::{initials, NewPost};
use crate::gateway::{
    Gateway, GatewayError, GatewayResult, LikeState, MembershipState, ProfileUpdate, RsvpState,
};
use crate::state::DbPool;

const COMMUNITY_SEARCH_LIMIT: i64 = 20;
const PEOPLE_SEARCH_LIMIT: i64 = 50;

const PROFILE_COLUMNS: &str = "pr.id, pr.name, pr.email, pr.bio, pr.age, pr.location, pr.skills,
    pr.interests, pr.role, pr.experience, pr.availability, pr.rating, pr.review_count,
    pr.preferred_meeting_style, pr.created_at, pr.updated_at";

const COMMUNITY_COLUMNS: &str = "c.id, c.name, c.description, c.categories, c.featured,
    (SELECT COUNT(*) FROM community_members m WHERE m.community_id = c.id),
    (SELECT COUNT(*) FROM posts p WHERE p.community_id = c.id),
    c.created_at, c.updated_at";

const POST_SELECT: &str = "SELECT p.id, p.community_id, p.author_id, a.name, a.age, a.role,
    p.title, p.content, p.tags,
    (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id),
    (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id),
    p.created_at, p.updated_at
    FROM posts p LEFT JOIN profiles a ON a.id = p.author_id";

// ?1 is the viewer id (or NULL)
const EVENT_SELECT: &str = "SELECT e.id, e.title, e.description, e.organizer_id, o.name, o.age,
    o.role, e.event_type, e.location, e.latitude, e.longitude, e.start_time, e.end_time,
    e.max_attendees,
    (SELECT COUNT(*) FROM event_attendees ea
        WHERE ea.event_id = e.id AND ea.rsvp_status = 'attending'),
    e.is_online, e.meeting_link, e.tags, e.community_id,
    (SELECT ea.rsvp_status FROM event_attendees ea WHERE ea.event_id = e.id AND ea.user_id = ?1),
    e.created_at, e.updated_at
    FROM events e LEFT JOIN profiles o ON o.id = e.organizer_id";

const COMMENT_SELECT: &str = "SELECT cm.id, cm.post_id, cm.event_id, cm.author_id, a.name, a.age,
    a.role, cm.content,
    (SELECT COUNT(*) FROM comment_likes cl WHERE cl.comment_id = cm.id),
    cm.created_at
    FROM comments cm LEFT JOIN profiles a ON a.id = cm.author_id";

const REQUEST_SELECT: &str = "SELECT r.id, r.from_id, f.name, f.age, f.role, r.to_id,
    r.message, r.status, r.created_at, r.responded_at
    FROM connection_requests r LEFT JOIN profiles f ON f.id = r.from_id";

#[derive(Clone)]
pub struct SqliteGateway {
    pool: DbPool,
}

impl SqliteGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run blocking storage work off the async executor
    async fn with_conn<T, F>(&self, f: F) -> GatewayResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> GatewayResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }
}

// Row helpers

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_optional_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn get_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn get_optional_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

/// name, age, role in three consecutive columns
fn author_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<AuthorSummary> {
    Ok(AuthorSummary {
        name: row.get(start)?,
        age: row.get(start + 1)?,
        role: get_optional_enum(row, start + 2)?,
    })
}

fn to_json(list: &[String]) -> GatewayResult<String> {
    Ok(serde_json::to_string(list)?)
}

/// Lowercased `%needle%` pattern for `LIKE ... ESCAPE '!'`
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.trim().to_lowercase().chars() {
        if matches!(ch, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let name: Option<String> = row.get(1)?;
    Ok(Profile {
        id: row.get(0)?,
        initials: initials(name.as_deref()),
        name,
        email: row.get(2)?,
        bio: row.get(3)?,
        age: row.get(4)?,
        location: row.get(5)?,
        skills: get_list(row, 6)?,
        interests: get_list(row, 7)?,
        role: get_enum(row, 8)?,
        experience: row.get(9)?,
        availability: row.get(10)?,
        rating: row.get(11)?,
        review_count: row.get(12)?,
        preferred_meeting_style: get_list(row, 13)?,
        created_at: get_datetime(row, 14)?,
        updated_at: get_datetime(row, 15)?,
    })
}

fn community_from_row(row: &Row<'_>) -> rusqlite::Result<Community> {
    Ok(Community {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        categories: get_list(row, 3)?,
        featured: row.get(4)?,
        member_count: row.get(5)?,
        post_count: row.get(6)?,
        created_at: get_datetime(row, 7)?,
        updated_at: get_datetime(row, 8)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        community_id: row.get(1)?,
        author_id: row.get(2)?,
        author: author_from_row(row, 3)?,
        title: row.get(6)?,
        content: row.get(7)?,
        tags: get_list(row, 8)?,
        likes: row.get(9)?,
        replies: row.get(10)?,
        created_at: get_datetime(row, 11)?,
        updated_at: get_datetime(row, 12)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        organizer_id: row.get(3)?,
        organizer: author_from_row(row, 4)?,
        event_type: get_enum(row, 7)?,
        location: row.get(8)?,
        latitude: row.get(9)?,
        longitude: row.get(10)?,
        start_time: get_datetime(row, 11)?,
        end_time: get_datetime(row, 12)?,
        max_attendees: row.get(13)?,
        attendee_count: row.get(14)?,
        is_online: row.get(15)?,
        meeting_link: row.get(16)?,
        tags: get_list(row, 17)?,
        community_id: row.get(18)?,
        viewer_rsvp: get_optional_enum(row, 19)?,
        created_at: get_datetime(row, 20)?,
        updated_at: get_datetime(row, 21)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        event_id: row.get(2)?,
        author_id: row.get(3)?,
        author: author_from_row(row, 4)?,
        content: row.get(7)?,
        likes: row.get(8)?,
        created_at: get_datetime(row, 9)?,
    })
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<ConnectionRequest> {
    Ok(ConnectionRequest {
        id: row.get(0)?,
        from_id: row.get(1)?,
        from: author_from_row(row, 2)?,
        to_id: row.get(5)?,
        message: row.get(6)?,
        status: get_enum(row, 7)?,
        created_at: get_datetime(row, 8)?,
        responded_at: get_optional_datetime(row, 9)?,
    })
}

// Queries. Plain functions over a connection so they compose inside
// transactions.

fn exists(conn: &Connection, table: &str, id: &str) -> GatewayResult<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)");
    Ok(conn.query_row(&sql, params![id], |row| row.get(0))?)
}

fn require(conn: &Connection, table: &str, what: &str, id: &str) -> GatewayResult<()> {
    if exists(conn, table, id)? {
        Ok(())
    } else {
        Err(GatewayError::NotFound(format!("{what} {id}")))
    }
}

fn query_community(conn: &Connection, id: &str) -> GatewayResult<Option<Community>> {
    let sql = format!("SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.id = ?1");
    Ok(conn
        .query_row(&sql, params![id], community_from_row)
        .optional()?)
}

fn query_profile(conn: &Connection, id: &str) -> GatewayResult<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles pr WHERE pr.id = ?1");
    Ok(conn
        .query_row(&sql, params![id], profile_from_row)
        .optional()?)
}

fn query_post(conn: &Connection, id: &str) -> GatewayResult<Option<Post>> {
    let sql = format!("{POST_SELECT} WHERE p.id = ?1");
    Ok(conn.query_row(&sql, params![id], post_from_row).optional()?)
}

fn query_event(conn: &Connection, id: &str, viewer: Option<&str>) -> GatewayResult<Option<Event>> {
    let sql = format!("{EVENT_SELECT} WHERE e.id = ?2");
    Ok(conn
        .query_row(&sql, params![viewer, id], event_from_row)
        .optional()?)
}

fn query_comment(conn: &Connection, id: &str) -> GatewayResult<Option<Comment>> {
    let sql = format!("{COMMENT_SELECT} WHERE cm.id = ?1");
    Ok(conn
        .query_row(&sql, params![id], comment_from_row)
        .optional()?)
}

fn query_request(conn: &Connection, id: &str) -> GatewayResult<Option<ConnectionRequest>> {
    let sql = format!("{REQUEST_SELECT} WHERE r.id = ?1");
    Ok(conn
        .query_row(&sql, params![id], request_from_row)
        .optional()?)
}

fn membership_state(
    conn: &Connection,
    community_id: &str,
    user_id: &str,
) -> GatewayResult<MembershipState> {
    let (is_member, member_count): (bool, i64) = conn.query_row(
        "SELECT
            EXISTS(SELECT 1 FROM community_members WHERE community_id = ?1 AND user_id = ?2),
            (SELECT COUNT(*) FROM community_members WHERE community_id = ?1)",
        params![community_id, user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(MembershipState {
        community_id: community_id.to_string(),
        is_member,
        member_count,
    })
}

fn attendee_count(conn: &Connection, event_id: &str) -> GatewayResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM event_attendees WHERE event_id = ?1 AND rsvp_status = 'attending'",
        params![event_id],
        |row| row.get(0),
    )?)
}

/// Flip a (target, user) row in a like table and report the result
fn toggle_like(
    conn: &mut Connection,
    table: &str,
    column: &str,
    target_id: &str,
    user_id: &str,
) -> GatewayResult<LikeState> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let removed = tx.execute(
        &format!("DELETE FROM {table} WHERE {column} = ?1 AND user_id = ?2"),
        params![target_id, user_id],
    )?;
    if removed == 0 {
        tx.execute(
            &format!("INSERT INTO {table} ({column}, user_id, created_at) VALUES (?1, ?2, ?3)"),
            params![target_id, user_id, db::now()],
        )?;
    }
    let likes: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
        params![target_id],
        |row| row.get(0),
    )?;
    tx.commit()?;

    Ok(LikeState {
        target_id: target_id.to_string(),
        liked: removed == 0,
        likes,
    })
}

#[async_trait]
impl Gateway for SqliteGateway {
    async fn list_communities(&self) -> GatewayResult<Vec<Community>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMUNITY_COLUMNS} FROM communities c ORDER BY c.featured DESC, c.name"
            );
            let mut stmt = conn.prepare(&sql)?;
            let communities = stmt
                .query_map([], community_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(communities)
        })
        .await
    }

    async fn get_community(&self, id: &str) -> GatewayResult<Option<Community>> {
        let id = id.to_string();
        self.with_conn(move |conn| query_community(conn, &id)).await
    }

    async fn search_communities(&self, query: &str) -> GatewayResult<Vec<Community>> {
        let query = query.trim().to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {COMMUNITY_COLUMNS} FROM communities c
                 WHERE ?1 = ''
                    OR unicode_lower(c.name) LIKE ?2 ESCAPE '!'
                    OR unicode_lower(c.description) LIKE ?2 ESCAPE '!'
                    OR EXISTS (SELECT 1 FROM json_each(c.categories) j
                               WHERE unicode_lower(j.value) LIKE ?2 ESCAPE '!')
                 ORDER BY c.featured DESC, c.name
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let communities = stmt
                .query_map(
                    params![query, like_pattern(&query), COMMUNITY_SEARCH_LIMIT],
                    community_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(communities)
        })
        .await
    }

    async fn list_posts(&self, community_id: &str) -> GatewayResult<Vec<Post>> {
        let community_id = community_id.to_string();
        self.with_conn(move |conn| {
            let sql =
                format!("{POST_SELECT} WHERE p.community_id = ?1 ORDER BY p.created_at DESC, p.id DESC");
            let mut stmt = conn.prepare(&sql)?;
            let posts = stmt
                .query_map(params![community_id], post_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(posts)
        })
        .await
    }

    async fn get_post(&self, id: &str) -> GatewayResult<Option<Post>> {
        let id = id.to_string();
        self.with_conn(move |conn| query_post(conn, &id)).await
    }

    async fn create_post(&self, post: NewPost) -> GatewayResult<Post> {
        self.with_conn(move |conn| {
            require(conn, "communities", "community", &post.community_id)?;
            require(conn, "profiles", "profile", &post.author_id)?;

            let id = db::new_id();
            let now = db::now();
            conn.execute(
                "INSERT INTO posts (id, community_id, author_id, title, content, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id,
                    post.community_id,
                    post.author_id,
                    post.title,
                    post.content,
                    to_json(&post.tags)?,
                    now,
                ],
            )?;

            query_post(conn, &id)?.ok_or_else(|| GatewayError::NotFound(format!("post {id}")))
        })
        .await
    }

    async fn toggle_post_like(&self, post_id: &str, user_id: &str) -> GatewayResult<LikeState> {
        let (post_id, user_id) = (post_id.to_string(), user_id.to_string());
        self.with_conn(move |conn| {
            require(conn, "posts", "post", &post_id)?;
            toggle_like(conn, "post_likes", "post_id", &post_id, &user_id)
        })
        .await
    }

    async fn list_members(&self, community_id: &str) -> GatewayResult<Vec<Profile>> {
        let community_id = community_id.to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {PROFILE_COLUMNS} FROM community_members m
                 JOIN profiles pr ON pr.id = m.user_id
                 WHERE m.community_id = ?1
                 ORDER BY m.joined_at, m.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let members = stmt
                .query_map(params![community_id], profile_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(members)
        })
        .await
    }

    async fn join_community(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> GatewayResult<MembershipState> {
        let (community_id, user_id) = (community_id.to_string(), user_id.to_string());
        self.with_conn(move |conn| {
            require(conn, "communities", "community", &community_id)?;
            require(conn, "profiles", "profile", &user_id)?;

            let inserted = conn.execute(
                "INSERT INTO community_members (id, community_id, user_id, joined_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(community_id, user_id) DO NOTHING",
                params![db::new_id(), community_id, user_id, db::now()],
            )?;
            if inserted == 0 {
                tracing::debug!("{} is already a member of {}", user_id, community_id);
            }

            membership_state(conn, &community_id, &user_id)
        })
        .await
    }

    async fn leave_community(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> GatewayResult<MembershipState> {
        let (community_id, user_id) = (community_id.to_string(), user_id.to_string());
        self.with_conn(move |conn| {
            require(conn, "communities", "community", &community_id)?;
            conn.execute(
                "DELETE FROM community_members WHERE community_id = ?1 AND user_id = ?2",
                params![community_id, user_id],
            )?;
            membership_state(conn, &community_id, &user_id)
        })
        .await
    }

    async fn is_member(&self, community_id: &str, user_id: &str) -> GatewayResult<bool> {
        let (community_id, user_id) = (community_id.to_string(), user_id.to_string());
        self.with_conn(move |conn| {
            Ok(membership_state(conn, &community_id, &user_id)?.is_member)
        })
        .await
    }

    async fn get_profile(&self, id: &str) -> GatewayResult<Option<Profile>> {
        let id = id.to_string();
        self.with_conn(move |conn| query_profile(conn, &id)).await
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> GatewayResult<Profile> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            require(conn, "profiles", "profile", &id)?;

            let skills = update.skills.as_deref().map(to_json).transpose()?;
            let interests = update.interests.as_deref().map(to_json).transpose()?;
            conn.execute(
                "UPDATE profiles SET
                    name = COALESCE(?2, name),
                    bio = COALESCE(?3, bio),
                    age = COALESCE(?4, age),
                    location = COALESCE(?5, location),
                    skills = COALESCE(?6, skills),
                    interests = COALESCE(?7, interests),
                    role = COALESCE(?8, role),
                    experience = COALESCE(?9, experience),
                    availability = COALESCE(?10, availability),
                    updated_at = ?11
                 WHERE id = ?1",
                params![
                    id,
                    update.name,
                    update.bio,
                    update.age,
                    update.location,
                    skills,
                    interests,
                    update.role.map(|r| r.as_str()),
                    update.experience,
                    update.availability,
                    db::now(),
                ],
            )?;

            query_profile(conn, &id)?.ok_or_else(|| GatewayError::NotFound(format!("profile {id}")))
        })
        .await
    }

    async fn search_people(&self, query: &str, role: Option<Role>) -> GatewayResult<Vec<Profile>> {
        let query = query.trim().to_string();
        // "both" means no role restriction
        let role = role.filter(|r| *r != Role::Both).map(|r| r.as_str());
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles pr
                 WHERE (?1 = ''
                        OR unicode_lower(coalesce(pr.name, '')) LIKE ?2 ESCAPE '!'
                        OR unicode_lower(coalesce(pr.bio, '')) LIKE ?2 ESCAPE '!'
                        OR EXISTS (SELECT 1 FROM json_each(pr.skills) j
                                   WHERE unicode_lower(j.value) LIKE ?2 ESCAPE '!'))
                   AND (?3 IS NULL OR pr.role = ?3 OR pr.role = 'both')
                 ORDER BY pr.created_at DESC, pr.id DESC
                 LIMIT ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let people = stmt
                .query_map(
                    params![query, like_pattern(&query), role, PEOPLE_SEARCH_LIMIT],
                    profile_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(people)
        })
        .await
    }

    async fn list_events(&self, viewer: Option<&str>) -> GatewayResult<Vec<Event>> {
        let viewer = viewer.map(str::to_string);
        self.with_conn(move |conn| {
            let sql = format!("{EVENT_SELECT} ORDER BY e.start_time, e.id");
            let mut stmt = conn.prepare(&sql)?;
            let events = stmt
                .query_map(params![viewer], event_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(events)
        })
        .await
    }

    async fn get_event(&self, id: &str, viewer: Option<&str>) -> GatewayResult<Option<Event>> {
        let id = id.to_string();
        let viewer = viewer.map(str::to_string);
        self.with_conn(move |conn| query_event(conn, &id, viewer.as_deref()))
            .await
    }

    async fn rsvp(
        &self,
        event_id: &str,
        user_id: &str,
        status: RsvpStatus,
    ) -> GatewayResult<RsvpState> {
        let (event_id, user_id) = (event_id.to_string(), user_id.to_string());
        self.with_conn(move |conn| {
            require(conn, "profiles", "profile", &user_id)?;

            // Capacity check and write must see the same attendee count
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let max_attendees: Option<i64> = tx
                .query_row(
                    "SELECT max_attendees FROM events WHERE id = ?1",
                    params![event_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| GatewayError::NotFound(format!("event {event_id}")))?;

            let current: Option<String> = tx
                .query_row(
                    "SELECT rsvp_status FROM event_attendees WHERE event_id = ?1 AND user_id = ?2",
                    params![event_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            let already_attending = current.as_deref() == Some(RsvpStatus::Attending.as_str());

            if status == RsvpStatus::Attending && !already_attending {
                if let Some(max) = max_attendees {
                    if attendee_count(&tx, &event_id)? >= max {
                        return Err(GatewayError::Conflict(format!("event {event_id} is full")));
                    }
                }
            }

            tx.execute(
                "INSERT INTO event_attendees (id, event_id, user_id, rsvp_status, joined_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(event_id, user_id) DO UPDATE SET rsvp_status = excluded.rsvp_status",
                params![db::new_id(), event_id, user_id, status.as_str(), db::now()],
            )?;
            let attendee_count = attendee_count(&tx, &event_id)?;
            tx.commit()?;

            Ok(RsvpState {
                event_id,
                status,
                attendee_count,
            })
        })
        .await
    }

    async fn list_comments(&self, target: &CommentTarget) -> GatewayResult<Vec<Comment>> {
        let target = target.clone();
        self.with_conn(move |conn| {
            let column = match target {
                CommentTarget::Post(_) => "cm.post_id",
                CommentTarget::Event(_) => "cm.event_id",
            };
            let sql = format!("{COMMENT_SELECT} WHERE {column} = ?1 ORDER BY cm.created_at, cm.id");
            let mut stmt = conn.prepare(&sql)?;
            let comments = stmt
                .query_map(params![target.id()], comment_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(comments)
        })
        .await
    }

    async fn add_comment(
        &self,
        target: &CommentTarget,
        author_id: &str,
        content: &str,
    ) -> GatewayResult<Comment> {
        let target = target.clone();
        let (author_id, content) = (author_id.to_string(), content.to_string());
        self.with_conn(move |conn| {
            let (post_id, event_id) = match &target {
                CommentTarget::Post(id) => {
                    require(conn, "posts", "post", id)?;
                    (Some(id.as_str()), None)
                }
                CommentTarget::Event(id) => {
                    require(conn, "events", "event", id)?;
                    (None, Some(id.as_str()))
                }
            };
            require(conn, "profiles", "profile", &author_id)?;

            let id = db::new_id();
            conn.execute(
                "INSERT INTO comments (id, post_id, event_id, author_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, post_id, event_id, author_id, content, db::now()],
            )?;

            query_comment(conn, &id)?.ok_or_else(|| GatewayError::NotFound(format!("comment {id}")))
        })
        .await
    }

    async fn get_comment(&self, id: &str) -> GatewayResult<Option<Comment>> {
        let id = id.to_string();
        self.with_conn(move |conn| query_comment(conn, &id)).await
    }

    async fn toggle_comment_like(
        &self,
        comment_id: &str,
        user_id: &str,
    ) -> GatewayResult<LikeState> {
        let (comment_id, user_id) = (comment_id.to_string(), user_id.to_string());
        self.with_conn(move |conn| {
            require(conn, "comments", "comment", &comment_id)?;
            toggle_like(conn, "comment_likes", "comment_id", &comment_id, &user_id)
        })
        .await
    }

    async fn send_connection_request(
        &self,
        from_id: &str,
        to_id: &str,
        message: &str,
    ) -> GatewayResult<ConnectionRequest> {
        if from_id == to_id {
            return Err(GatewayError::Conflict("cannot connect to yourself".into()));
        }
        let (from_id, to_id, message) = (from_id.to_string(), to_id.to_string(), message.to_string());
        self.with_conn(move |conn| {
            require(conn, "profiles", "profile", &from_id)?;
            require(conn, "profiles", "profile", &to_id)?;

            // A declined request may be asked again; anything else is kept
            conn.execute(
                "INSERT INTO connection_requests (id, from_id, to_id, message, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5)
                 ON CONFLICT(from_id, to_id) DO UPDATE SET
                    message = excluded.message,
                    status = 'pending',
                    created_at = excluded.created_at,
                    responded_at = NULL
                 WHERE connection_requests.status = 'declined'",
                params![db::new_id(), from_id, to_id, message, db::now()],
            )?;

            let sql = format!("{REQUEST_SELECT} WHERE r.from_id = ?1 AND r.to_id = ?2");
            Ok(conn.query_row(&sql, params![from_id, to_id], request_from_row)?)
        })
        .await
    }

    async fn connection_exists(&self, a: &str, b: &str) -> GatewayResult<bool> {
        let (a, b) = (a.to_string(), b.to_string());
        self.with_conn(move |conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM connection_requests
                    WHERE ((from_id = ?1 AND to_id = ?2) OR (from_id = ?2 AND to_id = ?1))
                      AND status <> 'declined')",
                params![a, b],
                |row| row.get(0),
            )?)
        })
        .await
    }

    async fn incoming_requests(&self, user_id: &str) -> GatewayResult<Vec<ConnectionRequest>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "{REQUEST_SELECT} WHERE r.to_id = ?1 AND r.status = 'pending'
                 ORDER BY r.created_at DESC, r.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let requests = stmt
                .query_map(params![user_id], request_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(requests)
        })
        .await
    }

    async fn respond_to_connection(
        &self,
        request_id: &str,
        responder_id: &str,
        accept: bool,
    ) -> GatewayResult<ConnectionRequest> {
        let (request_id, responder_id) = (request_id.to_string(), responder_id.to_string());
        let status = if accept {
            ConnectionStatus::Accepted
        } else {
            ConnectionStatus::Declined
        };
        self.with_conn(move |conn| {
            let request = query_request(conn, &request_id)?
                .filter(|r| r.to_id == responder_id)
                .ok_or_else(|| GatewayError::NotFound(format!("connection request {request_id}")))?;
            if request.status != ConnectionStatus::Pending {
                return Err(GatewayError::Conflict(format!(
                    "connection request {request_id} was already {}",
                    request.status
                )));
            }

            conn.execute(
                "UPDATE connection_requests SET status = ?2, responded_at = ?3 WHERE id = ?1",
                params![request_id, status.as_str(), db::now()],
            )?;

            query_request(conn, &request_id)?
                .ok_or_else(|| GatewayError::NotFound(format!("connection request {request_id}")))
        })
        .await
    }
}
