// Demo data for `knit --seed` and for tests. Event times are placed relative
// to the moment of seeding so every status shows up on the map.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Transaction};

use crate::db::{new_id, timestamp};
use crate::state::DbPool;

pub const ALEX: &str = "profile-alex";
pub const SAM: &str = "profile-sam";
pub const JORDAN: &str = "profile-jordan";
pub const RIVER: &str = "profile-river";
pub const MORGAN: &str = "profile-morgan";

pub const PYTHON_COMMUNITY: &str = "community-python";
pub const GARDENING_COMMUNITY: &str = "community-gardening";
pub const CAREER_COMMUNITY: &str = "community-career";
pub const QUIET_COMMUNITY: &str = "community-quiet";

pub const WELCOME_POST: &str = "post-welcome";

pub const LIVE_EVENT: &str = "event-live";
pub const SOON_EVENT: &str = "event-soon";
pub const UPCOMING_EVENT: &str = "event-upcoming";
pub const ENDED_EVENT: &str = "event-ended";
pub const FULL_EVENT: &str = "event-full";

struct SeedProfile {
    id: &'static str,
    name: &'static str,
    bio: &'static str,
    age: i32,
    location: &'static str,
    skills: &'static [&'static str],
    interests: &'static [&'static str],
    role: &'static str,
    rating: f64,
}

const PROFILES: &[SeedProfile] = &[
    SeedProfile {
        id: ALEX,
        name: "Alex Rivera",
        bio: "Retired software engineer who still loves teaching Python.",
        age: 68,
        location: "San Francisco, CA",
        skills: &["Python", "Teaching", "Career Advice"],
        interests: &["Technology", "Education"],
        role: "mentor",
        rating: 4.9,
    },
    SeedProfile {
        id: SAM,
        name: "Sam Chen",
        bio: "College student learning to code and grow vegetables.",
        age: 20,
        location: "Oakland, CA",
        skills: &["JavaScript"],
        interests: &["Technology", "Gardening"],
        role: "mentee",
        rating: 4.5,
    },
    SeedProfile {
        id: JORDAN,
        name: "Jordan Lee",
        bio: "Urban gardener happy to share what grows in foggy weather.",
        age: 54,
        location: "Berkeley, CA",
        skills: &["Gardening", "Composting"],
        interests: &["Gardening", "Cooking"],
        role: "both",
        rating: 4.7,
    },
    SeedProfile {
        id: RIVER,
        name: "River",
        bio: "Career changer looking for advice on interviews.",
        age: 31,
        location: "San Jose, CA",
        skills: &["Writing"],
        interests: &["Career", "Technology"],
        role: "mentee",
        rating: 4.2,
    },
    SeedProfile {
        id: MORGAN,
        name: "Morgan Patel",
        bio: "Hiring manager who runs mock interviews on weekends.",
        age: 45,
        location: "Palo Alto, CA",
        skills: &["Interviewing", "Career Advice"],
        interests: &["Career"],
        role: "mentor",
        rating: 4.8,
    },
];

struct SeedCommunity {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    categories: &'static [&'static str],
    featured: bool,
    members: &'static [&'static str],
}

const COMMUNITIES: &[SeedCommunity] = &[
    SeedCommunity {
        id: PYTHON_COMMUNITY,
        name: "Python Learners",
        description: "Beginners and veterans working through Python together.",
        categories: &["Technology", "Education"],
        featured: true,
        members: &[ALEX, SAM, RIVER],
    },
    SeedCommunity {
        id: GARDENING_COMMUNITY,
        name: "Bay Area Gardeners",
        description: "Seed swaps, soil tips and weekend garden visits.",
        categories: &["Gardening", "Outdoors"],
        featured: true,
        members: &[JORDAN, SAM],
    },
    SeedCommunity {
        id: CAREER_COMMUNITY,
        name: "Career Crossroads",
        description: "Resume reviews and interview practice across generations.",
        categories: &["Career"],
        featured: false,
        members: &[MORGAN, RIVER, ALEX],
    },
    SeedCommunity {
        id: QUIET_COMMUNITY,
        name: "Knitting Circle",
        description: "A brand new circle waiting for its first members.",
        categories: &["Crafts"],
        featured: false,
        members: &[],
    },
];

/// Fill an empty database with demo data. Does nothing when communities
/// already exist.
pub fn seed_demo(pool: &DbPool) -> anyhow::Result<bool> {
    seed_demo_at(pool, Utc::now())
}

pub fn seed_demo_at(pool: &DbPool, now: DateTime<Utc>) -> anyhow::Result<bool> {
    let mut conn = pool.get()?;

    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM communities", [], |row| row.get(0))?;
    if existing > 0 {
        tracing::info!("Database already has {} communities, skipping seed", existing);
        return Ok(false);
    }

    let tx = conn.transaction()?;
    seed_profiles(&tx, now)?;
    seed_communities(&tx, now)?;
    seed_posts(&tx, now)?;
    seed_events(&tx, now)?;
    tx.commit()?;

    tracing::info!(
        "Seeded {} profiles and {} communities",
        PROFILES.len(),
        COMMUNITIES.len()
    );
    Ok(true)
}

fn json(list: &[&str]) -> anyhow::Result<String> {
    Ok(serde_json::to_string(list)?)
}

fn seed_profiles(tx: &Transaction<'_>, now: DateTime<Utc>) -> anyhow::Result<()> {
    for (i, p) in PROFILES.iter().enumerate() {
        // Later profiles are newer
        let created = timestamp(now - Duration::days(30 - i as i64));
        tx.execute(
            "INSERT INTO profiles (id, name, email, bio, age, location, skills, interests, role,
                                   experience, availability, rating, review_count,
                                   preferred_meeting_style, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
            params![
                p.id,
                p.name,
                format!("{}@example.com", p.id.trim_start_matches("profile-")),
                p.bio,
                p.age,
                p.location,
                json(p.skills)?,
                json(p.interests)?,
                p.role,
                "Happy to share what I know",
                "Weekends",
                p.rating,
                (i as i32 + 1) * 3,
                json(&["video", "in_person"])?,
                created,
            ],
        )?;
    }
    Ok(())
}

fn seed_communities(tx: &Transaction<'_>, now: DateTime<Utc>) -> anyhow::Result<()> {
    let created = timestamp(now - Duration::days(60));
    for c in COMMUNITIES {
        tx.execute(
            "INSERT INTO communities (id, name, description, categories, featured, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![c.id, c.name, c.description, json(c.categories)?, c.featured, created],
        )?;
        for (i, member) in c.members.iter().enumerate() {
            tx.execute(
                "INSERT INTO community_members (id, community_id, user_id, joined_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    new_id(),
                    c.id,
                    member,
                    timestamp(now - Duration::days(20 - i as i64))
                ],
            )?;
        }
    }
    Ok(())
}

fn seed_posts(tx: &Transaction<'_>, now: DateTime<Utc>) -> anyhow::Result<()> {
    let posts: &[(&str, &str, &str, &str, &str, &[&str], i64)] = &[
        (
            WELCOME_POST,
            PYTHON_COMMUNITY,
            ALEX,
            "Welcome, new Pythonistas!",
            "Introduce yourself and tell us what you want to build this month.",
            &["welcome"],
            72,
        ),
        (
            "post-list-comprehensions",
            PYTHON_COMMUNITY,
            SAM,
            "List comprehensions finally clicked",
            "Sharing the example that made it make sense for me.",
            &["tips", "beginner"],
            5,
        ),
        (
            "post-tomatoes",
            GARDENING_COMMUNITY,
            JORDAN,
            "Tomatoes in the fog belt",
            "Early Girl and Sun Gold both do well west of the hills.",
            &["tomatoes"],
            30,
        ),
    ];

    for (id, community_id, author_id, title, content, tags, hours_ago) in posts {
        let created = timestamp(now - Duration::hours(*hours_ago));
        tx.execute(
            "INSERT INTO posts (id, community_id, author_id, title, content, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![id, community_id, author_id, title, content, json(tags)?, created],
        )?;
    }

    tx.execute(
        "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![WELCOME_POST, SAM, timestamp(now - Duration::hours(70))],
    )?;
    tx.execute(
        "INSERT INTO comments (id, post_id, author_id, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            "comment-welcome-sam",
            WELCOME_POST,
            SAM,
            "Hi! I'm hoping to automate my homework schedule.",
            timestamp(now - Duration::hours(70)),
        ],
    )?;
    Ok(())
}

fn seed_events(tx: &Transaction<'_>, now: DateTime<Utc>) -> anyhow::Result<()> {
    // (id, title, type, organizer, location, lat, lng, start offset min, length min, max, online)
    let events: &[(&str, &str, &str, &str, &str, f64, f64, i64, i64, Option<i64>, bool)] = &[
        (
            LIVE_EVENT,
            "Python Office Hours",
            "mentoring_session",
            ALEX,
            "SF Public Library",
            37.7790,
            -122.4159,
            -30,
            90,
            Some(20),
            false,
        ),
        (
            SOON_EVENT,
            "Seed Swap",
            "meetup",
            JORDAN,
            "Berkeley Community Garden",
            37.8715,
            -122.2730,
            15,
            120,
            None,
            false,
        ),
        (
            UPCOMING_EVENT,
            "Mock Interview Night",
            "workshop",
            MORGAN,
            "Online",
            37.4419,
            -122.1430,
            3 * 24 * 60,
            120,
            Some(12),
            true,
        ),
        (
            ENDED_EVENT,
            "Intro to Composting",
            "workshop",
            JORDAN,
            "Oakland Rose Garden",
            37.8197,
            -122.2417,
            -2 * 24 * 60,
            60,
            None,
            false,
        ),
        (
            FULL_EVENT,
            "Resume Roundtable",
            "discussion",
            MORGAN,
            "Palo Alto Cafe",
            37.4443,
            -122.1598,
            5 * 24 * 60,
            60,
            Some(1),
            false,
        ),
    ];

    let created = timestamp(now - Duration::days(7));
    for (id, title, kind, organizer, location, lat, lng, offset, length, max, online) in events {
        let start = now + Duration::minutes(*offset);
        let end = start + Duration::minutes(*length);
        tx.execute(
            "INSERT INTO events (id, title, description, organizer_id, event_type, location,
                                 latitude, longitude, start_time, end_time, max_attendees,
                                 is_online, meeting_link, tags, community_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, NULL, ?15, ?15)",
            params![
                id,
                title,
                format!("{title} hosted by the Knit community."),
                organizer,
                kind,
                location,
                lat,
                lng,
                timestamp(start),
                timestamp(end),
                max,
                online,
                online.then_some("https://meet.example.com/knit"),
                json(&[*kind])?,
                created,
            ],
        )?;
    }

    // The one-seat event is already taken
    tx.execute(
        "INSERT INTO event_attendees (id, event_id, user_id, rsvp_status, joined_at)
         VALUES (?1, ?2, ?3, 'attending', ?4)",
        params![new_id(), FULL_EVENT, RIVER, created],
    )?;
    tx.execute(
        "INSERT INTO event_attendees (id, event_id, user_id, rsvp_status, joined_at)
         VALUES (?1, ?2, ?3, 'attending', ?4)",
        params![new_id(), LIVE_EVENT, SAM, created],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn seeding_twice_is_a_no_op() {
        let pool = test_pool();
        assert!(seed_demo(&pool).unwrap());
        assert!(!seed_demo(&pool).unwrap());

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM communities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, COMMUNITIES.len() as i64);
    }
}
