use async_graphql::*;

use crate::db::models::{CommentTarget, Role};
use crate::gateway::{ProfileUpdate, SharedGateway};

/// The profile a request acts for, if any. Attached as context data next to
/// the gateway.
#[derive(Clone, Debug, Default)]
pub struct Viewer(pub Option<String>);

pub(crate) fn gateway<'a>(ctx: &Context<'a>) -> Result<&'a SharedGateway> {
    ctx.data::<SharedGateway>()
}

pub(crate) fn viewer_id<'a>(ctx: &Context<'a>) -> Option<&'a str> {
    ctx.data_opt::<Viewer>().and_then(|v| v.0.as_deref())
}

/// Viewer id, or the "Unauthorized" error every mutation reports
pub(crate) fn require_viewer<'a>(ctx: &Context<'a>) -> Result<&'a str> {
    viewer_id(ctx).ok_or_else(|| Error::new("Unauthorized"))
}

/// Exactly one of `post_id` and `event_id`
pub(crate) fn comment_target(
    post_id: Option<String>,
    event_id: Option<String>,
) -> Result<CommentTarget> {
    match (post_id, event_id) {
        (Some(id), None) => Ok(CommentTarget::Post(id)),
        (None, Some(id)) => Ok(CommentTarget::Event(id)),
        _ => Err(Error::new("Give exactly one of postId and eventId")),
    }
}

/// Input for creating a post in a community
#[derive(InputObject)]
pub struct CreatePostInput {
    pub community_id: String,
    pub title: String,
    pub content: String,
    pub tags: Option<Vec<String>>,
}

/// Profile fields to change. Omitted fields stay as they are.
#[derive(InputObject, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub role: Option<Role>,
    pub experience: Option<String>,
    pub availability: Option<String>,
}

impl From<UpdateProfileInput> for ProfileUpdate {
    fn from(input: UpdateProfileInput) -> Self {
        ProfileUpdate {
            name: input.name,
            bio: input.bio,
            age: input.age,
            location: input.location,
            skills: input.skills,
            interests: input.interests,
            role: input.role,
            experience: input.experience,
            availability: input.availability,
        }
    }
}
