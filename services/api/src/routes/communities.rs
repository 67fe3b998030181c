//! Community, membership and chat room handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campus_common::Permission;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::storage_error;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    guard::{self, Caller},
    middleware::AuthUser,
    models::communities::{
        CreateCommunityRequest, DeleteMessageQuery, GeneralExists, MEMBER_ROLE_ORGANIZER,
        MEMBER_ROLE_USER, MembershipsResponse, PostMessageRequest,
    },
};

pub async fn list_communities(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let communities = state
        .community_repository
        .list()
        .await
        .map_err(storage_error("list communities"))?;

    Ok(Json(communities))
}

pub async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let community = state
        .community_repository
        .find_by_id(id)
        .await
        .map_err(storage_error("fetch community"))?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))?;

    Ok(Json(community))
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let members = state
        .community_repository
        .members(id)
        .await
        .map_err(storage_error("list members"))?;

    Ok(Json(members))
}

/// Create a community; the creator becomes its organizer
pub async fn create_community(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateCommunityRequest>,
) -> ApiResult<impl IntoResponse> {
    let (name, description) = payload.validate().map_err(ApiError::BadRequest)?;

    let community = state
        .community_repository
        .create(caller.id, &name, &description)
        .await
        .map_err(storage_error("create community"))?;

    // The community stands even if the creator's membership cannot be recorded
    if let Err(e) = state
        .community_repository
        .add_member(community.id, caller.id, MEMBER_ROLE_ORGANIZER)
        .await
    {
        error!("Failed to add creator to community {}: {}", community.id, e);
    }

    info!(community_id = %community.id, creator_id = %caller.id, "Community created");
    Ok((StatusCode::CREATED, Json(community)))
}

pub async fn memberships(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let memberships = state
        .community_repository
        .memberships(user.id)
        .await
        .map_err(storage_error("list memberships"))?;

    Ok(Json(MembershipsResponse { memberships }))
}

/// Ensure the campus-wide General community exists
///
/// Anyone signed in may check for it; only organizers and admins may create it.
pub async fn init_general(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Response> {
    let existing = state
        .community_repository
        .find_general()
        .await
        .map_err(storage_error("fetch General community"))?;

    if let Some(community) = existing {
        return Ok(Json(GeneralExists::new(community)).into_response());
    }

    let caller = guard::authorize(&state.user_repository, Some(&user), Permission::ManageContent)
        .await
        .map_err(|e| match e {
            ApiError::Forbidden { current_role, .. } => ApiError::forbidden(
                "Only organizers and admins can create the General community",
                current_role,
            ),
            other => other,
        })?;

    let community = state
        .community_repository
        .create_general(caller.id)
        .await
        .map_err(storage_error("create General community"))?;

    if let Err(e) = state
        .community_repository
        .add_member(community.id, caller.id, MEMBER_ROLE_ORGANIZER)
        .await
    {
        error!("Failed to add creator to General community: {}", e);
    }

    info!(community_id = %community.id, "General community created");
    Ok((StatusCode::CREATED, Json(community)).into_response())
}

pub async fn join(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state
        .community_repository
        .find_by_id(id)
        .await
        .map_err(storage_error("fetch community"))?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))?;

    let member = state
        .community_repository
        .add_member(id, caller.id, MEMBER_ROLE_USER)
        .await
        .map_err(storage_error("join community"))?
        .ok_or_else(|| ApiError::BadRequest("Already a member".to_string()))?;

    info!(community_id = %id, user_id = %caller.id, "Joined community");
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn leave(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let removed = state
        .community_repository
        .remove_member(id, user.id)
        .await
        .map_err(storage_error("leave community"))?;

    if !removed {
        return Err(ApiError::NotFound("Not a member".to_string()));
    }

    info!(community_id = %id, user_id = %user.id, "Left community");
    Ok(Json(json!({ "message": "Left community" })))
}

async fn ensure_member(
    state: &AppState,
    community_id: Uuid,
    caller: &Caller,
    denial: &str,
) -> ApiResult<()> {
    let is_member = state
        .community_repository
        .is_member(community_id, caller.id)
        .await
        .map_err(storage_error("check membership"))?;

    if !is_member {
        return Err(ApiError::forbidden(denial, caller.role));
    }
    Ok(())
}

/// Messages of a room, oldest first; members only
pub async fn list_messages(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ensure_member(&state, id, &caller, "You must be a member to view messages").await?;

    let messages = state
        .community_repository
        .messages(id)
        .await
        .map_err(storage_error("list messages"))?;

    Ok(Json(messages))
}

pub async fn post_message(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let text = payload.validate().map_err(ApiError::BadRequest)?;
    ensure_member(&state, id, &caller, "You must be a member to send messages").await?;

    let message = state
        .community_repository
        .post_message(id, caller.id, &text)
        .await
        .map_err(storage_error("post message"))?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Remove a message from a room; admins only
pub async fn delete_message(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteMessageQuery>,
) -> ApiResult<impl IntoResponse> {
    let message_id = query
        .message_id
        .ok_or_else(|| ApiError::BadRequest("Message ID is required".to_string()))?;

    let deleted = state
        .community_repository
        .delete_message(id, message_id)
        .await
        .map_err(storage_error("delete message"))?;

    if !deleted {
        return Err(ApiError::NotFound("Message not found".to_string()));
    }

    info!(community_id = %id, %message_id, admin_id = %caller.id, "Message deleted");
    Ok(Json(json!({ "success": true })))
}
