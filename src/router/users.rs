//! CRUD operations for the `/users` resource collection.

use serde_json::{Value, json};

use crate::http::response::{Response, StatusCode};
use crate::router::HandlerError;
use crate::store::{Resource, UserStore};

/// GET /users: all resources in store iteration order.
pub async fn list(store: &UserStore) -> Result<Response, HandlerError> {
    let users = store.list().await?;
    Ok(Response::json(StatusCode::Ok, &json!({ "users": users })))
}

/// POST /users: create a resource with the next auto-increment id.
pub async fn create(store: &UserStore, body: &str) -> Result<Response, HandlerError> {
    let resource = parse_object(body)?;
    let user = store.insert(resource).await?;
    Ok(Response::json(
        StatusCode::Created,
        &json!({ "message": "User created", "user": user }),
    ))
}

/// PUT /users/{id}: replace the whole resource; the server re-stamps `id`.
pub async fn replace(store: &UserStore, id: u64, body: &str) -> Result<Response, HandlerError> {
    let resource = parse_object(body)?;
    match store.replace(id, resource).await? {
        Some(user) => Ok(Response::json(
            StatusCode::Ok,
            &json!({ "message": "User updated", "user": user }),
        )),
        None => Err(user_not_found(id)),
    }
}

/// PATCH /users/{id}: merge fields into the resource; `id` is protected.
pub async fn patch(store: &UserStore, id: u64, body: &str) -> Result<Response, HandlerError> {
    let fields = parse_object(body)?;
    match store.merge(id, fields).await? {
        Some(user) => Ok(Response::json(
            StatusCode::Ok,
            &json!({ "message": "User patched", "user": user }),
        )),
        None => Err(user_not_found(id)),
    }
}

/// DELETE /users/{id}: remove the resource, echoing the deleted value.
pub async fn remove(store: &UserStore, id: u64) -> Result<Response, HandlerError> {
    match store.remove(id).await? {
        Some(user) => Ok(Response::json(
            StatusCode::Ok,
            &json!({ "message": "User deleted", "user": user }),
        )),
        None => Err(user_not_found(id)),
    }
}

/// The request body must be a single JSON object; anything else (other JSON
/// types included) is an invalid payload.
fn parse_object(body: &str) -> Result<Resource, HandlerError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(HandlerError::InvalidPayload),
    }
}

fn user_not_found(id: u64) -> HandlerError {
    HandlerError::NotFound(format!("User not found: {id}"))
}
