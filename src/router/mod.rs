//! Request routing
//!
//! Maps a parsed request to an action: CRUD operations against the resource
//! store under `/users`, or static-asset resolution for everything else.
//! Every failure is converted to a well-formed response at this boundary;
//! nothing propagates to the connection layer.

pub mod static_files;
pub mod users;

use std::path::PathBuf;

use crate::config::Config;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::store::{JsonFileStore, UserStore};

/// Failures a handler can produce, each mapping to one status code.
#[derive(Debug)]
pub enum HandlerError {
    /// Request body is not a JSON object (400)
    InvalidPayload,
    /// Path segment where an id was expected is not an integer (400)
    InvalidIdentifier,
    /// Unknown route, unknown resource id, or missing static file (404)
    NotFound(String),
    /// Store or filesystem fault, or any other unexpected error (500)
    Internal(anyhow::Error),
}

impl HandlerError {
    pub fn into_response(self) -> Response {
        match self {
            HandlerError::InvalidPayload => Response::bad_request("Invalid JSON format"),
            HandlerError::InvalidIdentifier => Response::bad_request("Invalid user ID"),
            HandlerError::NotFound(message) => Response::not_found(message),
            HandlerError::Internal(e) => Response::internal_error(format!("Server error: {e}")),
        }
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(e: anyhow::Error) -> Self {
        HandlerError::Internal(e)
    }
}

/// Dispatches requests to the store or the static file tree.
pub struct Router {
    store: UserStore,
    static_root: PathBuf,
    index: String,
}

impl Router {
    pub fn new(cfg: &Config) -> Self {
        Self {
            store: UserStore::new(JsonFileStore::new(&cfg.store.path)),
            static_root: cfg.static_files.root.clone(),
            index: cfg.static_files.index.clone(),
        }
    }

    /// Handles one request. Infallible: error paths come back as 400/404/500
    /// responses.
    pub async fn handle(&self, req: &Request) -> Response {
        match self.dispatch(req).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn dispatch(&self, req: &Request) -> Result<Response, HandlerError> {
        match req.method {
            Method::GET => self.get(&req.path).await,
            Method::HEAD => {
                // GET logic with the body stripped; status and headers kept
                let mut response = match self.get(&req.path).await {
                    Ok(response) => response,
                    Err(e) => e.into_response(),
                };
                response.body.clear();
                Ok(response)
            }
            Method::POST => match req.path.as_str() {
                "/users" => users::create(&self.store, &req.body).await,
                path => Err(endpoint_not_found(path)),
            },
            Method::PUT => {
                let id = self.user_id(&req.path)?;
                users::replace(&self.store, id, &req.body).await
            }
            Method::PATCH => {
                let id = self.user_id(&req.path)?;
                users::patch(&self.store, id, &req.body).await
            }
            Method::DELETE => {
                let id = self.user_id(&req.path)?;
                users::remove(&self.store, id).await
            }
        }
    }

    async fn get(&self, path: &str) -> Result<Response, HandlerError> {
        if path == "/users" {
            return users::list(&self.store).await;
        }
        static_files::serve(&self.static_root, &self.index, path).await
    }

    fn user_id(&self, path: &str) -> Result<u64, HandlerError> {
        match path.strip_prefix("/users/") {
            Some(rest) => {
                // Any integer is a well-formed id; negative ones are never
                // issued, so they take the unknown-id path
                let id: i64 = rest.parse().map_err(|_| HandlerError::InvalidIdentifier)?;
                u64::try_from(id)
                    .map_err(|_| HandlerError::NotFound(format!("User not found: {id}")))
            }
            None => Err(endpoint_not_found(path)),
        }
    }
}

fn endpoint_not_found(path: &str) -> HandlerError {
    HandlerError::NotFound(format!("Endpoint not found: {path}"))
}
