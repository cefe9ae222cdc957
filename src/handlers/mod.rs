//! Request handlers, grouped by audience. Handlers validate raw input, call the
//! repository and collaborators, and answer with the `ApiResponse` envelope.

use axum::extract::{FromRequest, Multipart};
use std::future::Future;

use crate::{
    error::{AppError, AppResult},
    pagination::{Listing, Page, PageQuery, Window, paginate},
    repository::RepoResult,
};

pub mod admin;
pub mod public;
pub mod readers;
pub mod session;
pub mod writers;

/// JsonBody
///
/// `axum::Json` whose rejection is reported through the `AppError` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// listing
///
/// Runs one scope-filtered listing through the pagination engine. `empty_msg` is
/// the 404 message for a filter that matches nothing at all.
pub(crate) async fn listing<T, F, Fut>(query: &PageQuery, empty_msg: &str, fetch: F) -> AppResult<Page<T>>
where
    F: FnOnce(Window) -> Fut,
    Fut: Future<Output = RepoResult<Listing<T>>>,
{
    let request = query.request()?;
    paginate(request, fetch).await?.or_not_found(empty_msg)
}

/// Pulls the `image` part out of a multipart body.
pub(crate) async fn read_image(mut multipart: Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            if bytes.is_empty() {
                break;
            }
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::validation("Image file is missing!"))
}
