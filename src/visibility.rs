//! Who may see which article.
//!
//! Listing and viewing are separate decisions: an article must be listable before
//! its subscriber gate is even considered. The store-side form of `can_list` is
//! `ArticleFilter::public`, and both must agree.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Article, ArticleDetail},
};

pub const SUBSCRIBERS_ONLY: &str = "This article is only for subscribers!";

/// An article appears in public listings only while shown and while its writer is not banned.
pub fn can_list(article: &Article, writer_banned: bool) -> bool {
    article.is_shown && !writer_banned
}

/// Subscriber-only articles require an active subscription; everything else is open.
pub fn can_view(article: &Article, subscription_active: bool) -> bool {
    !article.for_subscribers || subscription_active
}

pub fn article_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Article with ID: {id} not found!"))
}

/// check_reader_access
///
/// Gate for reading an article or commenting on it. A hidden article (or one
/// owned by a banned or deleted writer) is reported as missing.
pub fn check_reader_access(detail: &ArticleDetail, subscription_active: bool) -> AppResult<()> {
    if !can_list(&detail.article, detail.writer_banned()) {
        return Err(article_not_found(detail.article.id));
    }
    if !can_view(&detail.article, subscription_active) {
        return Err(AppError::rule(SUBSCRIBERS_ONLY));
    }
    Ok(())
}
