/// Router Module Index
///
/// Routes are split by audience. Each audience module mounts its open endpoints
/// (registration, login, logout, current account) next to a guarded group wrapped
/// in the matching `guard::require_*` middleware, so a protected handler is never
/// reachable without the right session.

/// Feeds, sections and comments. No session needed.
pub mod public;

/// `/users`: reader accounts, article detail, comments, notifications, billing.
pub mod readers;

/// `/writers`: writer accounts, profile image and article authoring.
pub mod writers;

/// `/admin`: moderation, account management and billing setup.
pub mod admin;
