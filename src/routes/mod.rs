/// Router Module Index
///
/// Splits the HTTP surface by access level. The request guard sits in front of
/// both; it only decides page-level redirects and never authenticates the API.

/// Routes accessible to anyone: health, public profile reads and the
/// `/{username}` page stand-in.
pub mod public;

/// Routes that require a resolved session through the `AuthUser` extractor.
pub mod authenticated;
