use thiserror::Error;

use crate::{
    models::{ItemKind, ProfileItem, UpdateProfileRequest},
    paths::RouteConfig,
};

pub const MAX_DISPLAY_NAME_CHARS: usize = 60;
pub const MAX_BIO_CHARS: usize = 160;
pub const MAX_ITEMS: usize = 50;
pub const MAX_ITEM_TITLE_CHARS: usize = 80;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username `{0}` is not available: use 4-30 lowercase letters, digits or hyphens")]
    Username(String),
    #[error("display name exceeds {max} characters", max = MAX_DISPLAY_NAME_CHARS)]
    DisplayNameTooLong,
    #[error("bio exceeds {max} characters", max = MAX_BIO_CHARS)]
    BioTooLong,
    #[error("{field} must be a hex color like #1a2b3c")]
    Color { field: &'static str },
    #[error("{field} must be an http(s) URL")]
    Url { field: &'static str },
    #[error("at most {max} links and headers are allowed", max = MAX_ITEMS)]
    TooManyItems,
    #[error("item {index} needs a title of 1-{max} characters", max = MAX_ITEM_TITLE_CHARS)]
    ItemTitle { index: usize },
    #[error("link {index} needs an http(s) URL")]
    ItemUrl { index: usize },
}

/// validate_update
///
/// Checks every field present in the payload. Usernames go through the same
/// route table the guard uses, so a claimable name is always routable.
pub fn validate_update(
    req: &UpdateProfileRequest,
    routes: &RouteConfig,
) -> Result<(), ValidationError> {
    if let Some(username) = &req.username {
        if !routes.is_valid_username(username) {
            return Err(ValidationError::Username(username.clone()));
        }
    }

    if let Some(name) = &req.display_name {
        if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(ValidationError::DisplayNameTooLong);
        }
    }

    if let Some(bio) = &req.bio {
        if bio.chars().count() > MAX_BIO_CHARS {
            return Err(ValidationError::BioTooLong);
        }
    }

    for (field, value) in [
        ("background_color", &req.background_color),
        ("text_color", &req.text_color),
        ("button_color", &req.button_color),
        ("button_text_color", &req.button_text_color),
    ] {
        if let Some(color) = value {
            if !is_hex_color(color) {
                return Err(ValidationError::Color { field });
            }
        }
    }

    for (field, value) in [
        ("avatar_url", &req.avatar_url),
        ("background_image_url", &req.background_image_url),
    ] {
        // Empty clears the field.
        if let Some(url) = value.as_deref().filter(|url| !url.is_empty()) {
            if !is_http_url(url) {
                return Err(ValidationError::Url { field });
            }
        }
    }

    if let Some(items) = &req.links {
        validate_items(items)?;
    }

    Ok(())
}

fn validate_items(items: &[ProfileItem]) -> Result<(), ValidationError> {
    if items.len() > MAX_ITEMS {
        return Err(ValidationError::TooManyItems);
    }

    for (index, item) in items.iter().enumerate() {
        let title_len = item.title.trim().chars().count();
        if title_len == 0 || title_len > MAX_ITEM_TITLE_CHARS {
            return Err(ValidationError::ItemTitle { index });
        }
        if item.kind == ItemKind::Link && !item.url.as_deref().is_some_and(is_http_url) {
            return Err(ValidationError::ItemUrl { index });
        }
    }

    Ok(())
}

/// `#rgb` or `#rrggbb`, case-insensitive.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/') && !host.contains(char::is_whitespace))
}
