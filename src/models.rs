use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
pub const DEFAULT_TEXT_COLOR: &str = "#111111";
pub const DEFAULT_BUTTON_COLOR: &str = "#111111";
pub const DEFAULT_BUTTON_TEXT_COLOR: &str = "#ffffff";

// --- Core Application Schemas (Mapped to Database) ---

/// Profile
///
/// The owner's view of a row in `public.profiles`. One per auth user; the
/// primary key is the Supabase auth user id. `username` stays empty until the
/// owner claims one, so a fresh profile is not reachable publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Profile {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Ordered page content: links, grouped by optional section headers.
    pub links: Vec<ProfileItem>,
    pub background_color: String,
    pub text_color: String,
    pub button_color: String,
    pub button_text_color: String,
    pub background_image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A blank profile with default styling, as created on first dashboard visit.
    pub fn blank(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username: None,
            display_name: None,
            bio: None,
            avatar_url: None,
            links: Vec::new(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            button_color: DEFAULT_BUTTON_COLOR.to_string(),
            button_text_color: DEFAULT_BUTTON_TEXT_COLOR.to_string(),
            background_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// ItemKind
///
/// `Header` starts a new section; `Link` entries below it belong to that section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ItemKind {
    Link,
    Header,
}

/// ProfileItem
///
/// One entry of a profile page, stored inside the `links` JSONB column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProfileItem {
    pub kind: ItemKind,
    pub title: String,
    /// Required for links, ignored for headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// --- Output Schemas ---

/// PublicProfile
///
/// What visitors of `/{username}` receive. Omits the owner id and bookkeeping
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PublicProfile {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub links: Vec<ProfileItem>,
    pub background_color: String,
    pub text_color: String,
    pub button_color: String,
    pub button_text_color: String,
    pub background_image_url: Option<String>,
}

impl From<Profile> for PublicProfile {
    fn from(profile: Profile) -> Self {
        Self {
            username: profile.username.unwrap_or_default(),
            display_name: profile.display_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            links: profile.links,
            background_color: profile.background_color,
            text_color: profile.text_color,
            button_color: profile.button_color,
            button_text_color: profile.button_text_color,
            background_image_url: profile.background_image_url,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// UpdateProfileRequest
///
/// Partial update payload for `PUT /api/me/profile`. Absent fields are left
/// untouched. For the nullable text fields an empty string clears the value.
/// `links`, when present, replaces the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<ProfileItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
}

// --- Change Feed ---

/// ProfileChange
///
/// Emitted on the change feed after a profile is created or updated. Carries
/// the full new state so subscribers never need a follow-up fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProfileChange {
    pub user_id: Uuid,
    pub profile: Profile,
}
