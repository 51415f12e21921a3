use regex::Regex;

/// Lexical shape of a username: lowercase alphanumerics and hyphens, 4 to 30
/// characters, never starting or ending with a hyphen.
pub const USERNAME_PATTERN: &str = "^[a-z0-9][a-z0-9-]{2,28}[a-z0-9]$";

/// RouteConfig
///
/// The route table. Every path literal the guard reasons about lives here so
/// that classification and username validation share one source of truth.
#[derive(Clone, Debug)]
pub struct RouteConfig {
    /// Area that requires a session (`/dashboard` and everything below it).
    pub protected_prefix: String,
    /// The sign-in page. Signed-in users are bounced to `protected_prefix`.
    pub login_path: String,
    /// Owner-only preview of the public page. Reserved, never a username.
    pub preview_prefix: String,
    /// JSON API served by this crate.
    pub api_prefix: String,
    /// Framework-internal prefixes (build output, runtime chunks).
    pub system_prefixes: Vec<String>,
    /// File extensions (without the dot) that mark a static asset request.
    pub asset_extensions: Vec<String>,
    pub username_pattern: Regex,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            protected_prefix: "/dashboard".to_string(),
            login_path: "/login".to_string(),
            preview_prefix: "/preview".to_string(),
            api_prefix: "/api".to_string(),
            system_prefixes: vec!["/_next".to_string()],
            asset_extensions: ["ico", "png", "jpg", "jpeg", "svg", "css", "js"]
                .into_iter()
                .map(String::from)
                .collect(),
            username_pattern: Regex::new(USERNAME_PATTERN).expect("static username pattern"),
        }
    }
}

/// RouteClass
///
/// The category a request path falls into. Exactly one applies to any path,
/// decided by the fixed precedence in [`RouteConfig::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteClass {
    /// Root, framework internals and static files.
    Asset,
    Api,
    Protected,
    Login,
    /// A single segment shaped like a username. Carries the candidate.
    UsernameCandidate(String),
    Fallback,
}

impl RouteClass {
    /// Short label used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            RouteClass::Asset => "asset",
            RouteClass::Api => "api",
            RouteClass::Protected => "protected",
            RouteClass::Login => "login",
            RouteClass::UsernameCandidate(_) => "username",
            RouteClass::Fallback => "fallback",
        }
    }
}

impl RouteConfig {
    /// classify
    ///
    /// Pure and stateless. Rules are checked in order and the first match wins:
    /// asset, api, protected, login, username candidate, fallback.
    pub fn classify(&self, path: &str) -> RouteClass {
        if path.is_empty() || path == "/" || self.is_system(path) || self.is_asset(path) {
            RouteClass::Asset
        } else if is_under(path, &self.api_prefix) {
            RouteClass::Api
        } else if is_under(path, &self.protected_prefix) {
            RouteClass::Protected
        } else if path == self.login_path {
            RouteClass::Login
        } else if let Some(candidate) = self.username_candidate(path) {
            RouteClass::UsernameCandidate(candidate.to_string())
        } else {
            RouteClass::Fallback
        }
    }

    /// Returns true when `name` may be claimed as a username: it matches the
    /// lexical pattern and does not shadow a reserved top-level page.
    pub fn is_valid_username(&self, name: &str) -> bool {
        self.username_pattern.is_match(name) && !self.is_reserved(name)
    }

    fn is_reserved(&self, segment: &str) -> bool {
        [&self.login_path, &self.protected_prefix, &self.preview_prefix]
            .iter()
            .any(|reserved| reserved.trim_start_matches('/') == segment)
    }

    fn is_system(&self, path: &str) -> bool {
        self.system_prefixes
            .iter()
            .any(|prefix| is_under(path, prefix))
    }

    fn is_asset(&self, path: &str) -> bool {
        let last_segment = path.rsplit('/').next().unwrap_or(path);
        match last_segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .asset_extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }

    fn username_candidate<'p>(&self, path: &'p str) -> Option<&'p str> {
        let segment = path.strip_prefix('/')?;
        if segment.contains('/') || !self.is_valid_username(segment) {
            return None;
        }
        Some(segment)
    }
}

/// `path` equals `prefix` or continues it with a new segment. `/dashboard`
/// covers `/dashboard/links` but not `/dashboards`.
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
