use tap_in::{
    models::{ItemKind, ProfileItem, UpdateProfileRequest},
    paths::RouteConfig,
    validation::{MAX_BIO_CHARS, MAX_ITEMS, ValidationError, is_hex_color, validate_update},
};

fn check(req: UpdateProfileRequest) -> Result<(), ValidationError> {
    validate_update(&req, &RouteConfig::default())
}

fn link(title: &str, url: Option<&str>) -> ProfileItem {
    ProfileItem {
        kind: ItemKind::Link,
        title: title.to_string(),
        url: url.map(String::from),
    }
}

#[test]
fn test_empty_payload_is_valid() {
    assert_eq!(check(UpdateProfileRequest::default()), Ok(()));
}

#[test]
fn test_username_rules_match_the_route_table() {
    for good in ["jane-doe", "abcd", "0x00"] {
        let req = UpdateProfileRequest {
            username: Some(good.to_string()),
            ..Default::default()
        };
        assert_eq!(check(req), Ok(()), "{good}");
    }

    for bad in ["", "abc", "Jane", "-jane", "jane-", "jane doe", "login", "preview"] {
        let req = UpdateProfileRequest {
            username: Some(bad.to_string()),
            ..Default::default()
        };
        assert_eq!(check(req), Err(ValidationError::Username(bad.to_string())), "{bad}");
    }
}

#[test]
fn test_bio_length_counts_characters_not_bytes() {
    let at_limit = "é".repeat(MAX_BIO_CHARS);
    let req = UpdateProfileRequest {
        bio: Some(at_limit),
        ..Default::default()
    };
    assert_eq!(check(req), Ok(()));

    let req = UpdateProfileRequest {
        bio: Some("x".repeat(MAX_BIO_CHARS + 1)),
        ..Default::default()
    };
    assert_eq!(check(req), Err(ValidationError::BioTooLong));
}

#[test]
fn test_colors() {
    assert!(is_hex_color("#fff"));
    assert!(is_hex_color("#1A2b3C"));
    assert!(!is_hex_color("fff"));
    assert!(!is_hex_color("#ffff"));
    assert!(!is_hex_color("#gggggg"));

    let req = UpdateProfileRequest {
        text_color: Some("red".to_string()),
        ..Default::default()
    };
    assert_eq!(check(req), Err(ValidationError::Color { field: "text_color" }));
}

#[test]
fn test_urls_may_be_cleared_but_not_malformed() {
    let req = UpdateProfileRequest {
        avatar_url: Some(String::new()),
        ..Default::default()
    };
    assert_eq!(check(req), Ok(()));

    let req = UpdateProfileRequest {
        avatar_url: Some("javascript:alert(1)".to_string()),
        ..Default::default()
    };
    assert_eq!(check(req), Err(ValidationError::Url { field: "avatar_url" }));
}

#[test]
fn test_items() {
    let header = ProfileItem {
        kind: ItemKind::Header,
        title: "Music".to_string(),
        url: None,
    };
    let req = UpdateProfileRequest {
        links: Some(vec![header, link("Bandcamp", Some("https://jane.bandcamp.com"))]),
        ..Default::default()
    };
    assert_eq!(check(req), Ok(()));

    let req = UpdateProfileRequest {
        links: Some(vec![link("ok", Some("https://a.b")), link("   ", Some("https://a.b"))]),
        ..Default::default()
    };
    assert_eq!(check(req), Err(ValidationError::ItemTitle { index: 1 }));

    let req = UpdateProfileRequest {
        links: Some(vec![link("No url", None)]),
        ..Default::default()
    };
    assert_eq!(check(req), Err(ValidationError::ItemUrl { index: 0 }));

    let req = UpdateProfileRequest {
        links: Some(vec![link("ftp", Some("ftp://files.example.com"))]),
        ..Default::default()
    };
    assert_eq!(check(req), Err(ValidationError::ItemUrl { index: 0 }));

    let req = UpdateProfileRequest {
        links: Some(vec![link("x", Some("https://a.b")); MAX_ITEMS + 1]),
        ..Default::default()
    };
    assert_eq!(check(req), Err(ValidationError::TooManyItems));
}

#[test]
fn test_item_kind_wire_format() {
    let item: ProfileItem =
        serde_json::from_str(r#"{"kind":"header","title":"Socials"}"#).unwrap();
    assert_eq!(item.kind, ItemKind::Header);
    assert!(item.url.is_none());

    let json = serde_json::to_value(link("Site", Some("https://a.b"))).unwrap();
    assert_eq!(json["kind"], "link");
}
