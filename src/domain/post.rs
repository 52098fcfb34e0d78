use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::domain::category::MAX_TITLE_LEN;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub category: Option<CategoryRef>,
    pub location: Option<LocationRef>,
    pub is_published: bool,
    /// Object-storage key of the attached image.
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub comment_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRef {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

/// Raw post form as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub location: Option<i64>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A validated post form, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub is_published: bool,
    pub image_key: Option<String>,
}

impl PostForm {
    /// Checks required fields and normalizes `pub_date`.
    ///
    /// Naive timestamps are interpreted in `default_offset`.
    pub fn validate(self, default_offset: UtcOffset) -> Result<PostDraft, String> {
        let title = self.title.unwrap_or_default();
        let title = title.trim();
        if title.is_empty() {
            return Err("title is required".to_string());
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(format!("title must be at most {} characters", MAX_TITLE_LEN));
        }

        let text = self.text.unwrap_or_default();
        if text.trim().is_empty() {
            return Err("text is required".to_string());
        }

        let raw_pub_date = self.pub_date.unwrap_or_default();
        if raw_pub_date.trim().is_empty() {
            return Err("pub_date is required".to_string());
        }
        let pub_date = parse_pub_date(&raw_pub_date, default_offset)
            .ok_or_else(|| "pub_date is not a valid date and time".to_string())?;

        let image_key = self
            .image
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(PostDraft {
            title: title.to_string(),
            text,
            pub_date,
            location_id: self.location,
            category_id: self.category,
            is_published: self.is_published.unwrap_or(true),
            image_key,
        })
    }
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DD[T ]HH:MM[:SS]` in `default_offset`.
pub fn parse_pub_date(raw: &str, default_offset: UtcOffset) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    let naive = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            raw,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day] [hour]:[minute]"))
    })
    .ok()?;

    Some(naive.assume_offset(default_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn form() -> PostForm {
        PostForm {
            title: Some("  Into the woods ".to_string()),
            text: Some("A walk.".to_string()),
            pub_date: Some("2024-05-01T10:30".to_string()),
            ..PostForm::default()
        }
    }

    #[test]
    fn naive_pub_date_uses_default_offset() {
        let parsed = parse_pub_date("2024-05-01T10:30", offset!(+3)).unwrap();
        assert_eq!(parsed, datetime!(2024-05-01 10:30 +3));
        assert_eq!(parsed, datetime!(2024-05-01 07:30 UTC));

        let parsed = parse_pub_date("2024-05-01 10:30:15", offset!(UTC)).unwrap();
        assert_eq!(parsed, datetime!(2024-05-01 10:30:15 UTC));
    }

    #[test]
    fn aware_pub_date_keeps_its_offset() {
        let parsed = parse_pub_date("2024-05-01T10:30:00-02:00", offset!(+3)).unwrap();
        assert_eq!(parsed, datetime!(2024-05-01 12:30 UTC));
    }

    #[test]
    fn garbage_pub_date_is_rejected() {
        assert!(parse_pub_date("yesterday", offset!(UTC)).is_none());
        assert!(parse_pub_date("2024-13-01T10:30", offset!(UTC)).is_none());
    }

    #[test]
    fn validate_trims_title_and_defaults_published() {
        let draft = form().validate(offset!(UTC)).unwrap();
        assert_eq!(draft.title, "Into the woods");
        assert!(draft.is_published);
        assert_eq!(draft.category_id, None);
        assert_eq!(draft.image_key, None);
    }

    #[test]
    fn validate_requires_fields() {
        let mut missing_title = form();
        missing_title.title = Some("   ".to_string());
        assert_eq!(
            missing_title.validate(offset!(UTC)).unwrap_err(),
            "title is required"
        );

        let mut missing_text = form();
        missing_text.text = None;
        assert_eq!(missing_text.validate(offset!(UTC)).unwrap_err(), "text is required");

        let mut missing_date = form();
        missing_date.pub_date = None;
        assert_eq!(
            missing_date.validate(offset!(UTC)).unwrap_err(),
            "pub_date is required"
        );
    }

    #[test]
    fn validate_limits_title_length() {
        let mut long_title = form();
        long_title.title = Some("a".repeat(MAX_TITLE_LEN + 1));
        assert!(long_title.validate(offset!(UTC)).is_err());
    }

    #[test]
    fn blank_image_is_dropped() {
        let mut with_blank_image = form();
        with_blank_image.image = Some(" ".to_string());
        assert_eq!(with_blank_image.validate(offset!(UTC)).unwrap().image_key, None);
    }
}
