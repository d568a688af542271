use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Seeded for every new account at registration.
pub const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("General", "#667eea"),
    ("Work", "#f39c12"),
    ("Personal", "#e74c3c"),
    ("Travel", "#2ecc71"),
    ("Health", "#9b59b6"),
];

pub const DEFAULT_COLOR: &str = "#667eea";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Category name must be 1-50 characters"))]
    pub name: String,

    pub color: Option<String>,
}

impl CreateCategoryRequest {
    /// Color must look like "#667eea"; missing color falls back to the default.
    pub fn validate_color(&self) -> Result<(), String> {
        if let Some(color) = &self.color {
            let rest = color
                .strip_prefix('#')
                .ok_or_else(|| "Color must be a hex value like #667eea".to_string())?;
            if rest.len() != 6 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err("Color must be a hex value like #667eea".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(color: Option<&str>) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: "Reading".into(),
            color: color.map(String::from),
        }
    }

    #[test]
    fn validate_color_accepts_six_digit_hex() {
        assert!(req(Some("#667eea")).validate_color().is_ok());
        assert!(req(Some("#FFFFFF")).validate_color().is_ok());
        assert!(req(None).validate_color().is_ok());
    }

    #[test]
    fn validate_color_rejects_bad_shapes() {
        assert!(req(Some("667eea")).validate_color().is_err());
        assert!(req(Some("#fff")).validate_color().is_err());
        assert!(req(Some("#66gg00")).validate_color().is_err());
    }

    #[test]
    fn default_categories_start_with_general() {
        assert_eq!(DEFAULT_CATEGORIES[0].0, "General");
        assert_eq!(DEFAULT_CATEGORIES[0].1, DEFAULT_COLOR);
        assert_eq!(DEFAULT_CATEGORIES.len(), 5);
    }
}
