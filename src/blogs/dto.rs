use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{BlogPatch, NewBlog},
};

/// Body for creating a blog, also used by the bulk testing fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub likes: Option<i64>,
}

impl BlogInput {
    pub(crate) fn into_new_blog(self, user_id: Option<Uuid>) -> Result<NewBlog, AppError> {
        let title = required("title", self.title)?;
        let url = required("url", self.url)?;
        let likes = non_negative(self.likes.unwrap_or(0))?;
        Ok(NewBlog {
            title,
            author: self.author.and_then(optional_author),
            url,
            likes,
            user_id,
        })
    }
}

/// Partial update; a like is a `PUT` with `likes` bumped by one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<i64>,
}

impl BlogUpdate {
    pub(crate) fn into_patch(self) -> Result<BlogPatch, AppError> {
        Ok(BlogPatch {
            title: self.title.map(|t| required("title", t)).transpose()?,
            // blank clears the author
            author: self.author.map(optional_author),
            url: self.url.map(|u| required("url", u)).transpose()?,
            likes: self.likes.map(non_negative).transpose()?,
        })
    }
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}

fn optional_author(author: String) -> Option<String> {
    let author = author.trim();
    (!author.is_empty()).then(|| author.to_string())
}

fn non_negative(likes: i64) -> Result<i64, AppError> {
    if likes < 0 {
        return Err(AppError::BadRequest("likes must not be negative".into()));
    }
    Ok(likes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, url: &str, likes: Option<i64>) -> BlogInput {
        BlogInput {
            title: title.into(),
            author: Some("  ".into()),
            url: url.into(),
            likes,
        }
    }

    #[test]
    fn defaults_likes_and_drops_blank_author() {
        let blog = input("Test blog", "url", None).into_new_blog(None).unwrap();
        assert_eq!(blog.likes, 0);
        assert!(blog.author.is_none());
    }

    #[test]
    fn title_and_url_are_required() {
        assert!(input(" ", "url", None).into_new_blog(None).is_err());
        assert!(input("t", "", None).into_new_blog(None).is_err());
    }

    #[test]
    fn negative_likes_are_rejected() {
        assert!(input("t", "u", Some(-1)).into_new_blog(None).is_err());
        let update = BlogUpdate {
            likes: Some(-3),
            ..Default::default()
        };
        assert!(update.into_patch().is_err());
    }

    #[test]
    fn empty_update_is_a_noop_patch() {
        let patch = BlogUpdate::default().into_patch().unwrap();
        assert!(patch.title.is_none() && patch.url.is_none() && patch.likes.is_none());
        assert!(patch.author.is_none());
    }

    #[test]
    fn blank_author_on_update_clears_it() {
        let blank = BlogUpdate {
            author: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.into_patch().unwrap().author, Some(None));

        let named = BlogUpdate {
            author: Some(" Robert C. Martin ".into()),
            ..Default::default()
        };
        assert_eq!(
            named.into_patch().unwrap().author,
            Some(Some("Robert C. Martin".to_string()))
        );
    }
}
