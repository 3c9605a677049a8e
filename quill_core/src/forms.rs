use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::ids::GroupId;

fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("this field may not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Submission for creating or editing a post.
///
/// The author is never part of the submission; the view layer attaches the
/// authenticated identity after validation.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct PostForm {
    #[validate(custom(function = not_blank))]
    pub text: String,
    pub group: Option<GroupId>,
    pub image: Option<Vec<u8>>,
}

impl PostForm {
    /// Pre-filled form for the edit page. The stored image is not echoed
    /// back into the upload field.
    pub fn from_post(post: &crate::entity::post::Model) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id,
            image: None,
        }
    }
}

/// Submission for commenting on a post.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(custom(function = not_blank))]
    pub text: String,
}

/// Field error attached when a submission names a group that does not exist.
pub fn unknown_group(errors: &mut ValidationErrors) {
    let mut error = ValidationError::new("unknown_group");
    error.message = Some("selected group does not exist".into());
    errors.add("group", error);
}
