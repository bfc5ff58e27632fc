use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub display_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub type_number: Option<i32>,
    #[serde(default)]
    pub type_name: Option<String>,
    /// Personality family; boards in the family area are filtered by it.
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub profile_completed_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_id: None,
            nickname: None,
            bio: None,
            hobbies: Vec::new(),
            username: None,
            avatar_url: None,
            type_number: None,
            type_name: None,
            family: None,
            profile_completed_at: None,
        }
    }

    /// Apply a partial update in place (used by stores that hold rows in memory).
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(nickname) = &update.nickname {
            self.nickname = Some(nickname.clone());
        }
        if let Some(bio) = &update.bio {
            self.bio = bio.clone();
        }
        if let Some(hobbies) = &update.hobbies {
            self.hobbies = hobbies.clone();
        }
        if let Some(username) = &update.username {
            self.username = Some(username.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            self.avatar_url = avatar_url.clone();
        }
        if let Some(at) = update.profile_completed_at {
            self.profile_completed_at = Some(at);
        }
    }
}

/// `hobbies` is a nullable array column.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update of a profile row. `None` leaves a column untouched;
/// `Some(None)` on a nullable column writes NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_completed_at: Option<DateTime<Utc>>,
}

impl ProfileUpdate {
    pub fn avatar_url(url: Option<String>) -> Self {
        Self {
            avatar_url: Some(url),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}
