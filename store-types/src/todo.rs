use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Todo {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub checked: bool,
}

/// Body of `POST /api/todos` and `PATCH /api/todos/edit/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoPayload {
    pub title: String,
    pub checked: bool,
}

impl TodoPayload {
    /// New unchecked todo; `None` for a blank title.
    pub fn new(title: &str) -> Option<Self> {
        let title = title.trim();
        (!title.is_empty()).then(|| TodoPayload {
            title: title.to_string(),
            checked: false,
        })
    }
}

impl Todo {
    pub fn toggled(&self) -> TodoPayload {
        TodoPayload {
            title: self.title.clone(),
            checked: !self.checked,
        }
    }
}
