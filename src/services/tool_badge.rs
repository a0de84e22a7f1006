//! Chat tool-call badges.
//!
//! Maps a tool invocation streamed from the model to the short label and
//! status shown next to it in the chat ("Creating App.jsx", spinner or done).

use serde::{Deserialize, Serialize};

const STR_REPLACE_EDITOR: &str = "str_replace_editor";
const FILE_MANAGER: &str = "file_manager";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallState {
    PartialCall,
    Call,
    Result,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
    pub state: ToolCallState,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeStatus {
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub tool_call_id: String,
    pub label: String,
    pub status: BadgeStatus,
}

impl ToolInvocation {
    fn arg(&self, key: &str) -> Option<&str> {
        self.args.as_ref()?.get(key)?.as_str()
    }

    /// Last path segment of `args.path`, or `"file"`.
    fn file_name(&self) -> &str {
        self.arg("path")
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("file")
    }

    #[must_use]
    pub fn label(&self) -> String {
        let command = self.arg("command");
        let verb = match (self.tool_name.as_str(), command) {
            (STR_REPLACE_EDITOR, Some("create")) => "Creating",
            (STR_REPLACE_EDITOR, Some("str_replace" | "insert")) => "Editing",
            (STR_REPLACE_EDITOR, Some("view")) => "Viewing",
            (STR_REPLACE_EDITOR, Some("undo_edit")) => "Undoing edit on",
            (STR_REPLACE_EDITOR, _) => "Working on",
            (FILE_MANAGER, Some("rename")) => "Renaming",
            (FILE_MANAGER, Some("delete")) => "Deleting",
            (FILE_MANAGER, _) => "Managing",
            (other, _) => return other.to_owned(),
        };
        format!("{verb} {}", self.file_name())
    }

    /// Done only once a result has actually arrived.
    #[must_use]
    pub fn status(&self) -> BadgeStatus {
        match (self.state, &self.result) {
            (ToolCallState::Result, Some(value)) if !value.is_null() => BadgeStatus::Done,
            _ => BadgeStatus::Pending,
        }
    }

    #[must_use]
    pub fn badge(&self) -> Badge {
        Badge { tool_call_id: self.tool_call_id.clone(), label: self.label(), status: self.status() }
    }
}

#[cfg(test)]
#[path = "tool_badge_test.rs"]
mod tests;
