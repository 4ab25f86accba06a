#[cfg(test)]
#[path = "chat_model_test.rs"]
mod tests;

#[derive(Debug, PartialEq, Eq)]
pub struct ChatModel {
    pub id: &'static str,
    pub name: &'static str,
}

/// Models a chat client may select. The relay does not consult this list
/// unless model validation is turned on.
pub const AVAILABLE_MODELS: [ChatModel; 6] = [
    ChatModel {
        id: "google/gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
    },
    ChatModel {
        id: "google/gemini-1.5-pro",
        name: "Gemini 1.5 Pro",
    },
    ChatModel {
        id: "google/gemini-1.5-flash",
        name: "Gemini 1.5 Flash",
    },
    ChatModel {
        id: "openai/gpt-4o",
        name: "GPT-4o",
    },
    ChatModel {
        id: "openai/gpt-4o-mini",
        name: "GPT-4o Mini",
    },
    ChatModel {
        id: "openai/o1",
        name: "OpenAI o1",
    },
];

impl ChatModel {
    pub fn default_model() -> &'static ChatModel {
        return &AVAILABLE_MODELS[2];
    }

    pub fn find(id: &str) -> Option<&'static ChatModel> {
        return AVAILABLE_MODELS.iter().find(|model| return model.id == id);
    }

    /// Resolves either a model id or its 1-based position in the list.
    pub fn parse_selection(selection: &str) -> Option<&'static ChatModel> {
        let selection = selection.trim();
        if let Ok(idx) = selection.parse::<usize>() {
            if idx < 1 || idx > AVAILABLE_MODELS.len() {
                return None;
            }
            return Some(&AVAILABLE_MODELS[idx - 1]);
        }

        return ChatModel::find(selection);
    }

    /// Display name for any id, falling back to the default model's name the
    /// same way the model picker does.
    pub fn display_name(id: &str) -> &'static str {
        return ChatModel::find(id)
            .unwrap_or_else(ChatModel::default_model)
            .name;
    }
}
