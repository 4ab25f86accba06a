use super::ChatModel;
use super::AVAILABLE_MODELS;

#[test]
fn it_defaults_to_gemini_flash() {
    assert_eq!(ChatModel::default_model().id, "google/gemini-1.5-flash");
}

#[test]
fn it_finds_models_by_id() {
    let model = ChatModel::find("openai/gpt-4o").unwrap();
    assert_eq!(model.name, "GPT-4o");
    assert!(ChatModel::find("openai/gpt-5").is_none());
}

#[test]
fn it_parses_selection_by_index() {
    assert_eq!(ChatModel::parse_selection("1").unwrap().id, AVAILABLE_MODELS[0].id);
    assert_eq!(ChatModel::parse_selection(" 6 ").unwrap().id, "openai/o1");
    assert!(ChatModel::parse_selection("0").is_none());
    assert!(ChatModel::parse_selection("7").is_none());
}

#[test]
fn it_parses_selection_by_id() {
    assert_eq!(
        ChatModel::parse_selection("google/gemini-1.5-pro").unwrap().name,
        "Gemini 1.5 Pro"
    );
    assert!(ChatModel::parse_selection("nope").is_none());
}

#[test]
fn it_falls_back_to_default_display_name() {
    assert_eq!(ChatModel::display_name("openai/o1"), "OpenAI o1");
    assert_eq!(ChatModel::display_name("unknown"), "Gemini 1.5 Flash");
}
