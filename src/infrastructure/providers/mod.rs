#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod gemini;
pub mod openai;

use crate::domain::models::ProviderBox;
use crate::domain::models::ProviderName;

pub struct ProviderManager {}

impl ProviderManager {
    pub fn get(name: ProviderName) -> ProviderBox {
        return match name {
            ProviderName::OpenAI => Box::<openai::OpenAI>::default(),
            ProviderName::Gemini => Box::<gemini::Gemini>::default(),
        };
    }
}
