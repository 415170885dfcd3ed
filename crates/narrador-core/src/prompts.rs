//! Prompt templates for every model call.
//!
//! Prompts are Portuguese because the service's audience is. Each builder
//! embeds user text verbatim; nothing is escaped or trimmed.

use crate::request::{EvolutionaryStoryRequest, StoryRequest, SummaryRequest};

/// Basic story prompt, fanned out to every configured provider.
pub fn story_prompt(request: &StoryRequest) -> String {
    format!("Escreva uma história sobre {}", request.tema)
}

/// Stage 1 of the evolutionary chain: outline generation.
pub fn draft_prompt(request: &EvolutionaryStoryRequest) -> String {
    format!(
        "Escreva um esboço de uma história sobre {} com estilo {}, gênero {} e extensão {}.",
        request.tema, request.estilo, request.genero, request.extensao
    )
}

/// Stage 2 of the evolutionary chain. The draft is embedded unchanged.
pub fn refine_prompt(draft: &str) -> String {
    format!("Refine e amplie o seguinte esboço de história: {}", draft)
}

/// Plain summary.
pub fn summary_prompt(request: &SummaryRequest) -> String {
    format!("Resuma o seguinte texto: {}", request.texto)
}

/// Summary plus keywords and sentiment, returned as one free-text answer.
pub fn advanced_summary_prompt(request: &SummaryRequest) -> String {
    format!(
        "Resuma o seguinte texto de forma {} e extraia as principais palavras-chave \
         e o sentimento (positivo, negativo ou neutro): {}",
        request.tamanho, request.texto
    )
}
