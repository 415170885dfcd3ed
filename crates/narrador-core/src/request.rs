//! Incoming request shapes.
//!
//! Field names follow the public query parameters (`tema`, `estilo`, ...)
//! so the types deserialize straight from the query string.

use serde::{Deserialize, Serialize};

/// Default narrative style for evolutionary stories.
pub const DEFAULT_ESTILO: &str = "aventura";

/// Default genre for evolutionary stories.
pub const DEFAULT_GENERO: &str = "ficção";

/// Default length for evolutionary stories.
pub const DEFAULT_EXTENSAO: &str = "media";

/// Default summary length for advanced summaries.
pub const DEFAULT_TAMANHO: &str = "conciso";

/// A basic story request: just a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRequest {
    /// Topic of the story
    pub tema: String,
}

impl StoryRequest {
    pub fn new(tema: impl Into<String>) -> Self {
        Self { tema: tema.into() }
    }
}

/// A chained (draft then refine) story request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionaryStoryRequest {
    /// Topic of the story
    pub tema: String,

    /// Narrative style
    #[serde(default = "default_estilo")]
    pub estilo: String,

    /// Literary genre
    #[serde(default = "default_genero")]
    pub genero: String,

    /// Desired length
    #[serde(default = "default_extensao")]
    pub extensao: String,
}

impl EvolutionaryStoryRequest {
    /// Create a request with the default style, genre and length.
    pub fn new(tema: impl Into<String>) -> Self {
        Self {
            tema: tema.into(),
            estilo: default_estilo(),
            genero: default_genero(),
            extensao: default_extensao(),
        }
    }

    pub fn with_estilo(mut self, estilo: impl Into<String>) -> Self {
        self.estilo = estilo.into();
        self
    }

    pub fn with_genero(mut self, genero: impl Into<String>) -> Self {
        self.genero = genero.into();
        self
    }

    pub fn with_extensao(mut self, extensao: impl Into<String>) -> Self {
        self.extensao = extensao.into();
        self
    }
}

/// A summary request. `tamanho` only shapes the advanced variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// Text to summarize
    pub texto: String,

    /// Summary length/tone modifier
    #[serde(default = "default_tamanho")]
    pub tamanho: String,
}

impl SummaryRequest {
    pub fn new(texto: impl Into<String>) -> Self {
        Self {
            texto: texto.into(),
            tamanho: default_tamanho(),
        }
    }

    pub fn with_tamanho(mut self, tamanho: impl Into<String>) -> Self {
        self.tamanho = tamanho.into();
        self
    }

    /// First characters of the text, for log lines.
    pub fn preview(&self) -> String {
        let head: String = self.texto.chars().take(30).collect();
        if head.len() < self.texto.len() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

fn default_estilo() -> String {
    DEFAULT_ESTILO.to_string()
}

fn default_genero() -> String {
    DEFAULT_GENERO.to_string()
}

fn default_extensao() -> String {
    DEFAULT_EXTENSAO.to_string()
}

fn default_tamanho() -> String {
    DEFAULT_TAMANHO.to_string()
}
