pub mod gemini;
pub mod openai;
pub mod provider;
pub mod types;

pub use gemini::{GeminiEmbedder, GeminiGenerator};
pub use openai::OpenAiCompatibleEmbedder;
pub use provider::{AnswerGenerator, EmbeddingProvider};
