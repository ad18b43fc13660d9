pub mod chat;
pub mod context;
pub mod core;
pub mod ingest;
pub mod language;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod vector_math;
