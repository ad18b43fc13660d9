use axum::http::HeaderValue;

use super::service::{AppConfig, ConfigError, EmbeddingBackend};

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_non_empty("server.host", &config.server.host)?;
    validate_non_empty("server.cors_allowed_origin", &config.server.cors_allowed_origin)?;
    if config.server.cors_allowed_origin.trim() == "*" {
        return Err(invalid(
            "server.cors_allowed_origin must name a single origin when credentials are allowed",
        ));
    }
    HeaderValue::from_str(&config.server.cors_allowed_origin).map_err(|_| {
        invalid(format!(
            "server.cors_allowed_origin is not a valid header value: {}",
            config.server.cors_allowed_origin
        ))
    })?;

    if config.index.dir.as_os_str().is_empty() {
        return Err(invalid("index.dir must not be empty"));
    }

    let retrieval = &config.retrieval;
    validate_range("retrieval.top_k", retrieval.top_k, 1, 100)?;
    validate_range(
        "retrieval.context_passages",
        retrieval.context_passages,
        1,
        retrieval.top_k,
    )?;

    validate_non_empty("embedding.model", &config.embedding.model)?;
    validate_range("embedding.batch_size", config.embedding.batch_size, 1, 1_000)?;
    validate_range("embedding.concurrency", config.embedding.concurrency, 1, 64)?;
    if config.embedding.backend == EmbeddingBackend::OpenaiCompatible
        && config
            .embedding
            .base_url
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    {
        return Err(invalid(
            "embedding.base_url is required for the openai_compatible backend",
        ));
    }

    validate_non_empty("generation.model", &config.generation.model)?;
    validate_non_empty("generation.base_url", &config.generation.base_url)?;

    let chunking = &config.chunking;
    validate_range("chunking.chunk_size", chunking.chunk_size, 1, 1_000_000)?;
    if chunking.chunk_overlap >= chunking.chunk_size {
        return Err(invalid(format!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            chunking.chunk_overlap, chunking.chunk_size
        )));
    }

    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_range(field: &str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(invalid(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate_config(&AppConfig::default()).expect("defaults should validate");
    }

    #[test]
    fn context_passages_cannot_exceed_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 1;
        config.retrieval.context_passages = 2;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("retrieval.context_passages"), "{err}");
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = AppConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn wildcard_origin_is_rejected() {
        let mut config = AppConfig::default();
        config.server.cors_allowed_origin = "*".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn openai_backend_requires_base_url() {
        let mut config = AppConfig::default();
        config.embedding.backend = EmbeddingBackend::OpenaiCompatible;
        assert!(validate_config(&config).is_err());

        config.embedding.base_url = Some("http://localhost:8080".to_string());
        validate_config(&config).expect("base url satisfies the backend");
    }
}
