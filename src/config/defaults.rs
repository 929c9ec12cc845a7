//! Default values for configuration

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default environment variable name for Qdrant API key
pub fn default_qdrant_api_key_env() -> String {
    "QDRANT_API_KEY".to_string()
}

/// Default collection name
pub fn default_collection_name() -> String {
    "movies".to_string()
}

/// Default embedding backend kind
pub fn default_embedding_backend() -> String {
    "local".to_string()
}

/// Default embedding model (multilingual, the document templates are Turkish)
pub fn default_embedding_model() -> String {
    "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string()
}

/// Default embedding dimension
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("MOVIEMIND_EMBEDDING_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default: write paraphrased variants of every record
pub fn default_augment_documents() -> bool {
    true
}

/// Default: expand queries before searching
pub fn default_augment_queries() -> bool {
    true
}

/// Default generative model
pub fn default_generation_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Default environment variable holding the generative API key
pub fn default_generation_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

/// Default Gemini REST endpoint
pub fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Default number of candidates retrieved for the taste profile
pub fn default_candidate_pool() -> usize {
    50
}

/// Default number of results listed when no generator is configured
pub fn default_fallback_results() -> usize {
    10
}

/// Default number of qualifying movies kept when semantic search finds nothing
pub fn default_fallback_scan_limit() -> usize {
    100
}

/// Default number of exemplars shown to the generator
pub fn default_exemplar_count() -> usize {
    5
}

/// Default minimum rating for the taste profile
pub fn default_min_rating() -> f32 {
    0.0
}

/// Default earliest release year for the taste profile
pub fn default_year_min() -> i32 {
    1900
}
