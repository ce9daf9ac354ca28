pub mod openai_compatible;

pub use openai_compatible::{
    BackendConfig, OpenAICompatibleBackend, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MODEL,
};
