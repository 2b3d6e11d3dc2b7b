use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{DistanceMetric, GenerationParams};

/// Plain environment variables of older deployments, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("NVIDIA_KEY", "llm.api_key"),
    ("LLM_MODEL", "llm.model"),
    ("MODEL_NAME", "embedding.model"),
    ("API_URL", "chat.api_url"),
];

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Merge defaults, `config.toml`, `config.<env>.toml` and the environment,
    /// looking for files in the current directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__")).merge(legacy_env());

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    /// The full typed view, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        match LEGACY_ENV.iter().find(|(name, _)| key.as_str().eq_ignore_ascii_case(name)) {
            Some((_, target)) => (*target).into(),
            None => key.into(),
        }
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub extract: ExtractSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub timeouts: TimeoutSettings,
    pub server: ServerSettings,
    pub chat: ChatSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be > 0".into()));
        }
        if c.overlap >= c.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                c.overlap, c.chunk_size
            )));
        }
        if self.store.dimension == 0 {
            return Err(Error::InvalidConfig("store.dimension must be > 0".into()));
        }
        if self.store.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("store.collection must not be empty".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be > 0".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be > 0".into()));
        }
        Ok(())
    }

    pub fn data_root(&self) -> PathBuf {
        expand_path(&self.data.root)
    }

    pub fn store_uri(&self) -> PathBuf {
        expand_path(&self.store.uri)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        expand_path(&self.chunking.tokenizer)
    }

    pub fn embedding_model_dir(&self) -> PathBuf {
        expand_path(&self.embedding.model)
    }

    pub fn download_dir(&self) -> PathBuf {
        expand_path(&self.chat.download_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub root: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { root: "data".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub max_file_bytes: u64,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self { max_file_bytes: 50 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub overlap: usize,
    /// Path to a Hugging Face `tokenizer.json`.
    pub tokenizer: String,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 50, tokenizer: "models/embedding/tokenizer.json".into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Local,
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model: String,
    pub max_len: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { provider: EmbeddingProvider::Local, model: "models/embedding".into(), max_len: 512, batch_size: 32 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexStrategy {
    /// Delete the collection, then create it again under the same name.
    Recreate,
    /// Build a new physical collection and repoint the alias when done.
    #[default]
    ShadowSwap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub uri: String,
    pub collection: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub reindex_strategy: ReindexStrategy,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: "index/lancedb".into(),
            collection: "vdb-study".into(),
            dimension: 768,
            metric: DistanceMetric::Dot,
            reindex_strategy: ReindexStrategy::ShadowSwap,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// Empty means no credential; queries then get a fixed "not configured" answer.
    pub api_key: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl LlmSettings {
    pub fn params(&self) -> GenerationParams {
        GenerationParams { temperature: self.temperature, top_p: self.top_p, max_tokens: self.max_tokens }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            base_url: "https://integrate.api.nvidia.com/v1".into(),
            model: "meta/llama3-70b-instruct".into(),
            api_key: String::new(),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub embed_secs: u64,
    pub search_secs: u64,
    pub generate_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { embed_secs: 30, search_secs: 30, generate_secs: 120 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 8000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub api_url: String,
    pub download_dir: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { api_url: "http://localhost:8000/llm_calls".into(), download_dir: "downloads".into() }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
