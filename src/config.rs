use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ArchpromptError;

const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024; // 64 KiB

/// Smallest budget that fits the seed pair plus the first reply.
pub const MIN_TURN_BUDGET: usize = 3;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";
pub const DEFAULT_TURN_BUDGET: usize = 8;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a software architecture expert designed to output JSON. You are asked to output a JSON object with the following properties: applications (list of application objects), and connections (list of connection objects). An application object has the following properties: name (string), color (hex string), servers (list of server objects), position (a list of 3 ints), rotation (a list of 3 ints between 0 and 360), scale (a list of 3 floats between 1 and 5), geometry (string with a value of any box, capsule, circle, cone, cylinder, dodecahedron, icosahedron, octahedron, plane, ring, sphere, tetrahedron, torus, torusKnot. Default is box). A server object has the following properties: name (string). A connection object has the following properties: source (an application name string), target (an application name string). The connection.source shows which application will establish the connection to the connection.target. Applications should be positioned close to each other with a gap of around 10 assuming that their size is 1x1x1 initially.";

pub const DEFAULT_USER_MESSAGE: &str = "Generate an example architecture for a social media style application. The website should have systems that handle user authentication, user profiles, and user posts. Load balancers should be used to distribute traffic between the servers. Each application should have its own named load balancer that other applications can use to access it. Include the load balancers in the JSON output.";

// --- TOML deserialization structs (private, every key optional) ---

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    chosen_model: Option<String>,
    max_messages: Option<usize>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    request_timeout_secs: Option<u64>,
    models: Option<Vec<ModelEntry>>,
    prompt: Option<PromptSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelEntry {
    name: String,
    input: f64,
    output: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PromptSection {
    system: Option<String>,
    user: Option<String>,
}

impl From<ModelEntry> for ModelSpec {
    fn from(entry: ModelEntry) -> Self {
        Self {
            name: entry.name,
            input_price: entry.input,
            output_price: entry.output,
        }
    }
}

// --- Validated configuration ---

/// A model the program may call, with its advertised USD price per 1K tokens.
/// Prices only feed the cost estimate in the logs.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub input_price: f64,
    pub output_price: f64,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, input_price: f64, output_price: f64) -> Self {
        Self {
            name: name.into(),
            input_price,
            output_price,
        }
    }

    /// Estimated USD cost of one completion.
    pub fn estimate_cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1000.0) * self.input_price
            + (completion_tokens as f64 / 1000.0) * self.output_price
    }
}

/// Immutable run configuration, built once at startup and handed to the
/// driver by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    models: Vec<ModelSpec>,
    chosen_model: String,
    max_messages: usize,
    max_tokens: u32,
    temperature: f64,
    request_timeout: Duration,
    system_prompt: String,
    user_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: default_models(),
            chosen_model: DEFAULT_MODEL.to_owned(),
            max_messages: DEFAULT_TURN_BUDGET,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            user_message: DEFAULT_USER_MESSAGE.to_owned(),
        }
    }
}

fn default_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("gpt-4-1106-preview", 0.01, 0.03),
        ModelSpec::new("gpt-3.5-turbo-1106", 0.001, 0.002),
    ]
}

impl FromStr for Config {
    type Err = ArchpromptError;

    /// Parse a TOML override file and merge it over the defaults.
    fn from_str(content: &str) -> Result<Self, ArchpromptError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ArchpromptError::ConfigLoad(e.to_string()))?;

        let mut config = Config::default();
        if let Some(models) = file.models {
            config.models = models.into_iter().map(ModelSpec::from).collect();
        }
        if let Some(name) = file.chosen_model {
            config.chosen_model = name;
        }
        if let Some(n) = file.max_messages {
            config.max_messages = n;
        }
        if let Some(n) = file.max_tokens {
            config.max_tokens = n;
        }
        if let Some(t) = file.temperature {
            config.temperature = t;
        }
        if let Some(secs) = file.request_timeout_secs {
            if secs == 0 {
                return Err(ArchpromptError::ConfigValidation(
                    "request_timeout_secs must be positive".to_owned(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(prompt) = file.prompt {
            if let Some(system) = prompt.system {
                config.system_prompt = system;
            }
            if let Some(user) = prompt.user {
                config.user_message = user;
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Load overrides from a TOML file. Checks file size before reading.
    pub fn load(path: &Path) -> Result<Self, ArchpromptError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            ArchpromptError::ConfigLoad(format!("cannot read {}: {e}", path.display()))
        })?;

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ArchpromptError::ConfigLoad(format!(
                "config file exceeds {MAX_CONFIG_FILE_SIZE} byte limit"
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ArchpromptError::ConfigLoad(format!("cannot read {}: {e}", path.display()))
        })?;

        content.parse()
    }

    /// Select a different catalog model.
    pub fn with_chosen_model(mut self, name: impl Into<String>) -> Result<Self, ArchpromptError> {
        self.chosen_model = name.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Result<Self, ArchpromptError> {
        self.max_messages = max_messages;
        self.validate()?;
        Ok(self)
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    /// The catalog entry for the chosen model. Validation guarantees it exists.
    pub fn chosen_model(&self) -> &ModelSpec {
        self.find_model(&self.chosen_model)
            .unwrap_or_else(|| &self.models[0])
    }

    pub fn find_model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Turn budget: the most turns the conversation may ever hold.
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    fn validate(&self) -> Result<(), ArchpromptError> {
        if self.models.is_empty() {
            return Err(ArchpromptError::ConfigValidation(
                "model catalog must not be empty".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if model.name.trim().is_empty() {
                return Err(ArchpromptError::ConfigValidation(
                    "model name must not be empty".to_owned(),
                ));
            }
            if !seen.insert(model.name.as_str()) {
                return Err(ArchpromptError::ConfigValidation(format!(
                    "model '{}' listed more than once",
                    model.name
                )));
            }
            let prices_ok = [model.input_price, model.output_price]
                .iter()
                .all(|p| p.is_finite() && *p >= 0.0);
            if !prices_ok {
                return Err(ArchpromptError::ConfigValidation(format!(
                    "model '{}': prices must be non-negative numbers",
                    model.name
                )));
            }
        }

        if self.find_model(&self.chosen_model).is_none() {
            return Err(ArchpromptError::ConfigValidation(format!(
                "chosen model '{}' is not in the model catalog",
                self.chosen_model
            )));
        }

        if self.max_messages < MIN_TURN_BUDGET {
            return Err(ArchpromptError::ConfigValidation(format!(
                "max_messages must be at least {MIN_TURN_BUDGET}, got {}",
                self.max_messages
            )));
        }

        if self.max_tokens == 0 {
            return Err(ArchpromptError::ConfigValidation(
                "max_tokens must be positive".to_owned(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ArchpromptError::ConfigValidation(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if self.system_prompt.trim().is_empty() {
            return Err(ArchpromptError::ConfigValidation(
                "system prompt must not be empty".to_owned(),
            ));
        }
        if self.user_message.trim().is_empty() {
            return Err(ArchpromptError::ConfigValidation(
                "seed user message must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}
