//! Defines the configuration settings for the lead-scout application.

use crate::categories::default_categories;
use crate::places::DEFAULT_PLACES_BASE_URL;
use crate::router::PartitionGranularity;
use crate::scorer::ScoreWeights;
use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (TOML format)
    #[arg(long, global = true, env = "LEAD_SCOUT_CONFIG")]
    pub config_file: Option<String>,

    /// API key for the structured places search (scraping fallback is used without one)
    #[arg(long, global = true, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    pub places_api_key: Option<String>,

    /// Directory holding one JSON-lines file per partition
    #[arg(long, global = true, env = "LEAD_SCOUT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Delay between candidates and detail look-ups (seconds)
    #[arg(long, global = true, env = "LEAD_SCOUT_DELAY_BETWEEN_REQUESTS")]
    pub delay_between_requests: Option<f32>,

    /// Delay between categories (seconds)
    #[arg(long, global = true, env = "LEAD_SCOUT_DELAY_BETWEEN_SEARCHES")]
    pub delay_between_searches: Option<f32>,

    /// Maximum candidates taken per category
    #[arg(long, global = true, env = "LEAD_SCOUT_MAX_RESULTS")]
    pub max_results: Option<usize>,

    /// Session limit for long-running mode (hours)
    #[arg(long, global = true, env = "LEAD_SCOUT_MAX_HOURS")]
    pub max_hours: Option<f32>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "LEAD_SCOUT_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// User agent string for HTTP requests
    #[arg(long, global = true, env = "LEAD_SCOUT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// How leads are split into partitions
    #[arg(long, global = true, value_enum, env = "LEAD_SCOUT_PARTITION_BY")]
    pub partition_by: Option<PartitionGranularity>,
}

/// TOML Configuration file structure
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    network: Option<NetworkConfig>,
    search: Option<SearchConfig>,
    pacing: Option<PacingConfig>,
    scoring: Option<ScoringConfig>,
    storage: Option<StorageConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct NetworkConfig {
    request_timeout: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct SearchConfig {
    places_api_key: Option<String>,
    places_base_url: Option<String>,
    max_results_per_category: Option<usize>,
    excluded_terms: Option<Vec<String>>,
    default_categories: Option<Vec<String>>,
    scrape_fallback: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct PacingConfig {
    delay_between_requests: Option<f32>,
    delay_between_searches: Option<f32>,
    jitter: Option<f32>,
    max_session_hours: Option<f32>,
}

#[derive(Deserialize, Debug, Default)]
struct ScoringConfig {
    weights: Option<ScoreWeights>,
}

#[derive(Deserialize, Debug, Default)]
struct StorageConfig {
    data_dir: Option<PathBuf>,
    partition_by: Option<PartitionGranularity>,
    lead_channel_capacity: Option<usize>,
}

/// Application configuration settings.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Timeout for individual HTTP requests.
    pub request_timeout: Duration,
    /// User agent string to use for HTTP requests.
    pub user_agent: String,
    /// Key for the structured search API; `None` means fallback only.
    pub places_api_key: Option<String>,
    pub places_base_url: String,
    /// Whether the maps-page scraper may stand in for the structured API.
    pub scrape_fallback: bool,
    pub max_results_per_category: usize,
    /// Block-list matched case-insensitively against names and websites.
    pub excluded_terms: Vec<String>,
    /// Categories used when a run names none.
    pub default_categories: Vec<String>,
    /// Pause between candidates and between detail look-ups.
    pub delay_between_requests: Duration,
    /// Pause between categories.
    pub delay_between_searches: Duration,
    /// Upper bound of the random extra added to each pause.
    pub pacing_jitter: Duration,
    /// Session limit applied to long-running runs.
    pub max_session: Duration,
    pub score_weights: ScoreWeights,
    pub data_dir: PathBuf,
    pub partition_by: PartitionGranularity,
    /// Capacity of the lead notification channel.
    pub lead_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let excluded_terms = [
            "job portal",
            "job board",
            "recruitment",
            "government",
            "municipal",
            "franchise",
            "chain",
            "aggregator",
            "directory",
            "justdial",
            "yelp",
        ];

        Config {
            request_timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36".to_string(),
            places_api_key: None,
            places_base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            scrape_fallback: true,
            max_results_per_category: 50,
            excluded_terms: excluded_terms.iter().map(|s| s.to_string()).collect(),
            default_categories: default_categories(),
            delay_between_requests: Duration::from_secs(3),
            delay_between_searches: Duration::from_secs(5),
            pacing_jitter: Duration::ZERO,
            max_session: Duration::from_secs(24 * 3600),
            score_weights: ScoreWeights {
                has_phone: 10,
                has_email: 8,
                has_address: 5,
                low_rating: 15,
                medium_rating: 10,
                few_reviews: 8,
                outdated_platform: 12,
                no_online_booking: 15,
                no_https: 10,
                weak_website: 10,
            },
            data_dir: PathBuf::from("leads"),
            partition_by: PartitionGranularity::Country,
            lead_channel_capacity: 100,
        }
    }
}

/// `base` plus a random share of `jitter`.
pub(crate) fn pacing_delay(base: Duration, jitter: Duration) -> Duration {
    use rand::Rng;
    if jitter.is_zero() {
        return base;
    }
    let extra = rand::thread_rng().gen_range(0.0..jitter.as_secs_f32());
    base.saturating_add(secs(extra))
}

/// Negative and NaN values become zero; values too large for a `Duration` saturate.
fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Load configuration from a TOML file
fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(network) = &file_config.network {
        if let Some(timeout) = network.request_timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(user_agent) = &network.user_agent {
            config.user_agent = user_agent.clone();
        }
    }

    if let Some(search) = &file_config.search {
        if let Some(key) = &search.places_api_key {
            config.places_api_key = Some(key.clone());
        }
        if let Some(base_url) = &search.places_base_url {
            config.places_base_url = base_url.clone();
        }
        if let Some(max_results) = search.max_results_per_category {
            config.max_results_per_category = max_results;
        }
        if let Some(terms) = &search.excluded_terms {
            config.excluded_terms = terms.clone();
        }
        if let Some(categories) = &search.default_categories {
            config.default_categories = categories.clone();
        }
        if let Some(fallback) = search.scrape_fallback {
            config.scrape_fallback = fallback;
        }
    }

    if let Some(pacing) = &file_config.pacing {
        if let Some(delay) = pacing.delay_between_requests {
            config.delay_between_requests = secs(delay);
        }
        if let Some(delay) = pacing.delay_between_searches {
            config.delay_between_searches = secs(delay);
        }
        if let Some(jitter) = pacing.jitter {
            config.pacing_jitter = secs(jitter);
        }
        if let Some(hours) = pacing.max_session_hours {
            config.max_session = secs(hours * 3600.0);
        }
    }

    if let Some(weights) = file_config.scoring.as_ref().and_then(|s| s.weights) {
        config.score_weights = weights;
    }

    if let Some(storage) = &file_config.storage {
        if let Some(dir) = &storage.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(partition_by) = storage.partition_by {
            config.partition_by = partition_by;
        }
        if let Some(capacity) = storage.lead_channel_capacity {
            config.lead_channel_capacity = capacity;
        }
    }
}

/// Apply command line arguments to the Config instance
fn apply_cli_args(config: &mut Config, args: &ConfigArgs) {
    if let Some(ref key) = args.places_api_key {
        config.places_api_key = Some(key.clone());
    }

    if let Some(ref dir) = args.data_dir {
        config.data_dir = dir.clone();
    }

    if let Some(delay) = args.delay_between_requests {
        config.delay_between_requests = secs(delay);
    }

    if let Some(delay) = args.delay_between_searches {
        config.delay_between_searches = secs(delay);
    }

    if let Some(max_results) = args.max_results {
        config.max_results_per_category = max_results;
    }

    if let Some(hours) = args.max_hours {
        config.max_session = secs(hours * 3600.0);
    }

    if let Some(timeout) = args.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }

    if let Some(ref agent) = args.user_agent {
        config.user_agent = agent.clone();
    }

    if let Some(partition_by) = args.partition_by {
        config.partition_by = partition_by;
    }
}

fn validate_config(config: &mut Config) -> anyhow::Result<()> {
    if config
        .places_api_key
        .as_deref()
        .is_some_and(|key| key.trim().is_empty())
    {
        config.places_api_key = None;
        tracing::warn!("Places API key was blank. Treating it as not configured.");
    }

    if config.max_results_per_category == 0 {
        config.max_results_per_category = 1;
        tracing::warn!("Max results per category was set to 0. Setting to 1.");
    }

    if config.lead_channel_capacity == 0 {
        config.lead_channel_capacity = 1;
        tracing::warn!("Lead channel capacity was set to 0. Setting to 1.");
    }

    config
        .default_categories
        .retain(|category| !category.trim().is_empty());
    if config.default_categories.is_empty() {
        config.default_categories = default_categories();
        tracing::warn!("Default category list was empty. Using the built-in list.");
    }

    config.excluded_terms = config
        .excluded_terms
        .iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect();

    if config.request_timeout.is_zero() {
        anyhow::bail!("Request timeout must be greater than zero");
    }

    if config.places_api_key.is_none() && !config.scrape_fallback {
        tracing::warn!("No Places API key and scraping fallback disabled: runs will be rejected.");
    }

    Ok(())
}

pub(crate) fn build_config(args: &ConfigArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        let file_config = load_config_file(file_path)?;
        apply_file_config(&mut config, &file_config);
    } else {
        for path in ["./lead-scout.toml", "./config.toml"].iter() {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);

    validate_config(&mut config)?;

    tracing::debug!("Final configuration: {:?}", config);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(toml_text: &str) -> ConfigFile {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_results_per_category, 50);
        assert_eq!(config.delay_between_requests, Duration::from_secs(3));
        assert_eq!(config.delay_between_searches, Duration::from_secs(5));
        assert_eq!(config.max_session, Duration::from_secs(24 * 3600));
        assert_eq!(config.score_weights.no_online_booking, 15);
        assert!(config.excluded_terms.contains(&"justdial".to_string()));
        assert!(!config.default_categories.is_empty());
    }

    #[test]
    fn test_file_sections_override_defaults() {
        let file = parse(
            r#"
            [network]
            request_timeout = 4

            [search]
            places_api_key = "file-key"
            max_results_per_category = 5
            default_categories = ["gym", "bakery"]

            [pacing]
            delay_between_requests = 0.5
            max_session_hours = 2

            [scoring.weights]
            has_phone = 20
            no_https = 1

            [storage]
            data_dir = "/tmp/leads"
            partition_by = "country-city"
            "#,
        );
        let mut config = Config::default();
        apply_file_config(&mut config, &file);

        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.places_api_key.as_deref(), Some("file-key"));
        assert_eq!(config.max_results_per_category, 5);
        assert_eq!(config.default_categories, vec!["gym", "bakery"]);
        assert_eq!(config.delay_between_requests, Duration::from_millis(500));
        assert_eq!(config.max_session, Duration::from_secs(7200));
        assert_eq!(config.score_weights.has_phone, 20);
        assert_eq!(config.score_weights.no_https, 1);
        assert_eq!(config.score_weights.has_email, 0);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/leads"));
        assert_eq!(config.partition_by, PartitionGranularity::CountryCity);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::default();
        apply_file_config(
            &mut config,
            &parse("[search]\nplaces_api_key = \"file-key\"\nmax_results_per_category = 5\n"),
        );
        let args = ConfigArgs {
            places_api_key: Some("cli-key".to_string()),
            max_results: Some(7),
            partition_by: Some(PartitionGranularity::CountryCity),
            ..ConfigArgs::default()
        };
        apply_cli_args(&mut config, &args);

        assert_eq!(config.places_api_key.as_deref(), Some("cli-key"));
        assert_eq!(config.max_results_per_category, 7);
        assert_eq!(config.partition_by, PartitionGranularity::CountryCity);
    }

    #[test]
    fn test_validate_repairs_values() {
        let mut config = Config {
            places_api_key: Some("  ".to_string()),
            max_results_per_category: 0,
            lead_channel_capacity: 0,
            default_categories: vec![" ".to_string()],
            excluded_terms: vec![" Chain ".to_string(), String::new()],
            ..Config::default()
        };
        validate_config(&mut config).unwrap();

        assert_eq!(config.places_api_key, None);
        assert_eq!(config.max_results_per_category, 1);
        assert_eq!(config.lead_channel_capacity, 1);
        assert_eq!(config.default_categories, default_categories());
        assert_eq!(config.excluded_terms, vec!["chain"]);
    }

    #[test]
    fn test_out_of_range_seconds_do_not_panic() {
        assert_eq!(secs(-3.0), Duration::ZERO);
        assert_eq!(secs(f32::NAN), Duration::ZERO);
        assert_eq!(secs(f32::INFINITY), Duration::MAX);
        assert_eq!(secs(1.5), Duration::from_millis(1500));
        assert_eq!(pacing_delay(Duration::MAX, Duration::from_secs(1)), Duration::MAX);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config {
            request_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }

    #[test]
    fn test_build_config_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pacing]\ndelay_between_searches = 1\njitter = 0.5").unwrap();
        let args = ConfigArgs {
            config_file: Some(file.path().to_string_lossy().into_owned()),
            ..ConfigArgs::default()
        };

        let config = build_config(&args).unwrap();
        assert_eq!(config.delay_between_searches, Duration::from_secs(1));
        assert_eq!(config.pacing_jitter, Duration::from_millis(500));

        let delay = pacing_delay(Duration::from_secs(1), config.pacing_jitter);
        assert!(delay >= Duration::from_secs(1));
        assert!(delay < Duration::from_millis(1500));
    }

    #[test]
    fn test_pacing_delay_without_jitter() {
        let config = Config::default();
        assert_eq!(
            pacing_delay(Duration::from_secs(3), config.pacing_jitter),
            Duration::from_secs(3)
        );
    }
}
