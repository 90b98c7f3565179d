
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;
use std::time::Duration;

use super::{Config, ConfigError, OllamaConfig, RemoteIndexConfig, ServerConfig};
use crate::store::RemoteIndexClient;

const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 PDF RAG Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("Server").bold().yellow());
    configure_server(&mut config.server)?;

    eprintln!();
    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure your local Ollama instance for embedding generation.");
    eprintln!();
    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Remote Vector Index").bold().yellow());
    eprintln!("When the index is unreachable at startup the local JSON store is used instead.");
    eprintln!();
    configure_remote_index(&mut config.remote_index)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before uploading documents.");
    }

    if config.remote_index.enabled {
        if test_remote_index_connection(&config.remote_index) {
            eprintln!("{}", style("✓ Remote index reachable!").green());
        } else {
            eprintln!(
                "{}",
                style("⚠ Warning: Remote index unreachable, the local store will be used").yellow()
            );
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.server.host).cyan());
    eprintln!("  Port: {}", style(config.server.port).cyan());
    eprintln!(
        "  Max Upload: {} bytes",
        style(config.server.max_upload_bytes).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    match config.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!(
        "  Embedding Dimension: {}",
        style(config.ollama.embedding_dimension).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Remote Index Settings:").bold().yellow());
    eprintln!("  Enabled: {}", style(config.remote_index.enabled).cyan());
    eprintln!("  URL: {}", style(&config.remote_index.url).cyan());
    eprintln!("  Index: {}", style(&config.remote_index.index_name).cyan());
    eprintln!("  Precision: {}", style(&config.remote_index.precision).cyan());
    eprintln!(
        "  API Token: {}",
        style(if config.remote_index.api_token.is_some() {
            "set"
        } else {
            "not set"
        })
        .cyan()
    );

    eprintln!();
    eprintln!("{}", style("Storage Settings:").bold().yellow());
    eprintln!(
        "  Local Store: {}",
        style(config.local_store_path().display()).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    if !config_dir.join("config.toml").exists() {
        eprintln!(
            "{}",
            style("No existing configuration found. Using defaults.").yellow()
        );
        return Ok(Config {
            base_dir: config_dir.to_path_buf(),
            ..Config::default()
        });
    }

    let config = Config::load(config_dir).context("Failed to load existing configuration")?;
    eprintln!("{}", style("Found existing configuration.").green());
    Ok(config)
}

fn configure_server(server: &mut ServerConfig) -> Result<()> {
    let port: u16 = Input::new()
        .with_prompt("HTTP port")
        .default(server.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    server.port = port;
    server.validate()?;
    Ok(())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(ollama.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;
    ollama.set_embedding_dimension(dimension)?;

    Ok(())
}

fn configure_remote_index(remote: &mut RemoteIndexConfig) -> Result<()> {
    remote.enabled = Confirm::new()
        .with_prompt("Use a remote vector index?")
        .default(remote.enabled)
        .interact()?;

    if !remote.enabled {
        return Ok(());
    }

    let url: String = Input::new()
        .with_prompt("Remote index URL")
        .default(remote.url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = RemoteIndexConfig {
                url: input.clone(),
                ..RemoteIndexConfig::default()
            };
            temp_config.base_url()?;
            Ok(())
        })
        .interact_text()?;

    let index_name: String = Input::new()
        .with_prompt("Index name")
        .default(remote.index_name.clone())
        .interact_text()?;

    remote.set_url(url)?;
    remote.set_index_name(index_name)?;

    Ok(())
}

fn connection_test_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(CONNECTION_TEST_TIMEOUT))
        .build()
        .into()
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    let url = format!(
        "{}://{}:{}/api/version",
        ollama.protocol, ollama.host, ollama.port
    );

    match connection_test_agent().get(&url).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) => (400..500).contains(&code),
        Err(_) => false,
    }
}

fn test_remote_index_connection(remote: &RemoteIndexConfig) -> bool {
    RemoteIndexClient::new(remote)
        .and_then(|client| client.probe())
        .is_ok()
}
