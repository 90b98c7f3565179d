use clap::{Parser, Subcommand};
use pdf_rag::commands::{ask_question, ingest_files, serve_http, show_status};
use pdf_rag::config::{get_config_dir, run_interactive_config, show_config};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-rag")]
#[command(about = "Answer questions from uploaded PDF documents")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the local vector store
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the server, Ollama and the remote index
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the HTTP service
    Serve {
        /// Address to listen on, overriding the configured host
        #[arg(long)]
        host: Option<IpAddr>,
        /// Port to listen on, overriding the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ingest PDF files without going through the HTTP service
    Ingest {
        /// PDF files to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Answer a question from the ingested documents
    Ask {
        question: String,
    },
    /// Show configuration and backend connectivity
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Serve { host, port } => {
            serve_http(&config_dir, host, port).await?;
        }
        Commands::Ingest { paths } => {
            ingest_files(&config_dir, &paths).await?;
        }
        Commands::Ask { question } => {
            ask_question(&config_dir, &question).await?;
        }
        Commands::Status => {
            show_status(&config_dir).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn serve_defaults_to_configured_address() {
        let cli = Cli::try_parse_from(["pdf-rag", "serve"]).expect("parses");

        assert!(cli.config_dir.is_none());
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: None
            }
        ));
    }

    #[test]
    fn serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "pdf-rag", "serve", "--host", "0.0.0.0", "--port", "8000",
        ])
        .expect("parses");

        let Commands::Serve { host, port } = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(host, Some(IpAddr::from([0, 0, 0, 0])));
        assert_eq!(port, Some(8000));
    }

    #[test]
    fn serve_rejects_hostname() {
        let cli = Cli::try_parse_from(["pdf-rag", "serve", "--host", "localhost"]);
        assert!(cli.is_err());
    }

    #[test]
    fn ingest_takes_several_paths() {
        let cli = Cli::try_parse_from(["pdf-rag", "ingest", "a.pdf", "b.pdf"]).expect("parses");

        let Commands::Ingest { paths } = cli.command else {
            panic!("expected ingest command");
        };
        assert_eq!(paths, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
    }

    #[test]
    fn ingest_requires_a_path() {
        let cli = Cli::try_parse_from(["pdf-rag", "ingest"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["pdf-rag", "ask", "What is in the report?"])
            .expect("parses");

        let Commands::Ask { question } = cli.command else {
            panic!("expected ask command");
        };
        assert_eq!(question, "What is in the report?");
    }

    #[test]
    fn global_config_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["pdf-rag", "status", "--config-dir", "/tmp/rag"])
            .expect("parses");

        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/rag")));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["pdf-rag", "config", "--show"]).expect("parses");

        assert!(matches!(cli.command, Commands::Config { show: true }));
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["pdf-rag", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["pdf-rag", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
