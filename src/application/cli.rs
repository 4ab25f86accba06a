#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::application::ui::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ProviderName;
use crate::domain::models::AVAILABLE_MODELS;

/// What the process should run once the command line has been handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Chat,
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn format_models() -> String {
    let current = Config::get(ConfigKey::ChatModel);
    return AVAILABLE_MODELS
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            let mut line = format!("{}. {} ({})", idx + 1, model.name, model.id);
            if model.id == current {
                line = format!("{line} [default]");
            }
            return line;
        })
        .collect::<Vec<String>>()
        .join("\n");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn arg_global(key: ConfigKey, env_name: &'static str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("streamchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("serve").about("Run the chat relay server."))
        .subcommand(Command::new("chat").about("Start a new chat session against a relay server. This is the default command."))
        .subcommand(Command::new("models").about("List the models a chat session can select."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(
            arg_global(
                ConfigKey::ConfigFile,
                "STREAMCHAT_CONFIG_FILE",
                format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)),
            )
            .short('c'),
        )
        .arg(
            arg_global(
                ConfigKey::Listen,
                "STREAMCHAT_LISTEN",
                format!("Address the relay server listens on. [default: {}]", Config::default(ConfigKey::Listen)),
            )
            .short('l'),
        )
        .arg(
            arg_global(
                ConfigKey::Provider,
                "STREAMCHAT_PROVIDER",
                format!("Completion provider the relay forwards requests to. [default: {}]", Config::default(ConfigKey::Provider)),
            )
            .short('p')
            .value_parser(PossibleValuesParser::new(ProviderName::VARIANTS)),
        )
        .arg(arg_global(
            ConfigKey::Model,
            "STREAMCHAT_MODEL",
            format!("Model the relay uses when a request does not name one. [default: {}]", Config::default(ConfigKey::Model)),
        ))
        .arg(arg_global(
            ConfigKey::MaxDuration,
            "STREAMCHAT_MAX_DURATION",
            format!("Maximum time in seconds a single response may stream before it is stopped. [default: {}]", Config::default(ConfigKey::MaxDuration)),
        ))
        .arg(
            arg_global(
                ConfigKey::ValidateModel,
                "STREAMCHAT_VALIDATE_MODEL",
                format!("Reject requests for models outside the known model list. [default: {}]", Config::default(ConfigKey::ValidateModel)),
            )
            .value_parser(PossibleValuesParser::new(["true", "false"])),
        )
        .arg(arg_global(
            ConfigKey::HealthCheckTimeout,
            "STREAMCHAT_HEALTH_CHECK_TIMEOUT",
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a provider. [default: {}]", Config::default(ConfigKey::HealthCheckTimeout)),
        ))
        .arg(arg_global(
            ConfigKey::OpenAiURL,
            "STREAMCHAT_OPENAI_URL",
            format!("OpenAI compatible API URL when using the OpenAI provider. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::OpenAiURL)),
        ))
        .arg(arg_global(
            ConfigKey::OpenAiToken,
            "STREAMCHAT_OPENAI_TOKEN",
            "OpenAI compatible API token when using the OpenAI provider.".to_string(),
        ))
        .arg(arg_global(
            ConfigKey::GeminiURL,
            "STREAMCHAT_GEMINI_URL",
            format!("Google Gemini API URL when using the Gemini provider. [default: {}]", Config::default(ConfigKey::GeminiURL)),
        ))
        .arg(arg_global(
            ConfigKey::GeminiToken,
            "STREAMCHAT_GEMINI_TOKEN",
            "Google Gemini API token when using the Gemini provider.".to_string(),
        ))
        .arg(arg_global(
            ConfigKey::ServerURL,
            "STREAMCHAT_SERVER_URL",
            format!("Relay server URL a chat session sends requests to. [default: {}]", Config::default(ConfigKey::ServerURL)),
        ))
        .arg(
            arg_global(
                ConfigKey::ChatModel,
                "STREAMCHAT_CHAT_MODEL",
                format!("The initial model a chat session selects. [default: {}]", Config::default(ConfigKey::ChatModel)),
            )
            .value_parser(PossibleValuesParser::new(
                AVAILABLE_MODELS.iter().map(|model| return model.id),
            )),
        );
}

pub async fn parse() -> Result<Option<Mode>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("serve", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Mode::Serve));
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("models", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            println!("{}", format_models());
            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Some(Mode::Chat));
}
