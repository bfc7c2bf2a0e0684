use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use futures::future::join_all;
use hello_core::{GreetingService, HelloService, HelloWorldInput, ServiceConfig};
use hello_store::{MemoryTreeStore, Partition, RegistryKey};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Outcome of one greeting request
#[derive(Debug, Serialize)]
struct GreetReport {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    greeting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    recorded: bool,
}

fn cli() -> Command {
    Command::new("hello")
        .version(hello_core::VERSION)
        .about("Greeting registry driver")
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a TOML service configuration"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("greet")
                .about("Request greetings and wait for them to be recorded")
                .arg(
                    Arg::new("names")
                        .num_args(1..)
                        .required(true)
                        .help("Names to greet"),
                )
                .arg(
                    Arg::new("program")
                        .long("program")
                        .action(ArgAction::Append)
                        .value_name("NAME=GREETING")
                        .help("Program a greeting override before greeting"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("show-config")
                .about("Print the effective configuration as TOML"),
        )
}

fn load_config(matches: &ArgMatches) -> Result<ServiceConfig> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => ServiceConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => ServiceConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &ServiceConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_override(raw: &str) -> Result<(&str, &str)> {
    let Some((name, greeting)) = raw.split_once('=') else {
        bail!("override {raw:?} is not NAME=GREETING");
    };
    Ok((name, greeting))
}

async fn greet(service: &GreetingService, name: &str) -> GreetReport {
    let key = RegistryKey::new(name).ok();
    // Register before asking so a fast write is not missed
    let arrival = key
        .as_ref()
        .map(|key| service.waiter().register(Partition::Operational, key));

    match service.hello_world(HelloWorldInput::new(name)).await {
        Ok(output) => {
            let recorded = match arrival {
                Some(mut arrival) => arrival.wait(service.config().arrival_timeout()).await,
                None => false,
            };
            if !recorded {
                tracing::warn!(name, "greeting was not recorded before the deadline");
            }
            GreetReport {
                name: name.to_owned(),
                greeting: Some(output.greeting),
                error: None,
                recorded,
            }
        }
        Err(error) => GreetReport {
            name: name.to_owned(),
            greeting: None,
            error: Some(error.to_string()),
            recorded: false,
        },
    }
}

async fn run_greet(config: ServiceConfig, args: &ArgMatches) -> Result<bool> {
    let store = Arc::new(MemoryTreeStore::with_config(config.store.clone()));
    let service = GreetingService::start(store, config).await;

    if let Some(overrides) = args.get_many::<String>("program") {
        for raw in overrides {
            let (name, greeting) = parse_override(raw)?;
            service
                .program(name, greeting)
                .await
                .with_context(|| format!("programming greeting for {name:?}"))?;
        }
    }

    let names: Vec<&str> = args
        .get_many::<String>("names")
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    let reports = join_all(names.into_iter().map(|name| greet(&service, name))).await;
    service.shutdown();

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match (&report.greeting, &report.error) {
                (Some(greeting), _) => {
                    let status = if report.recorded { "recorded" } else { "not recorded" };
                    println!("{}: {} ({})", report.name, greeting, status);
                }
                (None, Some(error)) => println!("{}: error: {}", report.name, error),
                (None, None) => println!("{}: no response", report.name),
            }
        }
    }

    Ok(reports.iter().all(|report| report.error.is_none()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_tracing(&config, matches.get_flag("log-json"));

    let ok = dispatch(config, &matches).await?;
    std::process::exit(if ok { 0 } else { 1 });
}

/// Run the selected subcommand; `false` means some request failed
async fn dispatch(config: ServiceConfig, matches: &ArgMatches) -> Result<bool> {
    match matches.subcommand() {
        Some(("greet", args)) => run_greet(config, args).await,
        Some(("show-config", _)) => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(true)
        }
        Some((other, _)) => bail!("unknown subcommand {other:?}"),
        None => bail!("no subcommand given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parse_override_splits_on_first_equals() {
        assert_eq!(parse_override("Jesus=Hola Jesus").unwrap(), ("Jesus", "Hola Jesus"));
        assert_eq!(parse_override("a=b=c").unwrap(), ("a", "b=c"));
        assert!(parse_override("no-separator").is_err());
    }

    #[test]
    fn greet_accepts_repeated_overrides() {
        let matches = cli()
            .try_get_matches_from([
                "hello", "greet", "Ana", "Jesus", "--program", "Jesus=Hola Jesus", "--program",
                "Ana=Oi Ana", "--json",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_many::<String>("program").unwrap().count(), 2);
        assert!(args.get_flag("json"));
    }

    #[tokio::test]
    async fn missing_subcommand_is_an_error() {
        let matches = cli()
            .subcommand_required(false)
            .arg_required_else_help(false)
            .try_get_matches_from(["hello"])
            .unwrap();
        let err = dispatch(ServiceConfig::default(), &matches).await.unwrap_err();
        assert!(err.to_string().contains("no subcommand"));
    }

    #[tokio::test]
    async fn show_config_succeeds() {
        let matches = cli().try_get_matches_from(["hello", "show-config"]).unwrap();
        assert!(dispatch(ServiceConfig::default(), &matches).await.unwrap());
    }

    #[tokio::test]
    async fn greet_reports_recorded_greeting() {
        let store = Arc::new(MemoryTreeStore::new());
        let service = GreetingService::start(store, ServiceConfig::default()).await;

        let report = greet(&service, "Sebastian").await;
        assert_eq!(report.greeting.as_deref(), Some("Hello Sebastian"));
        assert!(report.recorded);

        let report = greet(&service, "").await;
        assert!(report.error.is_some());
        assert!(!report.recorded);
    }
}
