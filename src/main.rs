use std::env;
use std::process;
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};
use tracing::{error, info};

mod config;
mod extract;
mod input;
mod server;

use config::{BasicAuthConfig, ServerConfig, StorageConfig};
use input::resolver::CACHE_DIR;
use input::Resolver;

fn build_cli() -> Command {
    extract::cli::build_command()
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract tables from PDF files, from the command line or over HTTP")
        .subcommand_negates_reqs(true)
        .subcommand(
            Command::new("serve")
                .about("Run a local HTTP server that maps query parameters to extraction arguments")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .value_parser(clap::value_parser!(u16))
                        .help("Port to listen on. If not given, taken from ENV[\"PORT\"], then 4110"),
                )
                .arg(
                    Arg::new("identity")
                        .short('i')
                        .long("identity")
                        .value_name("STRING")
                        .help("String returned by /echo to identify the server on its port. If not given, taken from ENV[\"IDENTITY\"]"),
                )
                .arg(
                    Arg::new("debug")
                        .short('d')
                        .long("debug")
                        .action(ArgAction::SetTrue)
                        .help("Log response bodies and additional detail"),
                ),
        )
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    if let Some(("serve", serve_matches)) = matches.subcommand() {
        let debug = serve_matches.get_flag("debug");
        init_tracing(debug);

        let port = match config::port_from(serve_matches.get_one::<u16>("port").copied()) {
            Ok(port) => port,
            Err(e) => {
                error!("{e:#}");
                process::exit(1);
            }
        };
        let identity = serve_matches
            .get_one::<String>("identity")
            .cloned()
            .or_else(|| env::var("IDENTITY").ok());

        // Validated once here; resolution attempts later never re-read the
        // environment.
        let storage = match StorageConfig::from_env() {
            Ok(storage) => Some(storage),
            Err(e) => {
                info!("object storage inputs disabled: {e}");
                None
            }
        };
        let basic_auth = BasicAuthConfig::from_env();
        if basic_auth.is_some() {
            info!("basic authentication enabled");
        }

        let server_config = ServerConfig {
            port,
            identity,
            debug,
            basic_auth,
        };
        let resolver = Arc::new(Resolver::new(CACHE_DIR, storage));

        if let Err(e) = server::app::serve(server_config, resolver).await {
            error!("failed to start server: {e:#}");
            process::exit(1);
        }
    } else {
        init_tracing(false);

        let options = match extract::cli::ExtractOptions::from_matches(&matches) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        };
        let resolver = Resolver::new(CACHE_DIR, StorageConfig::from_env().ok());

        match extract::cli::run(&resolver, &options).await {
            Ok(output) => match &options.outfile {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, output) {
                        eprintln!("Error: {e}");
                        process::exit(1);
                    }
                }
                None => print!("{output}"),
            },
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
