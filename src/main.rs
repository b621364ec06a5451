use std::process;
use std::time::Duration;

use chrono::{Local, Utc};
use clap::{crate_name, crate_version, value_t, App, Arg};
use log::{error, info, Level};

use ntptime::{NtpClient, DEFAULT_PORT};

const DEFAULT_SERVER: &str = "time.apple.com";

fn main() {
    let default_port = DEFAULT_PORT.to_string();
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about("Asks an NTP server for the current time")
        .arg(
            Arg::with_name("server")
                .short("s")
                .long("server")
                .takes_value(true)
                .default_value(DEFAULT_SERVER)
                .help("NTP server host name or address"),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .takes_value(true)
                .default_value(&default_port)
                .help("NTP server port"),
        )
        .arg(
            Arg::with_name("timeout")
                .short("t")
                .long("timeout")
                .takes_value(true)
                .default_value("5")
                .help("Seconds to wait for the response (0 means the default)"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increases logging verbosity"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => Level::Info,
        1 => Level::Debug,
        _ => Level::Trace,
    };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("unable to initialize logger: {}", e);
    }

    let timeout = value_t!(matches, "timeout", u64).unwrap_or_else(|e| e.exit());
    let server = matches.value_of("server").unwrap_or(DEFAULT_SERVER);
    let port = matches.value_of("port").unwrap_or(default_port.as_str());

    let client = NtpClient::new(server, port, Duration::from_secs(timeout));

    info!("Local time: {}", Local::now());
    match client.get_time() {
        Ok(time) => {
            let local = Utc::now();
            info!("NTP time: {}", time);
            if let Some(server_time) = time.datetime() {
                let diff = server_time.signed_duration_since(local);
                info!("Difference: {} ms", diff.num_milliseconds());
            }
        }
        Err(e) => {
            error!("query to {} failed: {}", client.address(), e);
            process::exit(1);
        }
    }
}
