use clap::Parser;
use log::info;
use srcon::{Client, Config};
use std::{error::Error, io::Write, time::Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server host name or address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server rcon port
    #[arg(short, long, default_value = "27015")]
    port: u16,

    /// Rcon password
    #[arg(long, env = "RCON_PASSWORD")]
    password: String,

    /// Connect and read timeout in seconds
    #[arg(short, long, default_value = "10")]
    timeout: u64,

    /// Commands to run, in order
    #[arg(default_value = "players")]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let args = Args::parse();
    let config = Config::new(args.host, args.port, args.password)
        .with_timeout(Duration::from_secs(args.timeout));

    let mut client = Client::open(config).await?;

    let mut result = Ok(());
    for command in &args.commands {
        match client.command(command).await {
            Ok(response) => println!("{}", response.body()),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    client.close().await;
    info!("bye");
    Ok(result?)
}
