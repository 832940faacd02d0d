use std::sync::Arc;

use mailsink::{config::Config, listener::Server, logging, notify::SlackClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(token) = args.next() else {
        eprintln!("Usage: mailsink <slack-token>");
        std::process::exit(2);
    };

    logging::init();

    let config = Config::load()?;
    let notifier = SlackClient::new(token)?;

    Server::new(config, Arc::new(notifier)).run().await
}
