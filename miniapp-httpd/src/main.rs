use std::process;

use miniapp_httpd as httpd;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = parse_options()?;

    httpd::logger::init().expect("Global logger hasn't already been set");

    tracing::info!("version {}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HEAD"));

    match httpd::run(options).await {
        Ok(()) => {}
        Err(err) => {
            tracing::error!("Fatal: {:#}", err);
            process::exit(1);
        }
    }
    Ok(())
}

/// Parse command-line arguments into HTTP options.
fn parse_options() -> Result<httpd::Options, lexopt::Error> {
    use lexopt::prelude::*;

    let mut parser = lexopt::Parser::from_env();
    let mut options = httpd::Options::default();

    while let Some(arg) = parser.next()? {
        match arg {
            Long("listen") => {
                options.listen = parser.value()?.parse()?;
            }
            Long("storage") => {
                options.backend = parser.value()?.parse()?;
            }
            Long("no-default-address") => {
                options.default_address = false;
            }
            Long("help") | Short('h') => {
                println!(
                    "usage: miniapp-httpd [--listen <addr>] [--storage <blob|memory>] [--no-default-address]"
                );
                process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }
    Ok(options)
}
