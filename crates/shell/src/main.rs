//! `navshell` command line entry point.
//!
//! Loads the menu forest from the configured source, then reconciles every
//! location given as an argument and prints one JSON line per location.

use anyhow::{Context, bail};
use serde_json::json;

use navshell_shell::{
    FileMenuSource, MenuSource, MenuSourceConfig, NavigationShell, RefreshOutcome, ShellConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    navshell_observability::init();

    let config = ShellConfig::from_env().context("invalid navshell configuration")?;
    let source = build_source(&config)?;
    let persistence = config.persistence()?;
    tracing::info!(app_base = %config.app_base, storage = ?persistence.dir(), "starting navshell");

    let mut shell = NavigationShell::from_config(persistence, &config);
    let report = shell.refresh(source.as_ref()).await;
    if let RefreshOutcome::Failed(err) = report.refresh {
        bail!("failed to load menu forest: {err}");
    }

    for href in std::env::args().skip(1) {
        let outcome = shell.on_location_change(&href);
        let line = json!({
            "location": href,
            "outcome": outcome,
            "selection": shell.selection(),
        });
        println!("{line}");
    }

    Ok(())
}

fn build_source(config: &ShellConfig) -> anyhow::Result<Box<dyn MenuSource>> {
    match &config.source {
        Some(MenuSourceConfig::File(path)) => Ok(Box::new(FileMenuSource::new(path.clone()))),
        #[cfg(feature = "http")]
        Some(MenuSourceConfig::Http { url, token }) => {
            let source = match token {
                Some(token) => {
                    navshell_shell::HttpMenuSource::with_token(url.clone(), token.clone())
                }
                None => navshell_shell::HttpMenuSource::new(url.clone()),
            };
            Ok(Box::new(source))
        }
        #[cfg(not(feature = "http"))]
        Some(MenuSourceConfig::Http { .. }) => {
            bail!("menu URL configured but navshell was built without the `http` feature")
        }
        None => bail!("set NAVSHELL_MENU_FILE or NAVSHELL_MENU_URL"),
    }
}
