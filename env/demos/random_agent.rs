//! Uniformly random masked agent against a local Showdown server
//!
//! Start a server with `node pokemon-showdown start --no-security`, then run
//! `cargo run --example random_agent -- [config.toml] [episodes]`.

use rand::seq::IteratorRandom;
use sdgym_env::{EnvConfig, ShowdownEnv, WsConnector, evaluate};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EnvConfig::load(&path)?,
        None => EnvConfig::default(),
    };
    let episodes: usize = args.next().map(|n| n.parse()).transpose()?.unwrap_or(5);

    tracing::info!(server = %config.server_url, format = %config.format, episodes, "starting random agent");
    let connector = WsConnector::new(config.server_url.clone());
    let mut env = ShowdownEnv::new(config, connector)?;
    tracing::info!(
        observation = ?env.observation_space().shape,
        actions = env.action_space().n,
        "spaces"
    );

    let mut rng = rand::thread_rng();
    let summary = evaluate(&mut env, episodes, |_, mask| {
        mask.iter()
            .enumerate()
            .filter(|&(_, &legal)| legal)
            .map(|(index, _)| index)
            .choose(&mut rng)
            .unwrap_or(0)
    })?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
