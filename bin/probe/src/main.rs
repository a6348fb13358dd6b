use b2b_storefront_access::{FeatureFlagDeriver, Resolver, SessionStore};
use b2b_storefront_probe::{
    ProbeReport,
    config::ProbeConfig,
    identity::{EnvCredentialSource, HttpIdentityProvider},
    portal::portal_routes,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from environment
    let config = ProbeConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        identity_base_url = %config.identity_base_url,
        token_variable = %config.access_token_var,
        "Loaded configuration"
    );

    let provider = HttpIdentityProvider::new(&config.identity_base_url)
        .expect("failed to create identity provider");
    let credentials = EnvCredentialSource::new(config.access_token_var.clone());
    let resolver = Resolver::standard(Arc::new(credentials), Arc::new(provider), &config.access);

    let store = SessionStore::new(resolver);
    let flags = FeatureFlagDeriver::attach(&store, config.access.base_flags);

    let state = store.initialize().await;
    tracing::info!(
        authenticated = state.is_authenticated(),
        source = ?state.source(),
        "Resolved visitor"
    );

    let report = ProbeReport::collect(&store, &flags, &portal_routes());
    let json = serde_json::to_string_pretty(&report).expect("failed to serialize report");
    println!("{json}");
}
