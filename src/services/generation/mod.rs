// Generation module
// Provider contract, fallback orchestration and per-run statistics

pub mod orchestrator;
pub mod provider;
pub mod stats;

pub use orchestrator::{AssetGenerator, GenerationJob};
pub use provider::{
    AssetProvider, GeneratedAsset, ProviderFailure, ProviderHealth, ProviderResult,
};
pub use stats::{GenerationStats, StatsSnapshot};

/// Ordered provider names: primary first, then fallbacks, without duplicates
pub fn provider_chain(primary: &str, fallbacks: &[String]) -> Vec<String> {
    let mut chain: Vec<String> = Vec::with_capacity(fallbacks.len() + 1);
    for name in std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)) {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !chain.contains(&name) {
            chain.push(name);
        }
    }
    chain
}
