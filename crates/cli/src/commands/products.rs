use shopwright_checkout::client::{CatalogApi, HttpCatalogApi};
use shopwright_core::classify::classify;
use shopwright_core::config::{AppConfig, LoadOptions};

use crate::commands::{async_runtime, CommandResult};

/// Fetches and prints the demo store's catalog. Requires the store API to
/// be running at `store.base_url`.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "products",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match async_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "products",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let fetched = runtime.block_on(async {
        let catalog = HttpCatalogApi::new(config.store.base_url.clone())?;
        catalog.products().await
    });

    match fetched {
        Ok(products) => {
            let mut lines =
                vec![format!("{} product(s) from {}:", products.len(), config.store.base_url)];
            for product in products {
                lines.push(format!("  {}  {}  ${}", product.id, product.name, product.price));
            }
            let summary = CommandResult::success("products", "catalog fetched");
            CommandResult {
                exit_code: 0,
                output: format!("{}\n{}", lines.join("\n"), summary.output),
            }
        }
        Err(error) => {
            let classified = classify(error.to_string());
            CommandResult::failure("products", classified.kind.as_str(), classified.user_message(), 6)
        }
    }
}
