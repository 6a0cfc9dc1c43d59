//! `stockdash`: load the product list, log the dashboard, write exports.
//!
//! Usage: `stockdash [KIND...]` where KIND is one of `products`, `stock`,
//! `category`, `value`, `breakdown`. Exports are written only when
//! `STOCKDASH_EXPORT_DIR` is set.

use anyhow::Context;
use chrono::Utc;

use stockdash_dashboard::{Dashboard, DashboardConfig, HttpProductRepository, ReloadOutcome};
use stockdash_reports::ExportKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockdash_observability::init();

    let kinds = std::env::args()
        .skip(1)
        .map(|arg| arg.parse::<ExportKind>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid export kind")?;
    let kinds = if kinds.is_empty() { vec![ExportKind::Products] } else { kinds };

    let config = DashboardConfig::from_env().context("invalid configuration")?;
    let repo = HttpProductRepository::from_config(&config).context("failed to build HTTP client")?;
    tracing::info!(api_url = %repo.base_url(), "using product API");

    let dashboard = Dashboard::from_config(repo, &config);
    let outcome = dashboard.reload().await.context("failed to load products")?;
    if let ReloadOutcome::Applied { count, .. } = outcome {
        tracing::info!(count, "products loaded");
    }

    let summary = dashboard.summary();
    tracing::info!(
        skus = summary.sku_count,
        total_stock = summary.total_stock,
        inventory_value = summary.inventory_value,
        potential_profit = summary.potential_profit,
        margin = summary.margin,
        critical = summary.critical_count,
        "inventory summary"
    );
    for product in dashboard.lowest_stock_items() {
        tracing::warn!(
            product_id = %product.id,
            name = %product.name,
            stock = product.stock,
            reorder_point = product.reorder_point,
            "needs reorder"
        );
    }

    let Some(dir) = config.export_dir.as_ref() else {
        return Ok(());
    };
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let today = Utc::now().date_naive();
    for kind in kinds {
        let artifact = dashboard.export(kind, today)?;
        let path = dir.join(&artifact.filename);
        tokio::fs::write(&path, artifact.content.as_bytes())
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(kind = %kind, path = %path.display(), "export written");
    }

    Ok(())
}
