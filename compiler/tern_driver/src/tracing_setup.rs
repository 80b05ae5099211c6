use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{registry, EnvFilter};
use tracing_tree::HierarchicalLayer;

use crate::DebugStages;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for the enabled stages.
///
/// `RUST_LOG` wins when set. Otherwise each enabled stage turns on its
/// crate's events; with no stages and no `RUST_LOG` nothing is installed.
/// Safe to call multiple times; only the first call has any effect.
pub fn init_tracing(stages: DebugStages) {
    TRACING_INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if stages.is_empty() {
            return;
        } else {
            EnvFilter::new(stage_directives(stages))
        };
        // Another subscriber may already be installed by an embedding tool.
        let _ = registry()
            .with(
                HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true),
            )
            .with(filter)
            .try_init();
    });
}

/// `EnvFilter` directives for `stages`, e.g. `tern_lower=trace`.
pub fn stage_directives(stages: DebugStages) -> String {
    let mut directives = vec!["warn".to_owned()];
    if stages.intersects(DebugStages::FRONTEND) {
        directives.push("tern_driver=debug".to_owned());
    }
    if stages.contains(DebugStages::LOWER) {
        directives.push("tern_lower=trace".to_owned());
    }
    if stages.contains(DebugStages::SERIALIZE) {
        directives.push("tern_vir=trace".to_owned());
    }
    directives.join(",")
}
