//! The two-phase build pipeline.

use tracing::{debug, error};

use crate::bundle::BundleSet;
use crate::{Error, Result};

/// Run every bundle's transform, strictly in order.
///
/// Bundle n+1 starts only after bundle n has settled. Transforms extend the
/// shared loader config, and later bundles must observe what earlier ones
/// wrote, so this phase is never run concurrently. The first failure aborts
/// the remainder of the pipeline.
pub(crate) async fn run_transforms(bundles: &mut BundleSet) -> Result<()> {
    for bundle in bundles.iter_mut() {
        let name = bundle.config().name.clone();
        debug!(bundle = %name, "transforming bundle");
        if let Err(source) = bundle.transform().await {
            error!(bundle = %name, error = %source, "bundle transform failed");
            return Err(Error::TransformFailed {
                bundle: name,
                source: Box::new(source),
            });
        }
    }
    Ok(())
}

/// Move the config-target bundle to the end of the write order.
///
/// The config-bearing bundle serializes the loader config as assembled at
/// its own write time, so every other bundle's contribution has to land
/// first. A config target that names no declared bundle is an error.
pub(crate) fn reorder_for_config_target(bundles: &mut BundleSet, target: &str) -> Result<()> {
    let pos = bundles
        .position(target)
        .ok_or_else(|| Error::ConfigTargetNotFound(target.to_string()))?;
    bundles.shift_to_end(pos);
    debug!(bundle = %target, "config target moved to final write position");
    Ok(())
}
