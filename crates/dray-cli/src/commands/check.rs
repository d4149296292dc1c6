//! `dray check`: validate the configuration and report what it declares.

use dray_config::{ConfigValidator, FsValidator, load_file};

use crate::cli::CheckArgs;
use crate::error::Result;
use crate::{config, ui};

pub async fn execute(args: CheckArgs) -> Result<()> {
    let path = config::resolve_config_path(&args.dir, args.config.as_ref())?;
    let build_config = load_file(&path)?;
    FsValidator::new(&args.dir).validate(&build_config)?;

    ui::success(&format!("{} is valid", path.display()));
    ui::detail("environment", &build_config.environment);
    ui::detail("config target", &build_config.config_target);
    ui::detail(
        "bundles",
        build_config
            .bundles
            .iter()
            .map(|bundle| bundle.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    );
    if !build_config.targets.is_empty() {
        ui::detail(
            "targets",
            build_config
                .targets
                .iter()
                .map(|target| target.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    let stubs: Vec<&str> = build_config
        .plugins
        .iter()
        .filter(|plugin| plugin.stub)
        .map(|plugin| plugin.name.as_str())
        .collect();
    if !stubs.is_empty() {
        ui::detail("stubbed plugins", stubs.join(", "));
    }

    Ok(())
}
