use std::path::PathBuf;

use blockfall_engine::WellConfig;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    util::write_json(&WellConfig::default(), arg.output.as_deref())
}
