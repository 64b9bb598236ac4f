use std::path::PathBuf;

use gridblast_engine::{GeneratorConfig, ShapeCatalog};

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DumpConfigArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DumpConfigArg) -> anyhow::Result<()> {
    let DumpConfigArg { output } = arg;
    let catalog = ShapeCatalog::standard()?;
    let config = GeneratorConfig::for_catalog(&catalog);
    util::write_json(&config, output.as_deref())
}
