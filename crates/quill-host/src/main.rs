use std::path::Path;

use quill_bridge::{Bridge, Keeper};
use quill_host::{init_tracing, load_config, StdioHost, CONFIG_FILE};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = load_config(Path::new(CONFIG_FILE))?;

    let keeper = Keeper::new();
    let mut bridge = Bridge::new(config);
    let mut host = StdioHost::stdio(keeper.handle());
    bridge.register(&mut host, &keeper)?;

    keeper.hold();
    host.join();
    Ok(())
}
