use crate::cli::commands::InitArgs;
use crate::io::store_io;

/// Create `.smartdo/` under the current (or `-C`) directory.
pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = super::start_dir()?;
    let store_dir = store_io::init_store(&root, args.force)?;
    println!("Initialized smartdo store in {}", store_dir.display());
    Ok(())
}
