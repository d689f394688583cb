use std::path::Path;

use boaprog_elf_loader::ElfFile;

use super::{jump_call::jump, write::write};
use crate::config::BootloaderConfig;
use crate::error::OperationError;
use crate::serial::SerialChannel;
use crate::transport::Transport;

/// Load every `PT_LOAD` segment of the ELF at `path` onto the device, and
/// jump to its entry point if `run` is set (spec.md §4.5 `upload_elf`).
pub fn upload_elf<S: SerialChannel>(
    transport: &mut Transport<S>,
    config: &BootloaderConfig,
    path: impl AsRef<Path>,
    run: bool,
) -> Result<(), OperationError> {
    let file = ElfFile::open(path)?;
    let instance = file.load()?;

    for segment in instance.segments() {
        write(transport, config, segment.vaddr, &segment.bytes)?;
    }

    if run {
        jump(transport, instance.entrypoint())?;
    }

    let entry = instance.entrypoint();
    instance.close_instance();
    file.close_file();
    log::info!("upload complete, entry={entry:#x}, ran={run}");

    Ok(())
}
