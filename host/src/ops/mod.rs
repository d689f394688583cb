//! The user-visible operations (spec.md §4.5): identify, ping, read, write,
//! jump, call, change-speed, upload-elf. Each returns only after its final
//! ACK or a surfaced error — operations never overlap, matching the
//! stop-and-wait discipline the transport already enforces one level down.

mod identify;
mod jump_call;
mod ping;
mod read;
mod speed;
mod upload_elf;
mod write;

pub use identify::identify;
pub use jump_call::{call, jump};
pub use ping::ping;
pub use read::read;
pub use speed::change_speed;
pub use upload_elf::upload_elf;
pub use write::write;
