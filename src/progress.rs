//! Progress reporting trait.
//!
//! Resolution and sync report what they are doing through [`Progress`], so
//! the library stays free of terminal concerns. The CLI renders events with
//! [`Printer`](crate::printer::Printer); tests record them.

use crate::config::Chunk;
use crate::sync::TransferItem;
use std::path::Path;

/// Receives events while a destination is resolved and chunks are synced.
///
/// All methods are called synchronously, in the order things happen.
pub trait Progress {
    /// A mount candidate was checked.
    fn on_probe(&mut self, mount: &Path, mounted: bool);

    /// The destination root was created after the operator agreed.
    fn on_destination_created(&mut self, root: &Path);

    /// A chunk is about to be synced into `base_dest`.
    fn on_chunk_started(&mut self, chunk: &Chunk, base_dest: &Path);

    /// An item has been expanded but not yet dispatched.
    fn on_item_started(&mut self, item: &TransferItem);

    /// Dry run: `description` is the operation that would have run.
    fn on_planned(&mut self, description: &str);

    /// One line of output from a running mirror.
    fn on_mirror_line(&mut self, line: &str);

    /// An item reached its final outcome.
    fn on_item_completed(&mut self, item: &TransferItem);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct Silent;

impl Progress for Silent {
    fn on_probe(&mut self, _: &Path, _: bool) {}
    fn on_destination_created(&mut self, _: &Path) {}
    fn on_chunk_started(&mut self, _: &Chunk, _: &Path) {}
    fn on_item_started(&mut self, _: &TransferItem) {}
    fn on_planned(&mut self, _: &str) {}
    fn on_mirror_line(&mut self, _: &str) {}
    fn on_item_completed(&mut self, _: &TransferItem) {}
}
