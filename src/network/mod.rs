//! Remote-consumer contract and the fill worker pool.

mod dispatcher;

pub use dispatcher::FillDispatcher;

use crate::codec::FillCommand;
use crate::error::StreamResult;

/// One long-lived connection to the remote consumer.
///
/// The only capabilities the streamer needs: apply a cuboid fill, and close
/// the connection. Each pool worker owns exactly one sink for its whole
/// lifetime. Fills are idempotent on the remote side, so delivery is
/// fire-and-forget.
pub trait FillSink: Send {
    fn fill(&mut self, command: &FillCommand) -> StreamResult<()>;

    fn close(&mut self);
}
