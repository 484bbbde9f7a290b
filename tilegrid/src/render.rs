//! Draw commands emitted toward the display layer.
//!
//! The grid never touches a display surface. Each tile transition becomes a
//! [`RenderCommand`] pushed into a [`RenderSink`]; the embedding layer turns
//! those into pixels.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::coord::TileCoord;

/// One tile transition visible to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand<H> {
    /// A tile finished loading and should be drawn.
    TileAttached { coord: TileCoord, handle: H },

    /// A previously attached or failed tile is gone and its slot should be
    /// cleared.
    TileDetached { coord: TileCoord },

    /// A tile could not be loaded.
    TileFailed { coord: TileCoord, reason: String },
}

impl<H> RenderCommand<H> {
    /// The tile this command refers to.
    pub fn coord(&self) -> &TileCoord {
        match self {
            RenderCommand::TileAttached { coord, .. }
            | RenderCommand::TileDetached { coord }
            | RenderCommand::TileFailed { coord, .. } => coord,
        }
    }
}

/// Receiver of render commands.
pub trait RenderSink<H> {
    fn emit(&mut self, command: RenderCommand<H>);
}

impl<H> RenderSink<H> for Vec<RenderCommand<H>> {
    fn emit(&mut self, command: RenderCommand<H>) {
        self.push(command);
    }
}

impl<H> RenderSink<H> for mpsc::UnboundedSender<RenderCommand<H>> {
    fn emit(&mut self, command: RenderCommand<H>) {
        // A closed receiver means nobody is drawing any more.
        let _ = self.send(command);
    }
}

/// Sink that drops every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl<H> RenderSink<H> for DiscardSink {
    fn emit(&mut self, _command: RenderCommand<H>) {}
}
