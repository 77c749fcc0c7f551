//! Monitor geometry.
//!
//! Rectangles in virtual-screen coordinates, the bounded monitor list, and the
//! resolver that turns what the windowing system reports into a [`Layout`].

mod rect;
mod resolver;

pub use rect::Rect;
pub use resolver::{GeometryResolver, Layout, MonitorList, MonitorSource, StaticMonitors};
