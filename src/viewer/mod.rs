pub mod events;
pub mod window;

pub use events::{Action, KeyMap, PointerButton, PointerEvent, ViewerEvent};
pub use window::Viewer;
