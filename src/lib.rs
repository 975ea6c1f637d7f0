pub mod error;
pub mod marcher;
pub mod math;
pub mod output;
pub mod render;
pub mod scene;

pub use error::RenderError;
pub use render::{render, render_serial, Framebuffer};
pub use scene::{Primitive, SceneConfig};
