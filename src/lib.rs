//! Software rendering pipeline for palette-indexed pixel art
//!
//! Draw into an index or color buffer at a small internal resolution,
//! convert through a 256-entry palette, magnify by 1x/2x/4x/8x and hand the
//! frame to a [`display::Presenter`]. Hot loops run on a kernel set chosen
//! once per renderer ([`kernels::Backend`]).

pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod kernels;
pub mod lighting;
pub mod palette;
pub mod renderer;
pub mod sprite;
pub mod upscale;

pub use color::Color;
pub use config::{RendererConfig, StorageMode};
pub use display::{IndexBuffer, LineAlgorithm, PixelBuffer, Presenter};
pub use error::RendererError;
pub use kernels::Backend;
pub use lighting::Light;
pub use palette::Palette;
pub use renderer::Renderer;
pub use sprite::Sprite;
pub use upscale::UpscaleFactor;
