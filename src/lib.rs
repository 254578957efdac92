pub mod actor_class;
pub mod audio;
pub mod camera;
pub mod cli;
pub mod client;
pub mod config;
pub mod ecs;
pub mod entries;
pub mod events;
pub mod host;
pub mod math;
pub mod preview_world;
pub mod projection;
pub mod renderer;
pub mod screen_percentage;
pub mod show_flags;
pub mod stereo;
pub mod time;
pub mod view;
pub mod view_extension;
pub mod viewport;
pub mod visualization;
pub mod widget;

pub use client::{RenderServices, ViewportClient};
pub use config::ViewportConfig;
pub use entries::ViewportEntry;
pub use host::ViewportHost;
pub use preview_world::PreviewWorld;
pub use widget::{ViewportWidget, ViewportWidgetArgs};
