pub mod layout;
pub mod metrics;
pub mod style;

pub use layout::{ROOM_HEIGHT, RoomVolume, SCENE_UNITS_PER_FOOT, plan_layout};
pub use metrics::{MIN_BUILT_UP_AREA_SQFT, PlotMetrics, compute_metrics};
pub use style::Style;
