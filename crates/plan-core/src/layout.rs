use crate::style::Style;

/// Scene units per foot of plot dimension.
pub const SCENE_UNITS_PER_FOOT: f64 = 0.03;

/// Uniform room height in scene units.
pub const ROOM_HEIGHT: f64 = 2.5;

/// An axis-aligned room box in scene units.
///
/// `position` is the center of the footprint; `y` is `0` because the
/// renderer lifts each box by half its height. `size` is `[width, height,
/// depth]` along x, y, z.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomVolume {
    pub label: &'static str,
    pub position: [f64; 3],
    pub size: [f64; 3],
    pub color: &'static str,
}

/// Room footprint expressed as fractions of the scaled plot: `offset` is
/// the center as a fraction of (width, length), `extent` the size.
struct RoomTemplate {
    label: &'static str,
    offset: [f64; 2],
    extent: [f64; 2],
}

const TWO_ROOMS: [RoomTemplate; 2] = [
    RoomTemplate {
        label: "Living Room",
        offset: [-0.25, 0.0],
        extent: [0.5, 0.8],
    },
    RoomTemplate {
        label: "Bedroom",
        offset: [0.25, 0.0],
        extent: [0.5, 0.8],
    },
];

const THREE_ROOMS: [RoomTemplate; 3] = [
    RoomTemplate {
        label: "Living Room",
        offset: [-0.25, 0.25],
        extent: [0.5, 0.5],
    },
    RoomTemplate {
        label: "Bedroom 1",
        offset: [0.25, 0.25],
        extent: [0.5, 0.5],
    },
    RoomTemplate {
        label: "Kitchen",
        offset: [0.0, -0.25],
        extent: [0.8, 0.5],
    },
];

const FOUR_ROOM_GRID: [RoomTemplate; 4] = [
    RoomTemplate {
        label: "Living Room",
        offset: [-0.25, 0.25],
        extent: [0.5, 0.5],
    },
    RoomTemplate {
        label: "Bedroom 1",
        offset: [0.25, 0.25],
        extent: [0.5, 0.5],
    },
    RoomTemplate {
        label: "Kitchen",
        offset: [-0.25, -0.25],
        extent: [0.5, 0.5],
    },
    RoomTemplate {
        label: "Bedroom 2",
        offset: [0.25, -0.25],
        extent: [0.5, 0.5],
    },
];

fn templates_for(rooms: u32) -> &'static [RoomTemplate] {
    match rooms {
        2 => &TWO_ROOMS,
        3 => &THREE_ROOMS,
        _ => &FOUR_ROOM_GRID,
    }
}

/// Plans labeled room volumes for a rectangular plot.
///
/// Pure and total: degenerate dimensions produce zero-extent boxes. Room
/// counts without a dedicated template fall back to the four-room grid.
/// The resulting footprints never overlap in the x-z plane and are
/// symmetric about the origin.
pub fn plan_layout(length_ft: f64, width_ft: f64, rooms: u32, style: Style) -> Vec<RoomVolume> {
    let scaled_width = width_ft * SCENE_UNITS_PER_FOOT;
    let scaled_length = length_ft * SCENE_UNITS_PER_FOOT;
    let palette = style.palette();

    templates_for(rooms)
        .iter()
        .enumerate()
        .map(|(i, template)| RoomVolume {
            label: template.label,
            position: [
                template.offset[0] * scaled_width,
                0.0,
                template.offset[1] * scaled_length,
            ],
            size: [
                template.extent[0] * scaled_width,
                ROOM_HEIGHT,
                template.extent[1] * scaled_length,
            ],
            color: palette[i % palette.len()],
        })
        .collect()
}
