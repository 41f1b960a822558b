use serde::Serialize;

use crate::dot::{Dot, DotId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DotSnapshot {
    pub id: DotId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub direction: f32,
    pub speed: f32,
    pub safe_range: f32,
    pub fill_color: String,
    pub show_vector: bool,
    pub show_info: bool,
}

impl From<&Dot> for DotSnapshot {
    fn from(dot: &Dot) -> Self {
        Self {
            id: dot.id,
            x: dot.x,
            y: dot.y,
            radius: dot.radius(),
            direction: dot.direction(),
            speed: dot.speed(),
            safe_range: dot.safe_range(),
            fill_color: dot.fill.css(),
            show_vector: dot.show_vector,
            show_info: dot.show_info,
        }
    }
}
