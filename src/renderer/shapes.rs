//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::scene::{Primitive, Scene};
use super::vertex::Vertex;

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        let inner1 = Vec2::new(
            center.x + inner_radius * theta1.cos(),
            center.y + inner_radius * theta1.sin(),
        );
        let outer1 = Vec2::new(
            center.x + outer_radius * theta1.cos(),
            center.y + outer_radius * theta1.sin(),
        );
        let inner2 = Vec2::new(
            center.x + inner_radius * theta2.cos(),
            center.y + inner_radius * theta2.sin(),
        );
        let outer2 = Vec2::new(
            center.x + outer_radius * theta2.cos(),
            center.y + outer_radius * theta2.sin(),
        );

        // Two triangles per segment
        vertices.push(Vertex::new(inner1.x, inner1.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(inner2.x, inner2.y, color));

        vertices.push(Vertex::new(inner2.x, inner2.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(outer2.x, outer2.y, color));
    }

    vertices
}

/// Generate vertices for an axis-aligned rectangle
pub fn rect(min: Vec2, max: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
    ]
}

/// Segment count that keeps edges smooth without wasting triangles on specks
fn segments_for(radius: f32) -> u32 {
    ((radius * 1.5) as u32).clamp(8, 48)
}

/// Turn a scene into triangles in normalized device coordinates.
///
/// Text is left to the host overlay.
pub fn tessellate(scene: &Scene) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for command in &scene.commands {
        match &command.primitive {
            Primitive::Circle {
                center,
                radius,
                color,
            } => vertices.extend(circle(*center, *radius, *color, segments_for(*radius))),
            Primitive::Ring {
                center,
                inner,
                outer,
                color,
            } => vertices.extend(ring(*center, *inner, *outer, *color, segments_for(*outer))),
            Primitive::Rect { min, max, color } => vertices.extend(rect(*min, *max, *color)),
            Primitive::Fullscreen { color } => {
                let view = scene.camera.visible();
                vertices.extend(rect(view.min, view.max, *color));
            }
            Primitive::Text { .. } => {}
        }
    }
    for v in &mut vertices {
        let ndc = scene.camera.world_to_ndc(Vec2::from(v.position));
        v.position = ndc.to_array();
    }
    vertices
}
