//! Prims and their authored attributes

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::bounds::BoundingBox;
use crate::time::TimeCode;
use crate::transform::{RotationOrder, Transform};

/// Transform attribute slots of an xformable prim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum XformOp {
    Translate,
    Rotate,
    Scale,
    Pivot,
}

impl XformOp {
    pub const ALL: [XformOp; 4] = [
        XformOp::Translate,
        XformOp::Rotate,
        XformOp::Scale,
        XformOp::Pivot,
    ];

    /// Attribute name as authored on the prim
    pub fn attribute_name(&self) -> &'static str {
        match self {
            XformOp::Translate => "xformOp:translate",
            XformOp::Rotate => "xformOp:rotate",
            XformOp::Scale => "xformOp:scale",
            XformOp::Pivot => "xformOp:translate:pivot",
        }
    }

    /// Value used when the attribute has no opinion
    pub fn fallback(&self) -> DVec3 {
        match self {
            XformOp::Scale => DVec3::ONE,
            _ => DVec3::ZERO,
        }
    }
}

/// Decomposed transform attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct XformAttributes {
    #[serde(default)]
    pub translate: Attribute<DVec3>,
    #[serde(default)]
    pub rotate: Attribute<DVec3>,
    #[serde(default)]
    pub scale: Attribute<DVec3>,
    #[serde(default)]
    pub pivot: Attribute<DVec3>,
    #[serde(default)]
    pub rotation_order: RotationOrder,
}

impl XformAttributes {
    /// Attributes with default values taken from `transform`
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            translate: Attribute::with_default(transform.translation),
            rotate: Attribute::with_default(transform.rotation),
            scale: Attribute::with_default(transform.scale),
            pivot: Attribute::with_default(transform.pivot),
            rotation_order: transform.rotation_order,
        }
    }

    pub fn attribute(&self, op: XformOp) -> &Attribute<DVec3> {
        match op {
            XformOp::Translate => &self.translate,
            XformOp::Rotate => &self.rotate,
            XformOp::Scale => &self.scale,
            XformOp::Pivot => &self.pivot,
        }
    }

    pub fn attribute_mut(&mut self, op: XformOp) -> &mut Attribute<DVec3> {
        match op {
            XformOp::Translate => &mut self.translate,
            XformOp::Rotate => &mut self.rotate,
            XformOp::Scale => &mut self.scale,
            XformOp::Pivot => &mut self.pivot,
        }
    }

    /// Resolved value of one component, falling back when unauthored
    pub fn value(&self, op: XformOp, time: TimeCode) -> DVec3 {
        self.attribute(op).get(time).unwrap_or_else(|| op.fallback())
    }

    /// Resolved transform at `time`
    pub fn transform(&self, time: TimeCode) -> Transform {
        Transform {
            translation: self.value(XformOp::Translate, time),
            rotation: self.value(XformOp::Rotate, time),
            scale: self.value(XformOp::Scale, time),
            pivot: self.value(XformOp::Pivot, time),
            rotation_order: self.rotation_order,
        }
    }
}

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Authored camera parameters.
///
/// Apertures and focal length are in tenths of a scene unit, matching the
/// film-back convention where a 20.955 x 15.2908 aperture with a 50 focal
/// length gives a typical 35mm field of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub projection: Projection,
    pub focal_length: f64,
    pub horizontal_aperture: f64,
    pub vertical_aperture: f64,
    /// Near and far clipping distances
    pub clipping_range: (f64, f64),
    pub focus_distance: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            focal_length: 50.0,
            horizontal_aperture: 20.955,
            vertical_aperture: 15.2908,
            clipping_range: (1.0, 1_000_000.0),
            focus_distance: 0.0,
        }
    }
}

/// Prim type and type-specific data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimKind {
    /// Grouping prim without a transform
    Scope,
    Xform,
    /// Renderable geometry with a local extent
    Mesh { extent: BoundingBox },
    Camera(CameraParams),
    /// Copies of a prototype extent placed at `positions`
    PointInstancer {
        prototype_extent: BoundingBox,
        positions: Vec<DVec3>,
    },
}

impl PrimKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimKind::Scope => "Scope",
            PrimKind::Xform => "Xform",
            PrimKind::Mesh { .. } => "Mesh",
            PrimKind::Camera(_) => "Camera",
            PrimKind::PointInstancer { .. } => "PointInstancer",
        }
    }

    pub fn is_xformable(&self) -> bool {
        !matches!(self, PrimKind::Scope)
    }
}

/// A node of the stage hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prim {
    pub kind: PrimKind,
    /// Present for every xformable kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xform: Option<XformAttributes>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Prim {
    /// Create a prim of `kind`, with empty transform attributes when xformable
    pub fn new(kind: PrimKind) -> Self {
        let xform = kind.is_xformable().then(XformAttributes::default);
        Self {
            kind,
            xform,
            visible: true,
        }
    }

    pub fn scope() -> Self {
        Self::new(PrimKind::Scope)
    }

    pub fn xform() -> Self {
        Self::new(PrimKind::Xform)
    }

    /// Axis-aligned box mesh of the given size, centered on the origin
    pub fn cube(size: f64) -> Self {
        Self::new(PrimKind::Mesh {
            extent: BoundingBox::from_center_half_extents(DVec3::ZERO, DVec3::splat(size * 0.5)),
        })
    }

    pub fn camera(params: CameraParams) -> Self {
        Self::new(PrimKind::Camera(params))
    }

    pub fn point_instancer(prototype_extent: BoundingBox, positions: Vec<DVec3>) -> Self {
        Self::new(PrimKind::PointInstancer {
            prototype_extent,
            positions,
        })
    }

    /// Builder-style initial transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        if self.kind.is_xformable() {
            self.xform = Some(XformAttributes::from_transform(&transform));
        }
        self
    }

    pub fn is_xformable(&self) -> bool {
        self.xform.is_some()
    }

    /// Local transform at `time`, identity for non-xformable prims
    pub fn local_transform(&self, time: TimeCode) -> Transform {
        self.xform
            .as_ref()
            .map(|xform| xform.transform(time))
            .unwrap_or_default()
    }

    /// Bounds in the prim's local space, excluding descendants
    pub fn local_extent(&self) -> Option<BoundingBox> {
        match &self.kind {
            PrimKind::Mesh { extent } => Some(*extent),
            PrimKind::PointInstancer {
                prototype_extent,
                positions,
            } => {
                let mut bounds = BoundingBox::empty();
                for position in positions {
                    bounds = bounds.union(&instance_extent(prototype_extent, *position));
                }
                bounds.is_valid().then_some(bounds)
            }
            _ => None,
        }
    }

    pub fn camera_params(&self) -> Option<&CameraParams> {
        match &self.kind {
            PrimKind::Camera(params) => Some(params),
            _ => None,
        }
    }
}

/// Extent of one point-instancer instance in the instancer's local space
pub fn instance_extent(prototype_extent: &BoundingBox, position: DVec3) -> BoundingBox {
    BoundingBox::new(prototype_extent.min + position, prototype_extent.max + position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_is_not_xformable() {
        let scope = Prim::scope().with_transform(Transform::from_translation(DVec3::X));
        assert!(!scope.is_xformable());
        assert_eq!(scope.local_transform(TimeCode::Default), Transform::IDENTITY);
    }

    #[test]
    fn test_unauthored_components_fall_back() {
        let mut xform = XformAttributes::default();
        xform.translate.set(DVec3::new(1.0, 2.0, 3.0), TimeCode::Default);
        let transform = xform.transform(TimeCode::Frame(4.0));
        assert_eq!(transform.translation, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.scale, DVec3::ONE);
        assert_eq!(transform.rotation, DVec3::ZERO);
    }

    #[test]
    fn test_instancer_extent_covers_instances() {
        let proto = BoundingBox::from_center_half_extents(DVec3::ZERO, DVec3::splat(0.5));
        let prim = Prim::point_instancer(proto, vec![DVec3::ZERO, DVec3::new(4.0, 0.0, 0.0)]);
        let extent = prim.local_extent().unwrap();
        assert_eq!(extent.min, DVec3::splat(-0.5));
        assert_eq!(extent.max, DVec3::new(4.5, 0.5, 0.5));
    }
}
