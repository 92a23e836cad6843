//! Simulation engine contract and physics visualization settings

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Debug visualization toggles understood by the simulation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum VisualizationParameter {
    Scale,
    WorldAxes,
    BodyAxes,
    BodyMassAxes,
    BodyLinVelocity,
    BodyAngVelocity,
    ContactPoint,
    ContactNormal,
    ContactError,
    ContactImpulse,
    FrictionPoint,
    FrictionNormal,
    FrictionImpulse,
    ActorAxes,
    CollisionAabbs,
    CollisionShapes,
    CollisionAxes,
    CollisionCompounds,
    CollisionFaceNormals,
    CollisionEdges,
    CollisionStatic,
    CollisionDynamic,
    JointLocalFrames,
    JointLimits,
    CullBox,
    MbpRegions,
    SimulationMesh,
    Sdf,
}

impl VisualizationParameter {
    /// Token passed to the simulation engine
    pub fn token(&self) -> &'static str {
        match self {
            VisualizationParameter::Scale => "eSCALE",
            VisualizationParameter::WorldAxes => "eWORLD_AXES",
            VisualizationParameter::BodyAxes => "eBODY_AXES",
            VisualizationParameter::BodyMassAxes => "eBODY_MASS_AXES",
            VisualizationParameter::BodyLinVelocity => "eBODY_LIN_VELOCITY",
            VisualizationParameter::BodyAngVelocity => "eBODY_ANG_VELOCITY",
            VisualizationParameter::ContactPoint => "eCONTACT_POINT",
            VisualizationParameter::ContactNormal => "eCONTACT_NORMAL",
            VisualizationParameter::ContactError => "eCONTACT_ERROR",
            VisualizationParameter::ContactImpulse => "eCONTACT_IMPULSE",
            VisualizationParameter::FrictionPoint => "eFRICTION_POINT",
            VisualizationParameter::FrictionNormal => "eFRICTION_NORMAL",
            VisualizationParameter::FrictionImpulse => "eFRICTION_IMPULSE",
            VisualizationParameter::ActorAxes => "eACTOR_AXES",
            VisualizationParameter::CollisionAabbs => "eCOLLISION_AABBS",
            VisualizationParameter::CollisionShapes => "eCOLLISION_SHAPES",
            VisualizationParameter::CollisionAxes => "eCOLLISION_AXES",
            VisualizationParameter::CollisionCompounds => "eCOLLISION_COMPOUNDS",
            VisualizationParameter::CollisionFaceNormals => "eCOLLISION_FNORMALS",
            VisualizationParameter::CollisionEdges => "eCOLLISION_EDGES",
            VisualizationParameter::CollisionStatic => "eCOLLISION_STATIC",
            VisualizationParameter::CollisionDynamic => "eCOLLISION_DYNAMIC",
            VisualizationParameter::JointLocalFrames => "eJOINT_LOCAL_FRAMES",
            VisualizationParameter::JointLimits => "eJOINT_LIMITS",
            VisualizationParameter::CullBox => "eCULL_BOX",
            VisualizationParameter::MbpRegions => "eMBP_REGIONS",
            VisualizationParameter::SimulationMesh => "eSIMULATION_MESH",
            VisualizationParameter::Sdf => "eSDF",
        }
    }
}

/// Physics simulation collaborator
pub trait SimulationEngine {
    /// Set one visualization toggle. Flags are passed as 0.0 or 1.0.
    fn set_visualization_parameter(&mut self, parameter: VisualizationParameter, value: f32);
}

/// Physics visualization toggles shown in the viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct PhysicsSettings {
    /// Step the simulation every frame
    pub update: bool,
    /// Size of debug visualization, 0 disables it
    pub scale: f32,
    pub world_axes: bool,
    pub body_axes: bool,
    pub body_mass_axes: bool,
    pub body_lin_velocity: bool,
    pub body_ang_velocity: bool,
    pub contact_point: bool,
    pub contact_normal: bool,
    pub contact_error: bool,
    pub contact_impulse: bool,
    pub friction_point: bool,
    pub friction_normal: bool,
    pub friction_impulse: bool,
    pub actor_axes: bool,
    pub collision_aabbs: bool,
    pub collision_shapes: bool,
    pub collision_axes: bool,
    pub collision_compounds: bool,
    pub collision_face_normals: bool,
    pub collision_edges: bool,
    pub collision_static: bool,
    pub collision_dynamic: bool,
    pub joint_local_frames: bool,
    pub joint_limits: bool,
    pub cull_box: bool,
    pub mbp_regions: bool,
    pub simulation_mesh: bool,
    pub sdf: bool,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            update: true,
            scale: 0.0,
            world_axes: false,
            body_axes: false,
            body_mass_axes: false,
            body_lin_velocity: false,
            body_ang_velocity: false,
            contact_point: false,
            contact_normal: false,
            contact_error: false,
            contact_impulse: false,
            friction_point: false,
            friction_normal: false,
            friction_impulse: false,
            actor_axes: false,
            collision_aabbs: false,
            collision_shapes: true,
            collision_axes: false,
            collision_compounds: false,
            collision_face_normals: false,
            collision_edges: false,
            collision_static: false,
            collision_dynamic: false,
            joint_local_frames: true,
            joint_limits: false,
            cull_box: false,
            mbp_regions: false,
            simulation_mesh: false,
            sdf: false,
        }
    }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

impl PhysicsSettings {
    /// Every visualization parameter with its current value
    pub fn parameters(&self) -> [(VisualizationParameter, f32); 28] {
        use VisualizationParameter as P;
        [
            (P::Scale, self.scale),
            (P::WorldAxes, flag(self.world_axes)),
            (P::BodyAxes, flag(self.body_axes)),
            (P::BodyMassAxes, flag(self.body_mass_axes)),
            (P::BodyLinVelocity, flag(self.body_lin_velocity)),
            (P::BodyAngVelocity, flag(self.body_ang_velocity)),
            (P::ContactPoint, flag(self.contact_point)),
            (P::ContactNormal, flag(self.contact_normal)),
            (P::ContactError, flag(self.contact_error)),
            (P::ContactImpulse, flag(self.contact_impulse)),
            (P::FrictionPoint, flag(self.friction_point)),
            (P::FrictionNormal, flag(self.friction_normal)),
            (P::FrictionImpulse, flag(self.friction_impulse)),
            (P::ActorAxes, flag(self.actor_axes)),
            (P::CollisionAabbs, flag(self.collision_aabbs)),
            (P::CollisionShapes, flag(self.collision_shapes)),
            (P::CollisionAxes, flag(self.collision_axes)),
            (P::CollisionCompounds, flag(self.collision_compounds)),
            (P::CollisionFaceNormals, flag(self.collision_face_normals)),
            (P::CollisionEdges, flag(self.collision_edges)),
            (P::CollisionStatic, flag(self.collision_static)),
            (P::CollisionDynamic, flag(self.collision_dynamic)),
            (P::JointLocalFrames, flag(self.joint_local_frames)),
            (P::JointLimits, flag(self.joint_limits)),
            (P::CullBox, flag(self.cull_box)),
            (P::MbpRegions, flag(self.mbp_regions)),
            (P::SimulationMesh, flag(self.simulation_mesh)),
            (P::Sdf, flag(self.sdf)),
        ]
    }

    /// Forward every toggle to the simulation engine
    pub fn sync(&self, engine: &mut dyn SimulationEngine) {
        for (parameter, value) in self.parameters() {
            engine.set_visualization_parameter(parameter, value);
        }
    }
}

/// Simulation stand-in that stores the last value of each parameter
#[derive(Debug, Clone, Default)]
pub struct HeadlessSimulation {
    values: BTreeMap<VisualizationParameter, f32>,
}

impl HeadlessSimulation {
    /// Create an empty simulation
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value set for `parameter`
    pub fn value(&self, parameter: VisualizationParameter) -> Option<f32> {
        self.values.get(&parameter).copied()
    }
}

impl SimulationEngine for HeadlessSimulation {
    fn set_visualization_parameter(&mut self, parameter: VisualizationParameter, value: f32) {
        if self.values.insert(parameter, value) != Some(value) {
            tracing::debug!("Visualization {} = {}", parameter.token(), value);
        }
    }
}
