use hillroll_camera::CameraRig;
use hillroll_common::EntityId;
use hillroll_ecs::ComponentStore;
use hillroll_stream::StreamStats;

/// Read-only view of a world handed to renderers after a tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub tick: u64,
    pub cameras: &'a CameraRig,
    pub store: &'a ComponentStore,
    pub stream: &'a StreamStats,
    pub player: Option<EntityId>,
}
