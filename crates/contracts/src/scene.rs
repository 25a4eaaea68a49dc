//! SceneProvider trait - scene synchronization collaborator

/// Scene synchronization subsystem.
///
/// Refreshed once per capture batch before any raycast executes.
pub trait SceneProvider {
    /// Push pending scene changes to the raytracing backend.
    ///
    /// A provider without a loaded scene returns without doing anything.
    fn refresh_scene_state(&mut self);
}
