//! Model preset state machine
//!
//! A preset only overwrites the scan configuration when it changes after
//! having been validated once; the first validation keeps whatever
//! configuration the sensor was created with.

use contracts::LidarModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresetState {
    #[default]
    Unvalidated,
    Validated(LidarModel),
}

impl PresetState {
    /// Whether validating `model` must overwrite the active configuration
    pub fn requires_overwrite(&self, model: LidarModel) -> bool {
        matches!(self, PresetState::Validated(current) if *current != model)
    }

    /// Record a successful validation of `model`, returning
    /// [`Self::requires_overwrite`] as it was before the transition.
    pub fn validate(&mut self, model: LidarModel) -> bool {
        let overwrite = self.requires_overwrite(model);
        *self = PresetState::Validated(model);
        overwrite
    }

    pub fn model(&self) -> Option<LidarModel> {
        match self {
            PresetState::Unvalidated => None,
            PresetState::Validated(model) => Some(*model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_validation_keeps_configuration() {
        let mut state = PresetState::default();
        assert!(!state.validate(LidarModel::OusterOs1_64));
        assert_eq!(state.model(), Some(LidarModel::OusterOs1_64));
    }

    #[test]
    fn same_preset_is_sticky() {
        let mut state = PresetState::Validated(LidarModel::VelodyneVlp16);
        assert!(!state.validate(LidarModel::VelodyneVlp16));
    }

    #[test]
    fn changed_preset_overwrites() {
        let mut state = PresetState::Validated(LidarModel::VelodyneVlp16);
        assert!(state.validate(LidarModel::HesaiPandar40p));
        assert_eq!(state, PresetState::Validated(LidarModel::HesaiPandar40p));
        assert!(!state.validate(LidarModel::HesaiPandar40p));
    }
}
