// Command types - UI -> Audio communication

/// Identifier of an audio parameter on the audio thread
pub type ParameterId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetParameter { id: ParameterId, value: f32 },
    Quit,
}
