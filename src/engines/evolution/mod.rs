pub mod engine;
pub mod progress;

pub use engine::{
    tournament_selection, EvolutionLoop, EvolutionOutcome, StopHandle, StopReason,
};
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage,
    SilentProgressCallback,
};
