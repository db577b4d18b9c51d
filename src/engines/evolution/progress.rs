use crate::types::GenerationSummary;

/// Observer for a running evolution. Implementations must be Send so a run
/// can live on a worker thread.
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, summary: &GenerationSummary, roster_size: usize);
}

/// No-op callback for headless runs.
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}
    fn on_generation_complete(&mut self, _summary: &GenerationSummary, _roster_size: usize) {}
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        println!("Generation {} starting...", generation + 1);
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary, roster_size: usize) {
        println!(
            "Generation {} complete. Best outperformance: {:.4}, success rate: {:.0}%, diversity: {:.3}, roster: {}",
            summary.generation_index + 1,
            summary.best_outperformance,
            summary.success_rate * 100.0,
            summary.diversity_score,
            roster_size
        );
    }
}

// For handing progress to another thread (UI, dashboard, logger).
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete {
        summary: GenerationSummary,
        roster_size: usize,
    },
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary, roster_size: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            summary: summary.clone(),
            roster_size,
        });
    }
}
