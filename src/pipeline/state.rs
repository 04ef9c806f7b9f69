//! Entry points and the states a run moves through.
use crate::artifacts::ArtifactKind;
use crate::stage::Stage;
use std::fmt;

/// How the operator starts a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EntryPoint {
    /// Start from the original invoice document and render a certified PDF.
    Automatic,
    /// Start from an already bridged invoice and report IIC/FIC.
    Manual,
}

impl EntryPoint {
    /// Map a menu number to an entry point.
    pub fn from_menu(choice: u32) -> Option<Self> {
        match choice {
            1 => Some(EntryPoint::Automatic),
            2 => Some(EntryPoint::Manual),
            _ => None,
        }
    }

    pub fn initial_state(&self) -> PipelineState {
        match self {
            EntryPoint::Automatic => PipelineState::Start,
            EntryPoint::Manual => PipelineState::Bridged,
        }
    }

    /// Stages executed for this entry point, in order.
    pub fn stages(&self) -> &'static [Stage] {
        const MANUAL: [Stage; 5] = [Stage::Iic, Stage::Dsig, Stage::Reg, Stage::Keep, Stage::Qrc];
        match self {
            EntryPoint::Automatic => &Stage::ALL,
            EntryPoint::Manual => &MANUAL,
        }
    }

    /// Artifact kind the operator-supplied file stands for, if any.
    pub fn seed_artifact(&self) -> Option<ArtifactKind> {
        match self {
            EntryPoint::Automatic => None,
            EntryPoint::Manual => Some(ArtifactKind::Bridge),
        }
    }

    pub fn terminal_state(&self) -> PipelineState {
        match self {
            EntryPoint::Automatic => PipelineState::Done,
            EntryPoint::Manual => PipelineState::IdentifiersReported,
        }
    }

    pub fn input_prompt(&self) -> &'static str {
        match self {
            EntryPoint::Automatic => "Please provide invoice file path",
            EntryPoint::Manual => "Please provide extracted invoice file path(.bridge)",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Automatic => f.write_str("automatic"),
            EntryPoint::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Start,
    Extracted,
    Bridged,
    IicComputed,
    Signed,
    Registered,
    Retained,
    QrGenerated,
    PdfRendered,
    Done,
    IdentifiersReported,
}

impl PipelineState {
    /// State reached once `stage` completes.
    pub fn after(stage: Stage) -> Self {
        match stage {
            Stage::Extract => PipelineState::Extracted,
            Stage::Bridge => PipelineState::Bridged,
            Stage::Iic => PipelineState::IicComputed,
            Stage::Dsig => PipelineState::Signed,
            Stage::Reg => PipelineState::Registered,
            Stage::Keep => PipelineState::Retained,
            Stage::Qrc => PipelineState::QrGenerated,
            Stage::Pdf => PipelineState::PdfRendered,
        }
    }

    /// Stage that leaves this state, or `None` when no stage follows.
    pub fn next_stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Start => Some(Stage::Extract),
            PipelineState::Extracted => Some(Stage::Bridge),
            PipelineState::Bridged => Some(Stage::Iic),
            PipelineState::IicComputed => Some(Stage::Dsig),
            PipelineState::Signed => Some(Stage::Reg),
            PipelineState::Registered => Some(Stage::Keep),
            PipelineState::Retained => Some(Stage::Qrc),
            PipelineState::QrGenerated => Some(Stage::Pdf),
            PipelineState::PdfRendered
            | PipelineState::Done
            | PipelineState::IdentifiersReported => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::IdentifiersReported
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_lists_follow_the_state_chain() {
        for entry in [EntryPoint::Automatic, EntryPoint::Manual] {
            let mut state = entry.initial_state();
            for stage in entry.stages() {
                assert_eq!(state.next_stage(), Some(*stage), "{entry} at {state:?}");
                state = PipelineState::after(*stage);
            }
        }
    }

    #[test]
    fn manual_skips_extract_and_pdf() {
        let stages = EntryPoint::Manual.stages();
        assert!(!stages.contains(&Stage::Extract));
        assert!(!stages.contains(&Stage::Pdf));
        assert!(!stages.contains(&Stage::Bridge));
    }

    #[test]
    fn menu_numbers_map_to_entry_points() {
        assert_eq!(EntryPoint::from_menu(1), Some(EntryPoint::Automatic));
        assert_eq!(EntryPoint::from_menu(2), Some(EntryPoint::Manual));
        assert_eq!(EntryPoint::from_menu(0), None);
        assert_eq!(EntryPoint::from_menu(3), None);
    }

    #[test]
    fn only_final_states_are_terminal() {
        assert!(EntryPoint::Automatic.terminal_state().is_terminal());
        assert!(EntryPoint::Manual.terminal_state().is_terminal());
        assert!(!PipelineState::PdfRendered.is_terminal());
        assert!(!PipelineState::QrGenerated.is_terminal());
    }
}
